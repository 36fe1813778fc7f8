//! Vehicle service
//!
//! A customer's garage and the fleet overview built from their bookings.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;

use crate::domain::entities::{
    BookingStatus, NewVehicle, User, UserId, Vehicle, VehicleId, VehicleUpdate,
};
use crate::domain::ports::{BookingRepository, VehicleRepository};
use crate::error::AppError;

/// Bookings considered per customer when building the fleet overview
const FLEET_HISTORY_LIMIT: u64 = 1000;

/// One vehicle with its service history summary
#[derive(Debug, Clone, Serialize)]
pub struct FleetEntry {
    pub vehicle: Vehicle,
    pub booking_count: usize,
    pub last_completed_at: Option<DateTime<Utc>>,
    pub next_booking_at: Option<DateTime<Utc>>,
}

pub struct VehicleService<VR, BR>
where
    VR: VehicleRepository,
    BR: BookingRepository,
{
    vehicles: Arc<VR>,
    bookings: Arc<BR>,
}

impl<VR, BR> VehicleService<VR, BR>
where
    VR: VehicleRepository,
    BR: BookingRepository,
{
    pub fn new(vehicles: Arc<VR>, bookings: Arc<BR>) -> Self {
        Self { vehicles, bookings }
    }

    pub async fn add(&self, owner: &User, vehicle: NewVehicle) -> Result<Vehicle, AppError> {
        validate_text("make", &vehicle.make)?;
        validate_text("model", &vehicle.model)?;
        validate_year(vehicle.year)?;

        let vehicle = self
            .vehicles
            .create(&NewVehicle {
                owner_id: owner.id,
                make: vehicle.make.trim().to_string(),
                model: vehicle.model.trim().to_string(),
                license_plate: vehicle
                    .license_plate
                    .map(|p| p.trim().to_uppercase())
                    .filter(|p| !p.is_empty()),
                ..vehicle
            })
            .await?;

        tracing::info!(vehicle_id = %vehicle.id, user_id = %owner.id, "Vehicle added");
        Ok(vehicle)
    }

    /// A vehicle visible to `user`: their own, or any for admins
    pub async fn get(&self, user: &User, id: &VehicleId) -> Result<Vehicle, AppError> {
        self.vehicles
            .find_by_id(id)
            .await?
            .filter(|v| user.is_admin() || v.owner_id == user.id)
            .ok_or_else(|| AppError::NotFound(format!("Vehicle {}", id)))
    }

    pub async fn list(&self, owner_id: &UserId) -> Result<Vec<Vehicle>, AppError> {
        Ok(self.vehicles.list_for_owner(owner_id).await?)
    }

    pub async fn update(
        &self,
        user: &User,
        id: &VehicleId,
        update: &VehicleUpdate,
    ) -> Result<Vehicle, AppError> {
        self.get(user, id).await?;
        if let Some(make) = &update.make {
            validate_text("make", make)?;
        }
        if let Some(model) = &update.model {
            validate_text("model", model)?;
        }
        validate_year(update.year)?;

        Ok(self.vehicles.update(id, update).await?)
    }

    pub async fn remove(&self, user: &User, id: &VehicleId) -> Result<(), AppError> {
        self.get(user, id).await?;
        self.vehicles.soft_delete(id).await?;
        tracing::info!(vehicle_id = %id, "Vehicle removed");
        Ok(())
    }

    /// Every vehicle of `owner_id` with booking counts and service dates
    pub async fn fleet_overview_at(
        &self,
        owner_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<Vec<FleetEntry>, AppError> {
        let vehicles = self.vehicles.list_for_owner(owner_id).await?;
        let bookings = self
            .bookings
            .list_for_customer(owner_id, FLEET_HISTORY_LIMIT, 0)
            .await?;

        Ok(vehicles
            .into_iter()
            .map(|vehicle| {
                let history: Vec<_> = bookings
                    .iter()
                    .filter(|b| b.vehicle_id == Some(vehicle.id))
                    .collect();

                let last_completed_at = history
                    .iter()
                    .filter(|b| b.status == BookingStatus::Completed)
                    .map(|b| b.scheduled_at)
                    .max();
                let next_booking_at = history
                    .iter()
                    .filter(|b| {
                        matches!(b.status, BookingStatus::Pending | BookingStatus::Confirmed)
                            && b.scheduled_at > now
                    })
                    .map(|b| b.scheduled_at)
                    .min();

                FleetEntry {
                    booking_count: history.len(),
                    last_completed_at,
                    next_booking_at,
                    vehicle,
                }
            })
            .collect())
    }

    pub async fn fleet_overview(&self, owner_id: &UserId) -> Result<Vec<FleetEntry>, AppError> {
        self.fleet_overview_at(owner_id, Utc::now()).await
    }
}

fn validate_text(field: &str, value: &str) -> Result<(), AppError> {
    let len = value.trim().len();
    if len == 0 || len > 50 {
        return Err(AppError::BadRequest(format!(
            "Vehicle {} must be 1-50 characters",
            field
        )));
    }
    Ok(())
}

fn validate_year(year: Option<i32>) -> Result<(), AppError> {
    let Some(year) = year else {
        return Ok(());
    };
    let latest = Utc::now().year() + 1;
    if !(1900..=latest).contains(&year) {
        return Err(AppError::BadRequest(format!(
            "Vehicle year must be between 1900 and {}",
            latest
        )));
    }
    Ok(())
}
