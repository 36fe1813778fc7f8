//! Vehicle handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::app::FleetEntry;
use crate::domain::entities::{NewVehicle, User, Vehicle, VehicleId, VehicleType, VehicleUpdate};
use crate::error::AppError;
use crate::AppState;

/// Request body for adding a vehicle. The owner is the caller.
#[derive(Debug, Deserialize)]
pub struct AddVehicleRequest {
    pub make: String,
    pub model: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub license_plate: Option<String>,
    pub vehicle_type: VehicleType,
    #[serde(default)]
    pub notes: Option<String>,
}

impl AddVehicleRequest {
    fn for_owner(self, owner: &User) -> NewVehicle {
        NewVehicle {
            owner_id: owner.id,
            make: self.make,
            model: self.model,
            year: self.year,
            color: self.color,
            license_plate: self.license_plate,
            vehicle_type: self.vehicle_type,
            notes: self.notes,
        }
    }
}

/// GET /api/vehicles
pub async fn list_vehicles(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<Vehicle>>, AppError> {
    Ok(Json(state.vehicle_service.list(&user.id).await?))
}

/// POST /api/vehicles
pub async fn add_vehicle(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<AddVehicleRequest>,
) -> Result<(StatusCode, Json<Vehicle>), AppError> {
    let vehicle = state
        .vehicle_service
        .add(&user, request.for_owner(&user))
        .await?;
    Ok((StatusCode::CREATED, Json(vehicle)))
}

/// GET /api/vehicles/:id
pub async fn get_vehicle(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vehicle>, AppError> {
    Ok(Json(
        state.vehicle_service.get(&user, &VehicleId(id)).await?,
    ))
}

/// PATCH /api/vehicles/:id
pub async fn update_vehicle(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(update): Json<VehicleUpdate>,
) -> Result<Json<Vehicle>, AppError> {
    let vehicle = state
        .vehicle_service
        .update(&user, &VehicleId(id), &update)
        .await?;
    Ok(Json(vehicle))
}

/// DELETE /api/vehicles/:id
pub async fn delete_vehicle(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state
        .vehicle_service
        .remove(&user, &VehicleId(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/fleet
pub async fn fleet_overview(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<FleetEntry>>, AppError> {
    Ok(Json(state.vehicle_service.fleet_overview(&user.id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_customer;

    #[test]
    fn add_request_is_owned_by_caller() {
        let json = r#"{"make": "Honda", "model": "Civic", "year": 2019, "vehicle_type": "sedan"}"#;
        let request: AddVehicleRequest = serde_json::from_str(json).unwrap();
        let owner = test_customer();

        let vehicle = request.for_owner(&owner);
        assert_eq!(vehicle.owner_id, owner.id);
        assert_eq!(vehicle.year, Some(2019));
        assert_eq!(vehicle.vehicle_type, VehicleType::Sedan);
        assert!(vehicle.license_plate.is_none());
    }

    #[test]
    fn add_request_ignores_owner_in_body() {
        let json = r#"{
            "owner_id": "123e4567-e89b-12d3-a456-426614174000",
            "make": "Ford",
            "model": "F-150",
            "vehicle_type": "truck"
        }"#;
        let request: AddVehicleRequest = serde_json::from_str(json).unwrap();
        let owner = test_customer();
        assert_eq!(request.for_owner(&owner).owner_id, owner.id);
    }

    #[test]
    fn add_request_requires_type() {
        let json = r#"{"make": "Honda", "model": "Civic"}"#;
        let result: Result<AddVehicleRequest, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn parse_partial_update() {
        let update: VehicleUpdate = serde_json::from_str(r#"{"color": "Blue"}"#).unwrap();
        assert_eq!(update.color.as_deref(), Some("Blue"));
        assert!(update.make.is_none());
        assert!(update.vehicle_type.is_none());
    }
}
