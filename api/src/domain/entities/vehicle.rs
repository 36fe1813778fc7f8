//! Vehicle domain entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserId;

entity_id!(
    /// Unique identifier for a vehicle
    VehicleId
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleType {
    Sedan,
    Suv,
    Truck,
    Van,
    Coupe,
    Motorcycle,
}

text_enum!(VehicleType {
    Sedan => "sedan",
    Suv => "suv",
    Truck => "truck",
    Van => "van",
    Coupe => "coupe",
    Motorcycle => "motorcycle",
});

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    pub owner_id: UserId,
    pub make: String,
    pub model: String,
    pub year: Option<i32>,
    pub color: Option<String>,
    pub license_plate: Option<String>,
    pub vehicle_type: VehicleType,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Vehicle {
    pub fn label(&self) -> String {
        match self.year {
            Some(year) => format!("{} {} {}", year, self.make, self.model),
            None => format!("{} {}", self.make, self.model),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewVehicle {
    pub owner_id: UserId,
    pub make: String,
    pub model: String,
    pub year: Option<i32>,
    pub color: Option<String>,
    pub license_plate: Option<String>,
    pub vehicle_type: VehicleType,
    pub notes: Option<String>,
}

/// Partial update; `None` leaves a field untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VehicleUpdate {
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub color: Option<String>,
    pub license_plate: Option<String>,
    pub vehicle_type: Option<VehicleType>,
    pub notes: Option<String>,
}
