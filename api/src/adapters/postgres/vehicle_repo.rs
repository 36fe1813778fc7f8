//! PostgreSQL adapter for VehicleRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::domain::entities::{
    NewVehicle, UserId, Vehicle, VehicleId, VehicleType, VehicleUpdate,
};
use crate::domain::ports::VehicleRepository;
use crate::entity::vehicles;
use crate::error::DomainError;
use crate::realtime::{tables, ChangeFeed};

/// PostgreSQL implementation of VehicleRepository
pub struct PostgresVehicleRepository {
    db: DatabaseConnection,
    feed: ChangeFeed,
}

impl PostgresVehicleRepository {
    pub fn new(db: DatabaseConnection, feed: ChangeFeed) -> Self {
        Self { db, feed }
    }

    async fn find_live(&self, id: &VehicleId) -> Result<vehicles::Model, DomainError> {
        vehicles::Entity::find_by_id(id.0)
            .filter(vehicles::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?
            .ok_or_else(|| DomainError::NotFound(format!("Vehicle {}", id)))
    }
}

#[async_trait]
impl VehicleRepository for PostgresVehicleRepository {
    async fn create(&self, vehicle: &NewVehicle) -> Result<Vehicle, DomainError> {
        let model = vehicles::ActiveModel {
            id: Set(Uuid::new_v4()),
            owner_id: Set(vehicle.owner_id.0),
            make: Set(vehicle.make.clone()),
            model: Set(vehicle.model.clone()),
            year: Set(vehicle.year),
            color: Set(vehicle.color.clone()),
            license_plate: Set(vehicle.license_plate.clone()),
            vehicle_type: Set(vehicle.vehicle_type.to_string()),
            notes: Set(vehicle.notes.clone()),
            created_at: Set(Utc::now().fixed_offset()),
            deleted_at: Set(None),
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        let created: Vehicle = result.into();
        self.feed.publish_insert(tables::VEHICLES, &created);
        Ok(created)
    }

    async fn find_by_id(&self, id: &VehicleId) -> Result<Option<Vehicle>, DomainError> {
        let result = vehicles::Entity::find_by_id(id.0)
            .filter(vehicles::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.map(|m| m.into()))
    }

    async fn list_for_owner(&self, owner_id: &UserId) -> Result<Vec<Vehicle>, DomainError> {
        let results = vehicles::Entity::find()
            .filter(vehicles::Column::OwnerId.eq(owner_id.0))
            .filter(vehicles::Column::DeletedAt.is_null())
            .order_by_asc(vehicles::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(results.into_iter().map(|m| m.into()).collect())
    }

    async fn update(
        &self,
        id: &VehicleId,
        update: &VehicleUpdate,
    ) -> Result<Vehicle, DomainError> {
        let model = self.find_live(id).await?;
        let old: Vehicle = model.clone().into();

        let mut active = model.into_active_model();
        if let Some(make) = &update.make {
            active.make = Set(make.clone());
        }
        if let Some(model) = &update.model {
            active.model = Set(model.clone());
        }
        if let Some(year) = update.year {
            active.year = Set(Some(year));
        }
        if let Some(color) = &update.color {
            active.color = Set(Some(color.clone()));
        }
        if let Some(plate) = &update.license_plate {
            active.license_plate = Set(Some(plate.clone()));
        }
        if let Some(vehicle_type) = update.vehicle_type {
            active.vehicle_type = Set(vehicle_type.to_string());
        }
        if let Some(notes) = &update.notes {
            active.notes = Set(Some(notes.clone()));
        }

        let updated = active
            .update(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        let new: Vehicle = updated.into();
        self.feed.publish_update(tables::VEHICLES, &old, &new);
        Ok(new)
    }

    async fn soft_delete(&self, id: &VehicleId) -> Result<(), DomainError> {
        let model = self.find_live(id).await?;
        let old: Vehicle = model.clone().into();

        let mut active = model.into_active_model();
        active.deleted_at = Set(Some(Utc::now().fixed_offset()));
        active
            .update(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        self.feed.publish_delete(tables::VEHICLES, &old);
        Ok(())
    }
}

/// Convert SeaORM model to domain entity
impl From<vehicles::Model> for Vehicle {
    fn from(model: vehicles::Model) -> Self {
        Vehicle {
            id: VehicleId(model.id),
            owner_id: UserId(model.owner_id),
            make: model.make,
            model: model.model,
            year: model.year,
            color: model.color,
            license_plate: model.license_plate,
            vehicle_type: model.vehicle_type.parse().unwrap_or(VehicleType::Sedan),
            notes: model.notes,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}
