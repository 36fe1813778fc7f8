//! PostgreSQL adapter for EquipmentRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::domain::entities::{
    Equipment, EquipmentId, EquipmentStatus, EquipmentUpdate, NewEquipment,
};
use crate::domain::ports::EquipmentRepository;
use crate::entity::equipment;
use crate::error::DomainError;
use crate::realtime::{tables, ChangeFeed};

/// PostgreSQL implementation of EquipmentRepository
pub struct PostgresEquipmentRepository {
    db: DatabaseConnection,
    feed: ChangeFeed,
}

impl PostgresEquipmentRepository {
    pub fn new(db: DatabaseConnection, feed: ChangeFeed) -> Self {
        Self { db, feed }
    }

    async fn find_live(&self, id: &EquipmentId) -> Result<equipment::Model, DomainError> {
        equipment::Entity::find_by_id(id.0)
            .filter(equipment::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?
            .ok_or_else(|| DomainError::NotFound(format!("Equipment {}", id)))
    }

    async fn save(
        &self,
        old: equipment::Model,
        active: equipment::ActiveModel,
    ) -> Result<Equipment, DomainError> {
        let updated = active
            .update(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        let old: Equipment = old.into();
        let new: Equipment = updated.into();
        self.feed.publish_update(tables::EQUIPMENT, &old, &new);
        Ok(new)
    }
}

#[async_trait]
impl EquipmentRepository for PostgresEquipmentRepository {
    async fn create(&self, item: &NewEquipment) -> Result<Equipment, DomainError> {
        let model = equipment::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(item.name.clone()),
            category: Set(item.category.clone()),
            serial_number: Set(item.serial_number.clone()),
            status: Set(EquipmentStatus::Available.to_string()),
            last_maintenance_at: Set(None),
            maintenance_interval_days: Set(item.maintenance_interval_days),
            notes: Set(item.notes.clone()),
            created_at: Set(Utc::now().fixed_offset()),
            deleted_at: Set(None),
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        let created: Equipment = result.into();
        self.feed.publish_insert(tables::EQUIPMENT, &created);
        Ok(created)
    }

    async fn find_by_id(&self, id: &EquipmentId) -> Result<Option<Equipment>, DomainError> {
        let result = equipment::Entity::find_by_id(id.0)
            .filter(equipment::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.map(|m| m.into()))
    }

    async fn list(&self) -> Result<Vec<Equipment>, DomainError> {
        let results = equipment::Entity::find()
            .filter(equipment::Column::DeletedAt.is_null())
            .order_by_asc(equipment::Column::Name)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(results.into_iter().map(|m| m.into()).collect())
    }

    async fn update(
        &self,
        id: &EquipmentId,
        update: &EquipmentUpdate,
    ) -> Result<Equipment, DomainError> {
        let model = self.find_live(id).await?;

        let mut active = model.clone().into_active_model();
        if let Some(name) = &update.name {
            active.name = Set(name.clone());
        }
        if let Some(category) = &update.category {
            active.category = Set(category.clone());
        }
        if let Some(serial) = &update.serial_number {
            active.serial_number = Set(Some(serial.clone()));
        }
        if let Some(status) = update.status {
            active.status = Set(status.to_string());
        }
        if let Some(days) = update.maintenance_interval_days {
            active.maintenance_interval_days = Set(days);
        }
        if let Some(notes) = &update.notes {
            active.notes = Set(Some(notes.clone()));
        }

        self.save(model, active).await
    }

    async fn record_maintenance(
        &self,
        id: &EquipmentId,
        at: DateTime<Utc>,
    ) -> Result<Equipment, DomainError> {
        let model = self.find_live(id).await?;

        let mut active = model.clone().into_active_model();
        active.last_maintenance_at = Set(Some(at.fixed_offset()));
        if model.status == EquipmentStatus::NeedsMaintenance.as_str() {
            active.status = Set(EquipmentStatus::Available.to_string());
        }

        self.save(model, active).await
    }

    async fn soft_delete(&self, id: &EquipmentId) -> Result<(), DomainError> {
        let model = self.find_live(id).await?;
        let old: Equipment = model.clone().into();

        let mut active = model.into_active_model();
        active.deleted_at = Set(Some(Utc::now().fixed_offset()));
        active
            .update(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        self.feed.publish_delete(tables::EQUIPMENT, &old);
        Ok(())
    }
}

/// Convert SeaORM model to domain entity
impl From<equipment::Model> for Equipment {
    fn from(model: equipment::Model) -> Self {
        Equipment {
            id: EquipmentId(model.id),
            name: model.name,
            category: model.category,
            serial_number: model.serial_number,
            status: model.status.parse().unwrap_or(EquipmentStatus::Available),
            last_maintenance_at: model.last_maintenance_at.map(|dt| dt.with_timezone(&Utc)),
            maintenance_interval_days: model.maintenance_interval_days,
            notes: model.notes,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}
