//! Equipment service

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};

use crate::domain::entities::{Equipment, EquipmentId, EquipmentUpdate, NewEquipment};
use crate::domain::ports::EquipmentRepository;
use crate::error::AppError;

pub struct EquipmentService<ER>
where
    ER: EquipmentRepository,
{
    equipment: Arc<ER>,
}

impl<ER> EquipmentService<ER>
where
    ER: EquipmentRepository,
{
    pub fn new(equipment: Arc<ER>) -> Self {
        Self { equipment }
    }

    pub async fn create(&self, equipment: &NewEquipment) -> Result<Equipment, AppError> {
        validate_name(&equipment.name)?;
        validate_interval(equipment.maintenance_interval_days)?;

        let created = self.equipment.create(equipment).await?;
        tracing::info!(equipment_id = %created.id, name = %created.name, "Equipment added");
        Ok(created)
    }

    pub async fn get(&self, id: &EquipmentId) -> Result<Equipment, AppError> {
        self.equipment
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Equipment {}", id)))
    }

    pub async fn list(&self) -> Result<Vec<Equipment>, AppError> {
        Ok(self.equipment.list().await?)
    }

    /// Status changes made here reach `EquipmentMonitor` through the change feed
    pub async fn update(
        &self,
        id: &EquipmentId,
        update: &EquipmentUpdate,
    ) -> Result<Equipment, AppError> {
        self.get(id).await?;
        if let Some(name) = &update.name {
            validate_name(name)?;
        }
        if let Some(days) = update.maintenance_interval_days {
            validate_interval(days)?;
        }

        let updated = self.equipment.update(id, update).await?;
        if let Some(status) = update.status {
            tracing::info!(equipment_id = %id, status = %status, "Equipment status changed");
        }
        Ok(updated)
    }

    pub async fn record_maintenance(
        &self,
        id: &EquipmentId,
        at: DateTime<Utc>,
    ) -> Result<Equipment, AppError> {
        self.get(id).await?;
        let equipment = self.equipment.record_maintenance(id, at).await?;
        tracing::info!(equipment_id = %id, "Maintenance recorded");
        Ok(equipment)
    }

    pub async fn delete(&self, id: &EquipmentId) -> Result<(), AppError> {
        self.get(id).await?;
        self.equipment.soft_delete(id).await?;
        Ok(())
    }

    /// Equipment due for maintenance on `today`, most overdue first
    pub async fn maintenance_due(&self, today: NaiveDate) -> Result<Vec<Equipment>, AppError> {
        let mut due: Vec<Equipment> = self
            .equipment
            .list()
            .await?
            .into_iter()
            .filter(|e| e.is_maintenance_due(today))
            .collect();
        // Never maintained sorts first
        due.sort_by_key(|e| e.next_maintenance_on());
        Ok(due)
    }
}

fn validate_name(name: &str) -> Result<(), AppError> {
    let len = name.trim().chars().count();
    if len == 0 || len > 100 {
        return Err(AppError::BadRequest(
            "Equipment name must be 1-100 characters".to_string(),
        ));
    }
    Ok(())
}

fn validate_interval(days: i32) -> Result<(), AppError> {
    if !(1..=3650).contains(&days) {
        return Err(AppError::BadRequest(format!(
            "Maintenance interval must be 1-3650 days, got {}",
            days
        )));
    }
    Ok(())
}
