//! Equipment handlers (admin)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{Duration, NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::entities::{Equipment, EquipmentId, EquipmentUpdate, NewEquipment};
use crate::error::AppError;
use crate::AppState;

fn default_interval() -> i32 {
    30
}

#[derive(Debug, Deserialize)]
pub struct CreateEquipmentRequest {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default = "default_interval")]
    pub maintenance_interval_days: i32,
    #[serde(default)]
    pub notes: Option<String>,
}

impl From<CreateEquipmentRequest> for NewEquipment {
    fn from(request: CreateEquipmentRequest) -> Self {
        NewEquipment {
            name: request.name,
            category: request.category,
            serial_number: request.serial_number,
            maintenance_interval_days: request.maintenance_interval_days,
            notes: request.notes,
        }
    }
}

/// Today in the shop's local time
fn business_today(utc_offset_minutes: i32) -> NaiveDate {
    (Utc::now() + Duration::minutes(i64::from(utc_offset_minutes))).date_naive()
}

/// GET /api/admin/equipment
pub async fn list_equipment(
    State(state): State<AppState>,
) -> Result<Json<Vec<Equipment>>, AppError> {
    Ok(Json(state.equipment_service.list().await?))
}

/// POST /api/admin/equipment
pub async fn create_equipment(
    State(state): State<AppState>,
    Json(request): Json<CreateEquipmentRequest>,
) -> Result<(StatusCode, Json<Equipment>), AppError> {
    let equipment = state.equipment_service.create(&request.into()).await?;
    Ok((StatusCode::CREATED, Json(equipment)))
}

/// GET /api/admin/equipment/:id
pub async fn get_equipment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Equipment>, AppError> {
    Ok(Json(state.equipment_service.get(&EquipmentId(id)).await?))
}

/// PATCH /api/admin/equipment/:id
pub async fn update_equipment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<EquipmentUpdate>,
) -> Result<Json<Equipment>, AppError> {
    Ok(Json(
        state
            .equipment_service
            .update(&EquipmentId(id), &update)
            .await?,
    ))
}

/// DELETE /api/admin/equipment/:id
pub async fn delete_equipment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.equipment_service.delete(&EquipmentId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/admin/equipment/:id/maintenance
pub async fn record_maintenance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Equipment>, AppError> {
    Ok(Json(
        state
            .equipment_service
            .record_maintenance(&EquipmentId(id), Utc::now())
            .await?,
    ))
}

/// GET /api/admin/equipment/maintenance-due
pub async fn maintenance_due(
    State(state): State<AppState>,
) -> Result<Json<Vec<Equipment>>, AppError> {
    let today = business_today(state.config.business_hours.utc_offset_minutes);
    Ok(Json(state.equipment_service.maintenance_due(today).await?))
}
