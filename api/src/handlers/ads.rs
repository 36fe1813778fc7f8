//! Ad handlers
//!
//! Public listing of live ads plus admin management.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::entities::{Ad, AdId, AdPlacement, AdUpdate, NewAd};
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct PlacementQuery {
    #[serde(default)]
    pub placement: Option<AdPlacement>,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct CreateAdRequest {
    pub title: String,
    pub image_url: String,
    #[serde(default)]
    pub link_url: Option<String>,
    pub placement: AdPlacement,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
}

impl From<CreateAdRequest> for NewAd {
    fn from(request: CreateAdRequest) -> Self {
        NewAd {
            title: request.title,
            image_url: request.image_url,
            link_url: request.link_url,
            placement: request.placement,
            active: request.active,
            starts_at: request.starts_at,
            ends_at: request.ends_at,
        }
    }
}

/// GET /api/ads?placement=home_hero
///
/// Public: ads live right now.
pub async fn live_ads(
    State(state): State<AppState>,
    Query(query): Query<PlacementQuery>,
) -> Result<Json<Vec<Ad>>, AppError> {
    Ok(Json(
        state.ad_service.live(query.placement, Utc::now()).await?,
    ))
}

/// GET /api/admin/ads
pub async fn list_ads(
    State(state): State<AppState>,
    Query(query): Query<PlacementQuery>,
) -> Result<Json<Vec<Ad>>, AppError> {
    Ok(Json(state.ad_service.list_all(query.placement).await?))
}

/// POST /api/admin/ads
pub async fn create_ad(
    State(state): State<AppState>,
    Json(request): Json<CreateAdRequest>,
) -> Result<(StatusCode, Json<Ad>), AppError> {
    let ad = state.ad_service.create(&request.into()).await?;
    Ok((StatusCode::CREATED, Json(ad)))
}

/// PATCH /api/admin/ads/:id
pub async fn update_ad(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<AdUpdate>,
) -> Result<Json<Ad>, AppError> {
    Ok(Json(state.ad_service.update(&AdId(id), &update).await?))
}

/// DELETE /api/admin/ads/:id
pub async fn delete_ad(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.ad_service.delete(&AdId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
