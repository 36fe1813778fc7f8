//! Campaign handlers (admin)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::app::CampaignSendResult;
use crate::domain::entities::{Campaign, CampaignAudience, CampaignId, CampaignUpdate, NewCampaign};
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateCampaignRequest {
    pub name: String,
    pub title: String,
    pub message: String,
    pub audience: CampaignAudience,
    #[serde(default)]
    pub scheduled_for: Option<DateTime<Utc>>,
}

impl From<CreateCampaignRequest> for NewCampaign {
    fn from(request: CreateCampaignRequest) -> Self {
        NewCampaign {
            name: request.name,
            title: request.title,
            message: request.message,
            audience: request.audience,
            scheduled_for: request.scheduled_for,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListCampaignsQuery {
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

fn default_limit() -> u64 {
    50
}

/// GET /api/campaigns
pub async fn list_campaigns(
    State(state): State<AppState>,
    Query(query): Query<ListCampaignsQuery>,
) -> Result<Json<Vec<Campaign>>, AppError> {
    Ok(Json(
        state
            .campaign_service
            .list(query.limit, query.offset)
            .await?,
    ))
}

/// POST /api/campaigns
pub async fn create_campaign(
    State(state): State<AppState>,
    Json(request): Json<CreateCampaignRequest>,
) -> Result<(StatusCode, Json<Campaign>), AppError> {
    let campaign = state.campaign_service.create(&request.into()).await?;
    Ok((StatusCode::CREATED, Json(campaign)))
}

/// GET /api/campaigns/:id
pub async fn get_campaign(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Campaign>, AppError> {
    Ok(Json(state.campaign_service.get(&CampaignId(id)).await?))
}

/// PATCH /api/campaigns/:id
pub async fn update_campaign(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<CampaignUpdate>,
) -> Result<Json<Campaign>, AppError> {
    Ok(Json(
        state
            .campaign_service
            .update(&CampaignId(id), &update)
            .await?,
    ))
}

/// DELETE /api/campaigns/:id
pub async fn delete_campaign(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.campaign_service.delete(&CampaignId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/campaigns/:id/send
pub async fn send_campaign(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CampaignSendResult>, AppError> {
    let result = state
        .campaign_service
        .send(&CampaignId(id), Utc::now())
        .await?;
    Ok(Json(result))
}
