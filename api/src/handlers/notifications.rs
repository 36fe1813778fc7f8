//! Notification handlers
//!
//! In-app inbox, preferences, and admin dispatch.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::app::{Audience, BroadcastSummary, DispatchReport, NotificationRequest, Notifier};
use crate::domain::entities::{
    Channel, Notification, NotificationId, NotificationPreferences, NotificationType,
    PreferencesUpdate, Priority, User, UserId,
};
use crate::error::AppError;
use crate::AppState;

const MAX_TITLE_LEN: usize = 200;
const MAX_MESSAGE_LEN: usize = 2000;

fn default_limit() -> u64 {
    20
}

/// Query parameters for listing notifications
#[derive(Debug, Deserialize)]
pub struct ListNotificationsQuery {
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
    #[serde(default)]
    pub unread_only: bool,
}

#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    pub unread: u64,
}

#[derive(Debug, Serialize)]
pub struct MarkAllReadResponse {
    pub updated: u64,
}

/// Notification content shared by single sends and broadcasts
#[derive(Debug, Deserialize)]
pub struct NotificationContent {
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub channels: Option<Vec<Channel>>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub reference_id: Option<Uuid>,
}

impl NotificationContent {
    fn into_request(self, recipient: UserId) -> Result<NotificationRequest, AppError> {
        let title = self.title.trim();
        if title.is_empty() || title.chars().count() > MAX_TITLE_LEN {
            return Err(AppError::BadRequest(format!(
                "Title must be between 1 and {} characters",
                MAX_TITLE_LEN
            )));
        }
        let message = self.message.trim();
        if message.is_empty() || message.chars().count() > MAX_MESSAGE_LEN {
            return Err(AppError::BadRequest(format!(
                "Message must be between 1 and {} characters",
                MAX_MESSAGE_LEN
            )));
        }
        if matches!(&self.channels, Some(channels) if channels.is_empty()) {
            return Err(AppError::BadRequest(
                "At least one channel is required".to_string(),
            ));
        }

        let mut request =
            NotificationRequest::new(recipient, self.notification_type, title, message);
        request.data = self.data;
        request.channels = self.channels;
        request.priority = self.priority;
        request.reference_id = self.reference_id;
        Ok(request)
    }
}

/// Request body for POST /api/notifications/send
#[derive(Debug, Deserialize)]
pub struct SendNotificationRequest {
    pub user_id: UserId,
    #[serde(flatten)]
    pub content: NotificationContent,
}

/// Request body for POST /api/notifications/broadcast
#[derive(Debug, Deserialize)]
pub struct BroadcastRequest {
    pub audience: Audience,
    #[serde(flatten)]
    pub content: NotificationContent,
}

/// GET /api/notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<ListNotificationsQuery>,
) -> Result<Json<Vec<Notification>>, AppError> {
    let notifications = state
        .notification_service
        .list_for_user(&user.id, query.limit, query.offset, query.unread_only)
        .await?;
    Ok(Json(notifications))
}

/// GET /api/notifications/unread-count
pub async fn unread_count(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<UnreadCountResponse>, AppError> {
    let unread = state.notification_service.unread_count(&user.id).await?;
    Ok(Json(UnreadCountResponse { unread }))
}

/// POST /api/notifications/:id/read
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state
        .notification_service
        .mark_read(&user.id, &NotificationId(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/notifications/read-all
pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<MarkAllReadResponse>, AppError> {
    let updated = state.notification_service.mark_all_read(&user.id).await?;
    Ok(Json(MarkAllReadResponse { updated }))
}

/// DELETE /api/notifications/:id
pub async fn delete_notification(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state
        .notification_service
        .delete(&user.id, &NotificationId(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/notifications/preferences
pub async fn get_preferences(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<NotificationPreferences>, AppError> {
    Ok(Json(
        state.notification_service.get_preferences(&user.id).await?,
    ))
}

/// PUT /api/notifications/preferences
pub async fn update_preferences(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(update): Json<PreferencesUpdate>,
) -> Result<Json<NotificationPreferences>, AppError> {
    let prefs = state
        .notification_service
        .update_preferences(&user.id, &update)
        .await?;
    Ok(Json(prefs))
}

/// POST /api/notifications/send (admin)
pub async fn send_notification(
    State(state): State<AppState>,
    Json(request): Json<SendNotificationRequest>,
) -> Result<(StatusCode, Json<DispatchReport>), AppError> {
    let notification = request.content.into_request(request.user_id)?;
    let report = state.notification_service.dispatch(notification).await?;
    Ok((StatusCode::CREATED, Json(report)))
}

/// POST /api/notifications/broadcast (admin)
pub async fn broadcast(
    State(state): State<AppState>,
    Extension(admin): Extension<User>,
    Json(request): Json<BroadcastRequest>,
) -> Result<Json<BroadcastSummary>, AppError> {
    // Each recipient gets a copy addressed to them
    let template = request.content.into_request(admin.id)?;
    tracing::info!(
        admin_id = %admin.id,
        audience = ?request.audience,
        notification_type = %template.notification_type,
        "Broadcast requested"
    );
    let summary = state
        .notification_service
        .broadcast(&request.audience, &template)
        .await?;
    Ok(Json(summary))
}
