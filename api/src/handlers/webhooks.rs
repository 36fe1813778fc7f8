//! Webhook handlers
//!
//! Handlers for WhatsApp Cloud API webhooks.

use axum::{
    body::Bytes,
    extract::{FromRef, Query, State},
    http::{HeaderMap, StatusCode},
};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::error::AppError;
use crate::AppState;

/// Secrets the WhatsApp webhook needs, split out of `AppState`
#[derive(Debug, Clone, Default)]
pub struct WhatsAppWebhookState {
    pub app_secret: Option<String>,
    pub verify_token: Option<String>,
}

impl FromRef<AppState> for WhatsAppWebhookState {
    fn from_ref(state: &AppState) -> Self {
        WhatsAppWebhookState {
            app_secret: state.config.whatsapp_app_secret.clone(),
            verify_token: state.config.whatsapp_verify_token.clone(),
        }
    }
}

/// Query sent by Meta when the webhook is registered
#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

/// WhatsApp webhook payload
#[derive(Debug, Deserialize)]
pub struct WhatsAppWebhookPayload {
    #[serde(default)]
    pub object: Option<String>,
    #[serde(default)]
    pub entry: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
pub struct Entry {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub changes: Vec<Change>,
}

#[derive(Debug, Deserialize)]
pub struct Change {
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub value: ChangeValue,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChangeValue {
    #[serde(default)]
    pub statuses: Vec<MessageStatus>,
}

/// Delivery status of a message we sent
#[derive(Debug, Deserialize)]
pub struct MessageStatus {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub recipient_id: Option<String>,
    #[serde(default)]
    pub errors: Vec<StatusError>,
}

#[derive(Debug, Deserialize)]
pub struct StatusError {
    pub code: i64,
    #[serde(default)]
    pub title: Option<String>,
}

/// Verify HMAC-SHA256 signature
fn verify_signature(payload: &[u8], signature: Option<&str>, secret: &Option<String>) -> bool {
    let Some(secret) = secret else {
        // No secret configured, skip verification (development mode)
        tracing::warn!("WhatsApp app secret not configured, skipping signature verification");
        return true;
    };

    let Some(sig_header) = signature else {
        tracing::warn!("No signature provided in webhook request");
        return false;
    };

    // Meta sends "sha256=<hex>"
    let Some(expected_hex) = sig_header.strip_prefix("sha256=") else {
        tracing::warn!("Signature header without sha256= prefix");
        return false;
    };

    type HmacSha256 = Hmac<Sha256>;
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => {
            tracing::error!("Invalid WhatsApp app secret");
            return false;
        }
    };

    mac.update(payload);

    let expected_bytes = match hex::decode(expected_hex) {
        Ok(bytes) => bytes,
        Err(_) => {
            tracing::warn!("Invalid signature format");
            return false;
        }
    };

    mac.verify_slice(&expected_bytes).is_ok()
}

/// GET /webhooks/whatsapp
///
/// Echo `hub.challenge` when the verify token matches.
pub async fn whatsapp_verify(
    State(webhook): State<WhatsAppWebhookState>,
    Query(query): Query<VerifyQuery>,
) -> Result<String, AppError> {
    let Some(expected) = webhook.verify_token.as_deref() else {
        tracing::warn!("WhatsApp verify token not configured");
        return Err(AppError::Forbidden);
    };

    let subscribing = query.mode.as_deref() == Some("subscribe");
    let token_matches = query.verify_token.as_deref() == Some(expected);
    match (subscribing && token_matches, query.challenge) {
        (true, Some(challenge)) => {
            tracing::info!("WhatsApp webhook verified");
            Ok(challenge)
        }
        (true, None) => Err(AppError::BadRequest("Missing hub.challenge".to_string())),
        (false, _) => {
            tracing::warn!(mode = ?query.mode, "WhatsApp webhook verification refused");
            Err(AppError::Forbidden)
        }
    }
}

/// POST /webhooks/whatsapp
///
/// Log delivery status updates for outbound messages.
pub async fn whatsapp_webhook(
    State(webhook): State<WhatsAppWebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let signature = headers
        .get("X-Hub-Signature-256")
        .and_then(|h| h.to_str().ok());

    if !verify_signature(&body, signature, &webhook.app_secret) {
        tracing::warn!("Webhook signature verification failed");
        return Err(AppError::Unauthorized);
    }

    let payload: WhatsAppWebhookPayload = serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!(error = %e, "Failed to parse webhook payload");
        AppError::BadRequest(format!("Invalid JSON: {}", e))
    })?;

    let statuses = handle_statuses(&payload);
    tracing::debug!(
        object = ?payload.object,
        statuses = statuses,
        "Received WhatsApp webhook"
    );

    Ok(StatusCode::OK)
}

/// Log every status in the payload, returning how many there were
fn handle_statuses(payload: &WhatsAppWebhookPayload) -> usize {
    let mut count = 0;
    for change in payload.entry.iter().flat_map(|e| &e.changes) {
        if change.field.as_deref().is_some_and(|f| f != "messages") {
            continue;
        }
        for status in &change.value.statuses {
            count += 1;
            if status.status == "failed" {
                let error = status.errors.first();
                tracing::warn!(
                    message_id = %status.id,
                    recipient = ?status.recipient_id,
                    code = ?error.map(|e| e.code),
                    reason = ?error.and_then(|e| e.title.as_deref()),
                    "WhatsApp message failed"
                );
            } else {
                tracing::info!(
                    message_id = %status.id,
                    status = %status.status,
                    timestamp = ?status.timestamp,
                    "WhatsApp message status"
                );
            }
        }
    }
    count
}
