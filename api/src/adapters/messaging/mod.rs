//! Outbound messaging adapters
//!
//! HTTP clients for the transactional email API and the WhatsApp Cloud API.
//! Both fall back to logging when unconfigured.

pub mod email;
pub mod phone;
pub mod whatsapp;

pub use email::HttpEmailSender;
pub use phone::normalize_phone;
pub use whatsapp::WhatsAppCloudSender;

use crate::error::DeliveryError;

/// Map a non-success provider response to a `DeliveryError`
async fn error_from_response(response: reqwest::Response) -> DeliveryError {
    let status = response.status();
    if status.as_u16() == 429 {
        return DeliveryError::RateLimited;
    }
    let message = response.text().await.unwrap_or_default();
    DeliveryError::Api {
        status: status.as_u16(),
        message,
    }
}
