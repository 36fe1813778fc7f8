//! WhatsApp Cloud API sender

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::error_from_response;
use crate::config::WhatsAppConfig;
use crate::domain::ports::{DeliveryReceipt, WhatsAppMessage, WhatsAppSender};
use crate::error::DeliveryError;

/// Sends plain-text messages through `/{phone_number_id}/messages`.
///
/// Without configuration every message is logged instead.
pub struct WhatsAppCloudSender {
    http: Client,
    config: Option<WhatsAppConfig>,
}

impl WhatsAppCloudSender {
    pub fn new(config: Option<WhatsAppConfig>) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }

    fn messages_url(config: &WhatsAppConfig) -> String {
        format!(
            "{}/{}/messages",
            config.api_url.trim_end_matches('/'),
            config.phone_number_id
        )
    }
}

#[derive(Serialize)]
struct TextBody<'a> {
    preview_url: bool,
    body: &'a str,
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    messaging_product: &'static str,
    recipient_type: &'static str,
    to: &'a str,
    #[serde(rename = "type")]
    message_type: &'static str,
    text: TextBody<'a>,
}

#[derive(Deserialize)]
struct SendMessageResponse {
    #[serde(default)]
    messages: Vec<MessageRef>,
}

#[derive(Deserialize)]
struct MessageRef {
    id: String,
}

#[async_trait]
impl WhatsAppSender for WhatsAppCloudSender {
    async fn send(&self, message: &WhatsAppMessage) -> Result<DeliveryReceipt, DeliveryError> {
        if message.to.is_empty() || !message.to.chars().all(|c| c.is_ascii_digit()) {
            return Err(DeliveryError::InvalidRecipient(message.to.clone()));
        }

        let Some(config) = &self.config else {
            tracing::info!(
                to = %message.to,
                body = %message.body,
                "WhatsApp not configured, logging message instead"
            );
            return Ok(DeliveryReceipt::logged());
        };

        let body = SendMessageRequest {
            messaging_product: "whatsapp",
            recipient_type: "individual",
            to: &message.to,
            message_type: "text",
            text: TextBody {
                preview_url: false,
                body: &message.body,
            },
        };

        let response = self
            .http
            .post(Self::messages_url(config))
            .bearer_auth(&config.access_token)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let id = response
            .json::<SendMessageResponse>()
            .await
            .ok()
            .and_then(|r| r.messages.into_iter().next())
            .map(|m| m.id);

        tracing::debug!(to = %message.to, provider_id = ?id, "WhatsApp message sent");
        Ok(DeliveryReceipt {
            provider_message_id: id,
            logged_only: false,
        })
    }
}
