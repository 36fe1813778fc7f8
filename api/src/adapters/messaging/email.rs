//! Transactional email over an HTTP API

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::error_from_response;
use crate::config::EmailConfig;
use crate::domain::ports::{DeliveryReceipt, EmailMessage, EmailSender};
use crate::error::DeliveryError;

/// Sends email with a JSON POST and a bearer key.
///
/// Without configuration every message is logged instead.
pub struct HttpEmailSender {
    http: Client,
    config: Option<EmailConfig>,
}

impl HttpEmailSender {
    pub fn new(config: Option<EmailConfig>) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }
}

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: Vec<String>,
    subject: &'a str,
    text: &'a str,
    html: &'a str,
}

#[derive(Deserialize)]
struct SendEmailResponse {
    id: Option<String>,
}

fn recipient(message: &EmailMessage) -> String {
    match &message.to_name {
        Some(name) => format!("{} <{}>", name.replace(['<', '>', '"'], ""), message.to),
        None => message.to.clone(),
    }
}

#[async_trait]
impl EmailSender for HttpEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<DeliveryReceipt, DeliveryError> {
        if !message.to.contains('@') {
            return Err(DeliveryError::InvalidRecipient(message.to.clone()));
        }

        let Some(config) = &self.config else {
            tracing::info!(
                to = %message.to,
                subject = %message.subject,
                "Email not configured, logging message instead"
            );
            return Ok(DeliveryReceipt::logged());
        };

        let body = SendEmailRequest {
            from: &config.from_address,
            to: vec![recipient(message)],
            subject: &message.subject,
            text: &message.text,
            html: &message.html,
        };

        let response = self
            .http
            .post(&config.api_url)
            .bearer_auth(&config.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        // Providers differ in what they return; the id is informational
        let id = response
            .json::<SendEmailResponse>()
            .await
            .ok()
            .and_then(|r| r.id);

        tracing::debug!(to = %message.to, provider_id = ?id, "Email sent");
        Ok(DeliveryReceipt {
            provider_message_id: id,
            logged_only: false,
        })
    }
}
