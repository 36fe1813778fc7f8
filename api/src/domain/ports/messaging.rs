//! Outbound messaging ports
//!
//! Email and WhatsApp senders used by the notification dispatcher.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::DeliveryError;

/// A transactional email
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmailMessage {
    pub to: String,
    pub to_name: Option<String>,
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// A plain-text WhatsApp message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WhatsAppMessage {
    /// Recipient in E.164 digits, without the leading `+`
    pub to: String,
    pub body: String,
}

/// What the provider answered
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryReceipt {
    pub provider_message_id: Option<String>,
    /// The sender is unconfigured and only logged the message
    pub logged_only: bool,
}

impl DeliveryReceipt {
    pub fn logged() -> Self {
        Self {
            provider_message_id: None,
            logged_only: true,
        }
    }
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<DeliveryReceipt, DeliveryError>;
}

#[async_trait]
pub trait WhatsAppSender: Send + Sync {
    async fn send(&self, message: &WhatsAppMessage) -> Result<DeliveryReceipt, DeliveryError>;
}
