//! Notification domain entity
//!
//! A notification is always stored as an in-app record; email, WhatsApp and
//! push are extra delivery channels resolved at dispatch time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::UserId;

entity_id!(
    /// Unique identifier for a notification
    NotificationId
);

/// What happened, which drives the default channels and priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    BookingConfirmation,
    BookingReminder,
    BookingRescheduled,
    BookingCancelled,
    BookingCompleted,
    PaymentReceived,
    PaymentFailed,
    Promotion,
    LoyaltyReward,
    EquipmentMaintenance,
    SystemAlert,
    Announcement,
}

text_enum!(NotificationType {
    BookingConfirmation => "booking_confirmation",
    BookingReminder => "booking_reminder",
    BookingRescheduled => "booking_rescheduled",
    BookingCancelled => "booking_cancelled",
    BookingCompleted => "booking_completed",
    PaymentReceived => "payment_received",
    PaymentFailed => "payment_failed",
    Promotion => "promotion",
    LoyaltyReward => "loyalty_reward",
    EquipmentMaintenance => "equipment_maintenance",
    SystemAlert => "system_alert",
    Announcement => "announcement",
});

impl NotificationType {
    /// Default channels and priority for this type
    pub fn default_route(&self) -> (&'static [Channel], Priority) {
        use Channel::*;
        match self {
            NotificationType::BookingConfirmation
            | NotificationType::BookingReminder
            | NotificationType::BookingRescheduled
            | NotificationType::BookingCancelled => (&[InApp, Email, WhatsApp], Priority::High),
            NotificationType::BookingCompleted
            | NotificationType::PaymentReceived
            | NotificationType::LoyaltyReward => (&[InApp, Email], Priority::Normal),
            NotificationType::PaymentFailed => (&[InApp, Email, WhatsApp], Priority::Critical),
            NotificationType::Promotion => (&[InApp, Email], Priority::Low),
            NotificationType::EquipmentMaintenance => (&[InApp, Email], Priority::High),
            NotificationType::SystemAlert => (&[InApp, Email, WhatsApp, Push], Priority::Critical),
            NotificationType::Announcement => (&[InApp], Priority::Normal),
        }
    }

    /// Marketing messages honor the recipient's marketing opt-out
    pub fn is_marketing(&self) -> bool {
        matches!(
            self,
            NotificationType::Promotion | NotificationType::LoyaltyReward
        )
    }
}

/// Urgency of a notification. Ordered: `Low < Normal < High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Normal,
    High,
    Critical,
}

text_enum!(Priority {
    Low => "low",
    Normal => "normal",
    High => "high",
    Critical => "critical",
});

/// Delivery channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    InApp,
    Email,
    #[serde(rename = "whatsapp")]
    WhatsApp,
    Push,
}

text_enum!(Channel {
    InApp => "in_app",
    Email => "email",
    WhatsApp => "whatsapp",
    Push => "push",
});

/// A stored notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub data: Option<serde_json::Value>,
    pub priority: Priority,
    pub channels: Vec<Channel>,
    /// Entity this notification is about (booking, invoice, campaign...)
    pub reference_id: Option<Uuid>,
    pub read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Data needed to store a new notification
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: UserId,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub data: Option<serde_json::Value>,
    pub priority: Priority,
    pub channels: Vec<Channel>,
    pub reference_id: Option<Uuid>,
}
