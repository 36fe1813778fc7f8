//! Notification service
//!
//! Resolves channels from the notification type and the recipient's
//! preferences, stores the in-app record, then delivers email and WhatsApp
//! best-effort. Only a failure to store the notification reaches the caller.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::adapters::normalize_phone;
use crate::domain::entities::{
    Channel, NewNotification, Notification, NotificationId, NotificationPreferences,
    NotificationType, PreferencesUpdate, Priority, Role, User, UserId,
};
use crate::domain::ports::{
    EmailMessage, EmailSender, NotificationRepository, PreferencesRepository, UserRepository,
    WhatsAppMessage, WhatsAppSender,
};
use crate::error::{AppError, DomainError};

const MAX_PAGE_SIZE: u64 = 100;

/// One notification for one recipient
#[derive(Debug, Clone)]
pub struct NotificationRequest {
    pub recipient: UserId,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub data: Option<Value>,
    /// Replaces the type's default channels
    pub channels: Option<Vec<Channel>>,
    /// Replaces the type's default priority
    pub priority: Option<Priority>,
    pub reference_id: Option<Uuid>,
}

impl NotificationRequest {
    pub fn new(
        recipient: UserId,
        notification_type: NotificationType,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            recipient,
            notification_type,
            title: title.into(),
            message: message.into(),
            data: None,
            channels: None,
            priority: None,
            reference_id: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_reference(mut self, reference_id: Uuid) -> Self {
        self.reference_id = Some(reference_id);
        self
    }

    /// The same notification addressed to someone else
    pub fn to(&self, recipient: UserId) -> Self {
        Self {
            recipient,
            ..self.clone()
        }
    }
}

/// Where a recipient can be reached outside the app
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactPoints {
    pub email: Option<String>,
    /// E.164 digits, already normalized
    pub whatsapp: Option<String>,
}

impl ContactPoints {
    pub fn for_user(user: &User, default_country_code: &str) -> Self {
        let email = Some(user.email.trim().to_string()).filter(|e| e.contains('@'));
        let whatsapp = user
            .phone
            .as_deref()
            .and_then(|p| normalize_phone(p, default_country_code));
        Self { email, whatsapp }
    }
}

/// Decide the delivery channels for one notification at `now`.
///
/// `in_app` is always part of the result.
pub fn plan_channels(
    notification_type: NotificationType,
    requested: Option<&[Channel]>,
    priority: Priority,
    prefs: &NotificationPreferences,
    contact: &ContactPoints,
    now: DateTime<Utc>,
) -> Vec<Channel> {
    let (defaults, _) = notification_type.default_route();
    let start = requested.unwrap_or(defaults);

    let mut channels = vec![Channel::InApp];
    for channel in start {
        if !channels.contains(channel) {
            channels.push(*channel);
        }
    }

    channels.retain(|c| prefs.allows(*c));

    if notification_type.is_marketing() && !prefs.marketing_enabled {
        return vec![Channel::InApp];
    }

    if priority < Priority::Critical && prefs.in_quiet_hours(now) {
        return vec![Channel::InApp];
    }

    channels.retain(|c| match c {
        Channel::Email => contact.email.is_some(),
        Channel::WhatsApp => contact.whatsapp.is_some(),
        _ => true,
    });

    channels
}

/// What happened on one channel
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    /// The in-app row
    Stored,
    Sent { provider_message_id: Option<String> },
    /// Sender unconfigured; the message was written to the log
    Logged,
    Failed { error: String },
    Skipped { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ChannelDelivery {
    pub channel: Channel,
    #[serde(flatten)]
    pub outcome: DeliveryOutcome,
}

/// Result of a single dispatch
#[derive(Debug, Clone, Serialize)]
pub struct DispatchReport {
    pub notification: Notification,
    pub deliveries: Vec<ChannelDelivery>,
}

impl DispatchReport {
    pub fn outcome(&self, channel: Channel) -> Option<&DeliveryOutcome> {
        self.deliveries
            .iter()
            .find(|d| d.channel == channel)
            .map(|d| &d.outcome)
    }
}

/// Who a broadcast goes to
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", content = "user_ids", rename_all = "snake_case")]
pub enum Audience {
    AllUsers,
    Customers,
    Admins,
    Users(Vec<UserId>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BroadcastSummary {
    pub recipients: usize,
    pub stored: usize,
    pub failed: usize,
}

/// Something that can send notifications. Implemented by `NotificationService`;
/// other services depend on this instead of the service's type parameters.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn dispatch(&self, request: NotificationRequest) -> Result<DispatchReport, AppError>;

    /// Whether a notification of this type was already stored for `reference_id`
    async fn already_sent(
        &self,
        notification_type: NotificationType,
        reference_id: Uuid,
    ) -> Result<bool, AppError>;
}

/// Service for dispatching and managing notifications
pub struct NotificationService<NR, PR, UR, ES, WS>
where
    NR: NotificationRepository,
    PR: PreferencesRepository,
    UR: UserRepository,
    ES: EmailSender,
    WS: WhatsAppSender,
{
    notifications: Arc<NR>,
    preferences: Arc<PR>,
    users: Arc<UR>,
    email: Arc<ES>,
    whatsapp: Arc<WS>,
    default_country_code: String,
}

impl<NR, PR, UR, ES, WS> NotificationService<NR, PR, UR, ES, WS>
where
    NR: NotificationRepository,
    PR: PreferencesRepository,
    UR: UserRepository,
    ES: EmailSender,
    WS: WhatsAppSender,
{
    pub fn new(
        notifications: Arc<NR>,
        preferences: Arc<PR>,
        users: Arc<UR>,
        email: Arc<ES>,
        whatsapp: Arc<WS>,
        default_country_code: String,
    ) -> Self {
        Self {
            notifications,
            preferences,
            users,
            email,
            whatsapp,
            default_country_code,
        }
    }

    /// Dispatch evaluated at `now`
    pub async fn dispatch_at(
        &self,
        request: NotificationRequest,
        now: DateTime<Utc>,
    ) -> Result<DispatchReport, AppError> {
        let user = self
            .users
            .find_by_id(&request.recipient)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {}", request.recipient)))?;

        let prefs = self.get_preferences(&user.id).await?;
        let contact = ContactPoints::for_user(&user, &self.default_country_code);
        let (_, default_priority) = request.notification_type.default_route();
        let priority = request.priority.unwrap_or(default_priority);

        let channels = plan_channels(
            request.notification_type,
            request.channels.as_deref(),
            priority,
            &prefs,
            &contact,
            now,
        );

        let notification = self
            .notifications
            .create(&NewNotification {
                user_id: user.id,
                notification_type: request.notification_type,
                title: request.title,
                message: request.message,
                data: request.data,
                priority,
                channels: channels.clone(),
                reference_id: request.reference_id,
            })
            .await?;

        tracing::debug!(
            notification_id = %notification.id,
            user_id = %user.id,
            notification_type = %notification.notification_type,
            channels = ?channels,
            "Notification stored"
        );

        let mut deliveries = Vec::with_capacity(channels.len());
        for channel in channels {
            let outcome = self.deliver(channel, &user, &contact, &notification).await;
            if let DeliveryOutcome::Failed { error } = &outcome {
                tracing::warn!(
                    notification_id = %notification.id,
                    channel = %channel,
                    error = %error,
                    "Notification delivery failed"
                );
            }
            deliveries.push(ChannelDelivery { channel, outcome });
        }

        Ok(DispatchReport {
            notification,
            deliveries,
        })
    }

    async fn deliver(
        &self,
        channel: Channel,
        user: &User,
        contact: &ContactPoints,
        notification: &Notification,
    ) -> DeliveryOutcome {
        let result = match channel {
            Channel::InApp => return DeliveryOutcome::Stored,
            Channel::Push => {
                return DeliveryOutcome::Skipped {
                    reason: "no push sender".to_string(),
                }
            }
            Channel::Email => {
                let Some(to) = contact.email.clone() else {
                    return DeliveryOutcome::Skipped {
                        reason: "no email address".to_string(),
                    };
                };
                self.email
                    .send(&EmailMessage {
                        to,
                        to_name: Some(user.full_name.clone()),
                        subject: notification.title.clone(),
                        text: notification.message.clone(),
                        html: render_html(&notification.title, &notification.message),
                    })
                    .await
            }
            Channel::WhatsApp => {
                let Some(to) = contact.whatsapp.clone() else {
                    return DeliveryOutcome::Skipped {
                        reason: "no phone number".to_string(),
                    };
                };
                self.whatsapp
                    .send(&WhatsAppMessage {
                        to,
                        body: format!("*{}*\n{}", notification.title, notification.message),
                    })
                    .await
            }
        };

        match result {
            Ok(receipt) if receipt.logged_only => DeliveryOutcome::Logged,
            Ok(receipt) => DeliveryOutcome::Sent {
                provider_message_id: receipt.provider_message_id,
            },
            Err(e) => DeliveryOutcome::Failed {
                error: e.to_string(),
            },
        }
    }

    /// Dispatch the same notification to every user in `audience`
    pub async fn broadcast(
        &self,
        audience: &Audience,
        template: &NotificationRequest,
    ) -> Result<BroadcastSummary, AppError> {
        let recipients: Vec<UserId> = match audience {
            Audience::AllUsers => self.users.list(None).await?.into_iter().map(|u| u.id).collect(),
            Audience::Customers => self
                .users
                .list(Some(Role::Customer))
                .await?
                .into_iter()
                .map(|u| u.id)
                .collect(),
            Audience::Admins => self
                .users
                .list(Some(Role::Admin))
                .await?
                .into_iter()
                .map(|u| u.id)
                .collect(),
            Audience::Users(ids) => {
                let mut ids = ids.clone();
                ids.sort();
                ids.dedup();
                ids
            }
        };

        let mut summary = BroadcastSummary {
            recipients: recipients.len(),
            ..Default::default()
        };

        let now = Utc::now();
        for recipient in recipients {
            match self.dispatch_at(template.to(recipient), now).await {
                Ok(_) => summary.stored += 1,
                Err(e) => {
                    tracing::warn!(user_id = %recipient, error = %e, "Broadcast dispatch failed");
                    summary.failed += 1;
                }
            }
        }

        tracing::info!(
            recipients = summary.recipients,
            stored = summary.stored,
            failed = summary.failed,
            notification_type = %template.notification_type,
            "Broadcast finished"
        );
        Ok(summary)
    }

    pub async fn list_for_user(
        &self,
        user_id: &UserId,
        limit: u64,
        offset: u64,
        unread_only: bool,
    ) -> Result<Vec<Notification>, AppError> {
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        Ok(self
            .notifications
            .list_for_user(user_id, unread_only, limit, offset)
            .await?)
    }

    pub async fn unread_count(&self, user_id: &UserId) -> Result<u64, AppError> {
        Ok(self.notifications.count_unread(user_id).await?)
    }

    /// Mark one of the user's notifications read. Marking twice is fine.
    pub async fn mark_read(&self, user_id: &UserId, id: &NotificationId) -> Result<(), AppError> {
        self.find_owned(user_id, id).await?;
        self.notifications.mark_read(id, Utc::now()).await?;
        Ok(())
    }

    pub async fn mark_all_read(&self, user_id: &UserId) -> Result<u64, AppError> {
        Ok(self.notifications.mark_all_read(user_id, Utc::now()).await?)
    }

    pub async fn delete(&self, user_id: &UserId, id: &NotificationId) -> Result<(), AppError> {
        self.find_owned(user_id, id).await?;
        self.notifications.soft_delete(id).await?;
        Ok(())
    }

    /// Someone else's notification is reported as missing
    async fn find_owned(
        &self,
        user_id: &UserId,
        id: &NotificationId,
    ) -> Result<Notification, AppError> {
        self.notifications
            .find_by_id(id)
            .await?
            .filter(|n| n.user_id == *user_id)
            .ok_or_else(|| AppError::NotFound(format!("Notification {}", id)))
    }

    /// Stored preferences, or the defaults when none were saved
    pub async fn get_preferences(
        &self,
        user_id: &UserId,
    ) -> Result<NotificationPreferences, AppError> {
        Ok(self
            .preferences
            .find(user_id)
            .await?
            .unwrap_or_else(|| NotificationPreferences::defaults_for(*user_id)))
    }

    pub async fn update_preferences(
        &self,
        user_id: &UserId,
        update: &PreferencesUpdate,
    ) -> Result<NotificationPreferences, AppError> {
        let mut prefs = self.get_preferences(user_id).await?;
        prefs.apply(update).map_err(DomainError::Validation)?;
        self.preferences.upsert(&prefs).await?;
        Ok(prefs)
    }
}

#[async_trait]
impl<NR, PR, UR, ES, WS> Notifier for NotificationService<NR, PR, UR, ES, WS>
where
    NR: NotificationRepository,
    PR: PreferencesRepository,
    UR: UserRepository,
    ES: EmailSender,
    WS: WhatsAppSender,
{
    async fn dispatch(&self, request: NotificationRequest) -> Result<DispatchReport, AppError> {
        self.dispatch_at(request, Utc::now()).await
    }

    async fn already_sent(
        &self,
        notification_type: NotificationType,
        reference_id: Uuid,
    ) -> Result<bool, AppError> {
        Ok(self
            .notifications
            .exists_for_reference(notification_type, reference_id)
            .await?)
    }
}

fn render_html(title: &str, message: &str) -> String {
    let paragraphs: String = message
        .split("\n\n")
        .map(|p| format!("<p>{}</p>", escape_html(p).replace('\n', "<br>")))
        .collect();
    format!("<h2>{}</h2>{}", escape_html(title), paragraphs)
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
