//! Change feed consumers
//!
//! `BookingNotifier` turns booking row changes into customer notifications.
//! `EquipmentMonitor` alerts admins when equipment needs maintenance.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use super::notification_service::{NotificationRequest, Notifier};
use super::templates;
use crate::domain::entities::{
    Booking, BookingStatus, Equipment, EquipmentStatus, NotificationType, Role,
};
use crate::domain::ports::UserRepository;
use crate::error::AppError;
use crate::realtime::{tables, ChangeEvent, ChangeFeed, ChangeHandler, EventMask, Subscription};

fn decode<T: DeserializeOwned>(value: &serde_json::Value, table: &str) -> Option<T> {
    match serde_json::from_value(value.clone()) {
        Ok(row) => Some(row),
        Err(e) => {
            tracing::warn!(table = %table, error = %e, "Unreadable change event row");
            None
        }
    }
}

pub struct BookingNotifier<N: Notifier> {
    notifier: Arc<N>,
    utc_offset_minutes: i32,
}

impl<N: Notifier + 'static> BookingNotifier<N> {
    pub fn new(notifier: Arc<N>, utc_offset_minutes: i32) -> Self {
        Self {
            notifier,
            utc_offset_minutes,
        }
    }

    /// Listen to every booking change
    pub fn subscribe(self: Arc<Self>, feed: &ChangeFeed) -> Subscription {
        feed.channel("booking-notifications")
            .table(tables::BOOKINGS)
            .events(EventMask::All)
            .subscribe(self)
    }

    async fn send_once(&self, booking: &Booking, request: NotificationRequest) {
        let notification_type = request.notification_type;
        match self
            .notifier
            .already_sent(notification_type, booking.id.0)
            .await
        {
            Ok(true) => {
                tracing::debug!(
                    booking_id = %booking.id,
                    notification_type = %notification_type,
                    "Notification already sent, skipping"
                );
                return;
            }
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(booking_id = %booking.id, error = %e, "Duplicate check failed");
                return;
            }
        }
        self.send(booking, request).await;
    }

    async fn send(&self, booking: &Booking, request: NotificationRequest) {
        let notification_type = request.notification_type;
        if let Err(e) = self.notifier.dispatch(request).await {
            log_failure(booking, notification_type, &e);
        }
    }
}

fn log_failure(booking: &Booking, notification_type: NotificationType, error: &AppError) {
    tracing::warn!(
        booking_id = %booking.id,
        notification_type = %notification_type,
        error = %error,
        "Booking notification failed"
    );
}

#[async_trait]
impl<N: Notifier + 'static> ChangeHandler for BookingNotifier<N> {
    async fn on_insert(&self, event: &ChangeEvent) {
        let Some(booking) = decode::<Booking>(&event.record, &event.table) else {
            return;
        };
        let request = templates::booking_confirmation(&booking, self.utc_offset_minutes);
        self.send_once(&booking, request).await;
    }

    async fn on_update(&self, event: &ChangeEvent) {
        let Some(booking) = decode::<Booking>(&event.record, &event.table) else {
            return;
        };
        let Some(old) = event
            .old_record
            .as_ref()
            .and_then(|v| decode::<Booking>(v, &event.table))
        else {
            return;
        };

        if old.status != booking.status {
            match booking.status {
                BookingStatus::Cancelled => {
                    let request = templates::booking_cancelled(&booking, self.utc_offset_minutes);
                    self.send_once(&booking, request).await;
                }
                BookingStatus::Completed => {
                    self.send_once(&booking, templates::booking_completed(&booking))
                        .await;
                }
                _ => {}
            }
        }

        if old.scheduled_at != booking.scheduled_at {
            let request = templates::booking_rescheduled(&booking, self.utc_offset_minutes);
            self.send(&booking, request).await;
        }
    }
}

pub struct EquipmentMonitor<UR: UserRepository, N: Notifier> {
    users: Arc<UR>,
    notifier: Arc<N>,
}

impl<UR: UserRepository + 'static, N: Notifier + 'static> EquipmentMonitor<UR, N> {
    pub fn new(users: Arc<UR>, notifier: Arc<N>) -> Self {
        Self { users, notifier }
    }

    /// Listen for equipment moving into `needs_maintenance`
    pub fn subscribe(self: Arc<Self>, feed: &ChangeFeed) -> Result<Subscription, AppError> {
        Ok(feed
            .channel("equipment-maintenance")
            .table(tables::EQUIPMENT)
            .events(EventMask::Update)
            .filter("status=eq.needs_maintenance")?
            .subscribe(self))
    }

    async fn alert_admins(&self, equipment: &Equipment) -> Result<usize, AppError> {
        let admins = self.users.list(Some(Role::Admin)).await?;
        let mut alerted = 0;
        for admin in &admins {
            match self
                .notifier
                .dispatch(templates::equipment_maintenance(equipment, admin.id))
                .await
            {
                Ok(_) => alerted += 1,
                Err(e) => tracing::warn!(
                    equipment_id = %equipment.id,
                    user_id = %admin.id,
                    error = %e,
                    "Maintenance alert failed"
                ),
            }
        }
        Ok(alerted)
    }
}

#[async_trait]
impl<UR: UserRepository + 'static, N: Notifier + 'static> ChangeHandler
    for EquipmentMonitor<UR, N>
{
    async fn on_update(&self, event: &ChangeEvent) {
        let Some(equipment) = decode::<Equipment>(&event.record, &event.table) else {
            return;
        };

        let was_flagged = event
            .old_record
            .as_ref()
            .and_then(|v| decode::<Equipment>(v, &event.table))
            .is_some_and(|old| old.status == EquipmentStatus::NeedsMaintenance);
        if was_flagged {
            return;
        }

        match self.alert_admins(&equipment).await {
            Ok(count) => tracing::info!(
                equipment_id = %equipment.id,
                admins = count,
                "Maintenance alert sent"
            ),
            Err(e) => tracing::warn!(
                equipment_id = %equipment.id,
                error = %e,
                "Could not load admins for maintenance alert"
            ),
        }
    }
}
