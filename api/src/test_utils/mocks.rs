//! Mock implementations of port traits
//!
//! These are in-memory implementations that can be configured for testing.
//! They store data in memory and allow tests to verify behavior.
//! Soft-deleted rows are kept but hidden from reads, like the real adapters.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::app::{ChannelDelivery, DeliveryOutcome, DispatchReport, NotificationRequest, Notifier};
use crate::domain::entities::{
    Ad, AdId, AdPlacement, AdUpdate, Booking, BookingId, BookingStatus, Campaign, CampaignId,
    CampaignStatus, CampaignUpdate, Channel, Equipment, EquipmentId, EquipmentStatus,
    EquipmentUpdate, Invoice, InvoiceId, InvoiceStatus, NewAd, NewBooking, NewCampaign,
    NewEquipment, NewInvoice, NewNotification, NewUser, NewVehicle, Notification, NotificationId,
    NotificationPreferences, NotificationType, Priority, Role, User, UserId, Vehicle, VehicleId,
    VehicleUpdate,
};
use crate::domain::ports::{
    AdRepository, BookingRepository, CampaignRepository, DeliveryReceipt, EmailMessage,
    EmailSender, EquipmentRepository, InvoiceRepository, NotificationRepository,
    PreferencesRepository, UserRepository, VehicleRepository, WhatsAppMessage, WhatsAppSender,
};
use crate::error::{AppError, DeliveryError, DomainError};
use crate::realtime::{tables, ChangeFeed};

fn not_found(what: &str, id: impl std::fmt::Display) -> DomainError {
    DomainError::NotFound(format!("{} {}", what, id))
}

// ============================================================================
// In-Memory User Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<UserId, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate with a user for testing
    pub fn with_user(self, user: User) -> Self {
        self.users.write().unwrap().insert(user.id, user);
        self
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        Ok(self.users.read().unwrap().get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let users = self.users.read().unwrap();
        Ok(users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_api_key_hash(&self, hash: &str) -> Result<Option<User>, DomainError> {
        let users = self.users.read().unwrap();
        Ok(users.values().find(|u| u.api_key_hash == hash).cloned())
    }

    async fn create(&self, new_user: &NewUser) -> Result<User, DomainError> {
        let mut users = self.users.write().unwrap();
        if users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&new_user.email))
        {
            return Err(DomainError::AlreadyExists(format!(
                "User with email {}",
                new_user.email
            )));
        }

        let user = User {
            id: UserId::new(),
            email: new_user.email.clone(),
            full_name: new_user.full_name.clone(),
            phone: new_user.phone.clone(),
            role: new_user.role,
            api_key_hash: new_user.api_key_hash.clone(),
            created_at: Utc::now(),
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn list(&self, role: Option<Role>) -> Result<Vec<User>, DomainError> {
        let users = self.users.read().unwrap();
        let mut result: Vec<User> = users
            .values()
            .filter(|u| role.map_or(true, |r| u.role == r))
            .cloned()
            .collect();
        result.sort_by_key(|u| u.created_at);
        Ok(result)
    }
}

// ============================================================================
// In-Memory Notification Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryNotificationRepository {
    /// Insertion order, with a soft-delete flag
    rows: Arc<RwLock<Vec<(Notification, bool)>>>,
    should_fail: bool,
}

impl InMemoryNotificationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every write fails with a database error
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// Every stored notification, deleted ones included, oldest first
    pub fn all(&self) -> Vec<Notification> {
        self.rows
            .read()
            .unwrap()
            .iter()
            .map(|(n, _)| n.clone())
            .collect()
    }

    fn check(&self) -> Result<(), DomainError> {
        if self.should_fail {
            return Err(DomainError::Database("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationRepository for InMemoryNotificationRepository {
    async fn create(&self, new: &NewNotification) -> Result<Notification, DomainError> {
        self.check()?;
        let notification = Notification {
            id: NotificationId::new(),
            user_id: new.user_id,
            notification_type: new.notification_type,
            title: new.title.clone(),
            message: new.message.clone(),
            data: new.data.clone(),
            priority: new.priority,
            channels: new.channels.clone(),
            reference_id: new.reference_id,
            read: false,
            read_at: None,
            created_at: Utc::now(),
        };
        self.rows
            .write()
            .unwrap()
            .push((notification.clone(), false));
        Ok(notification)
    }

    async fn find_by_id(&self, id: &NotificationId) -> Result<Option<Notification>, DomainError> {
        self.check()?;
        let rows = self.rows.read().unwrap();
        Ok(rows
            .iter()
            .find(|(n, deleted)| n.id == *id && !deleted)
            .map(|(n, _)| n.clone()))
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
        unread_only: bool,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Notification>, DomainError> {
        self.check()?;
        let rows = self.rows.read().unwrap();
        Ok(rows
            .iter()
            .rev()
            .filter(|(n, deleted)| n.user_id == *user_id && !deleted && (!unread_only || !n.read))
            .skip(offset as usize)
            .take(limit as usize)
            .map(|(n, _)| n.clone())
            .collect())
    }

    async fn count_unread(&self, user_id: &UserId) -> Result<u64, DomainError> {
        self.check()?;
        let rows = self.rows.read().unwrap();
        Ok(rows
            .iter()
            .filter(|(n, deleted)| n.user_id == *user_id && !deleted && !n.read)
            .count() as u64)
    }

    async fn mark_read(&self, id: &NotificationId, at: DateTime<Utc>) -> Result<(), DomainError> {
        self.check()?;
        let mut rows = self.rows.write().unwrap();
        let (notification, _) = rows
            .iter_mut()
            .find(|(n, deleted)| n.id == *id && !deleted)
            .ok_or_else(|| not_found("Notification", id))?;
        if !notification.read {
            notification.read = true;
            notification.read_at = Some(at);
        }
        Ok(())
    }

    async fn mark_all_read(&self, user_id: &UserId, at: DateTime<Utc>) -> Result<u64, DomainError> {
        self.check()?;
        let mut rows = self.rows.write().unwrap();
        let mut changed = 0;
        for (n, deleted) in rows.iter_mut() {
            if n.user_id == *user_id && !*deleted && !n.read {
                n.read = true;
                n.read_at = Some(at);
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn soft_delete(&self, id: &NotificationId) -> Result<(), DomainError> {
        self.check()?;
        let mut rows = self.rows.write().unwrap();
        let row = rows
            .iter_mut()
            .find(|(n, deleted)| n.id == *id && !deleted)
            .ok_or_else(|| not_found("Notification", id))?;
        row.1 = true;
        Ok(())
    }

    async fn exists_for_reference(
        &self,
        notification_type: NotificationType,
        reference_id: Uuid,
    ) -> Result<bool, DomainError> {
        self.check()?;
        let rows = self.rows.read().unwrap();
        Ok(rows.iter().any(|(n, _)| {
            n.notification_type == notification_type && n.reference_id == Some(reference_id)
        }))
    }
}

// ============================================================================
// In-Memory Preferences Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryPreferencesRepository {
    prefs: Arc<RwLock<HashMap<UserId, NotificationPreferences>>>,
}

impl InMemoryPreferencesRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_preferences(self, prefs: NotificationPreferences) -> Self {
        self.prefs.write().unwrap().insert(prefs.user_id, prefs);
        self
    }
}

#[async_trait]
impl PreferencesRepository for InMemoryPreferencesRepository {
    async fn find(
        &self,
        user_id: &UserId,
    ) -> Result<Option<NotificationPreferences>, DomainError> {
        Ok(self.prefs.read().unwrap().get(user_id).cloned())
    }

    async fn upsert(&self, prefs: &NotificationPreferences) -> Result<(), DomainError> {
        self.prefs
            .write()
            .unwrap()
            .insert(prefs.user_id, prefs.clone());
        Ok(())
    }
}

// ============================================================================
// In-Memory Booking Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryBookingRepository {
    bookings: Arc<RwLock<HashMap<BookingId, Booking>>>,
    feed: Option<ChangeFeed>,
    stamp_failures: Arc<RwLock<HashSet<BookingId>>>,
}

impl InMemoryBookingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish changes to `feed`, like the Postgres adapter
    pub fn with_feed(mut self, feed: ChangeFeed) -> Self {
        self.feed = Some(feed);
        self
    }

    pub fn with_booking(self, booking: Booking) -> Self {
        self.bookings.write().unwrap().insert(booking.id, booking);
        self
    }

    /// Stamping the reminder of `id` fails with a database error
    pub fn failing_reminder_stamp(self, id: BookingId) -> Self {
        self.stamp_failures.write().unwrap().insert(id);
        self
    }

    fn modify(
        &self,
        id: &BookingId,
        change: impl FnOnce(&mut Booking),
    ) -> Result<Booking, DomainError> {
        let (old, new) = {
            let mut bookings = self.bookings.write().unwrap();
            let booking = bookings
                .get_mut(id)
                .ok_or_else(|| not_found("Booking", id))?;
            let old = booking.clone();
            change(booking);
            booking.updated_at = Utc::now();
            (old, booking.clone())
        };
        if let Some(feed) = &self.feed {
            feed.publish_update(tables::BOOKINGS, &old, &new);
        }
        Ok(new)
    }
}

#[async_trait]
impl BookingRepository for InMemoryBookingRepository {
    async fn create(&self, new: &NewBooking) -> Result<Booking, DomainError> {
        let now = Utc::now();
        let booking = Booking {
            id: BookingId::new(),
            customer_id: new.customer_id,
            vehicle_id: new.vehicle_id,
            service: new.service,
            scheduled_at: new.scheduled_at,
            status: BookingStatus::Pending,
            notes: new.notes.clone(),
            total_cents: new.total_cents,
            reminder_sent_at: None,
            created_at: now,
            updated_at: now,
        };
        self.bookings
            .write()
            .unwrap()
            .insert(booking.id, booking.clone());
        if let Some(feed) = &self.feed {
            feed.publish_insert(tables::BOOKINGS, &booking);
        }
        Ok(booking)
    }

    async fn find_by_id(&self, id: &BookingId) -> Result<Option<Booking>, DomainError> {
        Ok(self.bookings.read().unwrap().get(id).cloned())
    }

    async fn list_for_customer(
        &self,
        customer_id: &UserId,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Booking>, DomainError> {
        let bookings = self.bookings.read().unwrap();
        let mut result: Vec<Booking> = bookings
            .values()
            .filter(|b| b.customer_id == *customer_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.scheduled_at.cmp(&a.scheduled_at));
        Ok(result
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn list_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Booking>, DomainError> {
        let bookings = self.bookings.read().unwrap();
        let mut result: Vec<Booking> = bookings
            .values()
            .filter(|b| b.scheduled_at >= from && b.scheduled_at < to)
            .cloned()
            .collect();
        result.sort_by_key(|b| b.scheduled_at);
        Ok(result)
    }

    async fn update_status(
        &self,
        id: &BookingId,
        status: BookingStatus,
    ) -> Result<Booking, DomainError> {
        self.modify(id, |b| b.status = status)
    }

    async fn reschedule(
        &self,
        id: &BookingId,
        scheduled_at: DateTime<Utc>,
    ) -> Result<Booking, DomainError> {
        self.modify(id, |b| {
            b.scheduled_at = scheduled_at;
            b.reminder_sent_at = None;
        })
    }

    async fn find_due_reminders(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Booking>, DomainError> {
        let bookings = self.bookings.read().unwrap();
        let mut result: Vec<Booking> = bookings
            .values()
            .filter(|b| {
                b.status == BookingStatus::Confirmed
                    && b.reminder_sent_at.is_none()
                    && b.scheduled_at >= from
                    && b.scheduled_at < to
            })
            .cloned()
            .collect();
        result.sort_by_key(|b| b.scheduled_at);
        Ok(result)
    }

    async fn mark_reminder_sent(
        &self,
        id: &BookingId,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        if self.stamp_failures.read().unwrap().contains(id) {
            return Err(DomainError::Database("mock stamp failure".to_string()));
        }
        self.modify(id, |b| b.reminder_sent_at = Some(at))?;
        Ok(())
    }

    async fn customers_with_bookings_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<UserId>, DomainError> {
        let bookings = self.bookings.read().unwrap();
        let mut ids: Vec<UserId> = bookings
            .values()
            .filter(|b| b.scheduled_at >= since && b.status != BookingStatus::Cancelled)
            .map(|b| b.customer_id)
            .collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }
}

// ============================================================================
// In-Memory Vehicle Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryVehicleRepository {
    vehicles: Arc<RwLock<HashMap<VehicleId, (Vehicle, bool)>>>,
}

impl InMemoryVehicleRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vehicle(self, vehicle: Vehicle) -> Self {
        self.vehicles
            .write()
            .unwrap()
            .insert(vehicle.id, (vehicle, false));
        self
    }
}

#[async_trait]
impl VehicleRepository for InMemoryVehicleRepository {
    async fn create(&self, new: &NewVehicle) -> Result<Vehicle, DomainError> {
        let vehicle = Vehicle {
            id: VehicleId::new(),
            owner_id: new.owner_id,
            make: new.make.clone(),
            model: new.model.clone(),
            year: new.year,
            color: new.color.clone(),
            license_plate: new.license_plate.clone(),
            vehicle_type: new.vehicle_type,
            notes: new.notes.clone(),
            created_at: Utc::now(),
        };
        self.vehicles
            .write()
            .unwrap()
            .insert(vehicle.id, (vehicle.clone(), false));
        Ok(vehicle)
    }

    async fn find_by_id(&self, id: &VehicleId) -> Result<Option<Vehicle>, DomainError> {
        let vehicles = self.vehicles.read().unwrap();
        Ok(vehicles
            .get(id)
            .filter(|(_, deleted)| !deleted)
            .map(|(v, _)| v.clone()))
    }

    async fn list_for_owner(&self, owner_id: &UserId) -> Result<Vec<Vehicle>, DomainError> {
        let vehicles = self.vehicles.read().unwrap();
        let mut result: Vec<Vehicle> = vehicles
            .values()
            .filter(|(v, deleted)| v.owner_id == *owner_id && !deleted)
            .map(|(v, _)| v.clone())
            .collect();
        result.sort_by_key(|v| v.created_at);
        Ok(result)
    }

    async fn update(&self, id: &VehicleId, update: &VehicleUpdate) -> Result<Vehicle, DomainError> {
        let mut vehicles = self.vehicles.write().unwrap();
        let (vehicle, _) = vehicles
            .get_mut(id)
            .filter(|(_, deleted)| !deleted)
            .ok_or_else(|| not_found("Vehicle", id))?;

        if let Some(make) = &update.make {
            vehicle.make = make.clone();
        }
        if let Some(model) = &update.model {
            vehicle.model = model.clone();
        }
        if let Some(year) = update.year {
            vehicle.year = Some(year);
        }
        if let Some(color) = &update.color {
            vehicle.color = Some(color.clone());
        }
        if let Some(plate) = &update.license_plate {
            vehicle.license_plate = Some(plate.clone());
        }
        if let Some(vehicle_type) = update.vehicle_type {
            vehicle.vehicle_type = vehicle_type;
        }
        if let Some(notes) = &update.notes {
            vehicle.notes = Some(notes.clone());
        }
        Ok(vehicle.clone())
    }

    async fn soft_delete(&self, id: &VehicleId) -> Result<(), DomainError> {
        let mut vehicles = self.vehicles.write().unwrap();
        let row = vehicles
            .get_mut(id)
            .filter(|(_, deleted)| !deleted)
            .ok_or_else(|| not_found("Vehicle", id))?;
        row.1 = true;
        Ok(())
    }
}

// ============================================================================
// In-Memory Campaign Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryCampaignRepository {
    campaigns: Arc<RwLock<HashMap<CampaignId, (Campaign, bool)>>>,
}

impl InMemoryCampaignRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_campaign(self, campaign: Campaign) -> Self {
        self.campaigns
            .write()
            .unwrap()
            .insert(campaign.id, (campaign, false));
        self
    }

    fn modify(
        &self,
        id: &CampaignId,
        change: impl FnOnce(&mut Campaign),
    ) -> Result<Campaign, DomainError> {
        let mut campaigns = self.campaigns.write().unwrap();
        let (campaign, _) = campaigns
            .get_mut(id)
            .filter(|(_, deleted)| !deleted)
            .ok_or_else(|| not_found("Campaign", id))?;
        change(campaign);
        Ok(campaign.clone())
    }
}

#[async_trait]
impl CampaignRepository for InMemoryCampaignRepository {
    async fn create(&self, new: &NewCampaign) -> Result<Campaign, DomainError> {
        let campaign = Campaign {
            id: CampaignId::new(),
            name: new.name.clone(),
            title: new.title.clone(),
            message: new.message.clone(),
            audience: new.audience,
            status: if new.scheduled_for.is_some() {
                CampaignStatus::Scheduled
            } else {
                CampaignStatus::Draft
            },
            scheduled_for: new.scheduled_for,
            sent_at: None,
            recipients_count: 0,
            created_at: Utc::now(),
        };
        self.campaigns
            .write()
            .unwrap()
            .insert(campaign.id, (campaign.clone(), false));
        Ok(campaign)
    }

    async fn find_by_id(&self, id: &CampaignId) -> Result<Option<Campaign>, DomainError> {
        let campaigns = self.campaigns.read().unwrap();
        Ok(campaigns
            .get(id)
            .filter(|(_, deleted)| !deleted)
            .map(|(c, _)| c.clone()))
    }

    async fn list(&self, limit: u64, offset: u64) -> Result<Vec<Campaign>, DomainError> {
        let campaigns = self.campaigns.read().unwrap();
        let mut result: Vec<Campaign> = campaigns
            .values()
            .filter(|(_, deleted)| !deleted)
            .map(|(c, _)| c.clone())
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn update(
        &self,
        id: &CampaignId,
        update: &CampaignUpdate,
    ) -> Result<Campaign, DomainError> {
        self.modify(id, |c| {
            if let Some(name) = &update.name {
                c.name = name.clone();
            }
            if let Some(title) = &update.title {
                c.title = title.clone();
            }
            if let Some(message) = &update.message {
                c.message = message.clone();
            }
            if let Some(audience) = update.audience {
                c.audience = audience;
            }
            if let Some(at) = update.scheduled_for {
                c.scheduled_for = Some(at);
            }
            if let Some(status) = update.status {
                c.status = status;
            }
        })
    }

    async fn claim_for_send(
        &self,
        id: &CampaignId,
        at: DateTime<Utc>,
    ) -> Result<Campaign, DomainError> {
        let mut campaigns = self.campaigns.write().unwrap();
        let (campaign, _) = campaigns
            .get_mut(id)
            .filter(|(_, deleted)| !deleted)
            .ok_or_else(|| not_found("Campaign", id))?;
        if !campaign.status.is_sendable() {
            return Err(DomainError::Conflict(format!(
                "Campaign {} is already {}",
                id, campaign.status
            )));
        }
        campaign.status = CampaignStatus::Sent;
        campaign.sent_at = Some(at);
        campaign.recipients_count = 0;
        Ok(campaign.clone())
    }

    async fn record_recipients(
        &self,
        id: &CampaignId,
        recipients_count: i32,
    ) -> Result<Campaign, DomainError> {
        self.modify(id, |c| c.recipients_count = recipients_count)
    }

    async fn soft_delete(&self, id: &CampaignId) -> Result<(), DomainError> {
        let mut campaigns = self.campaigns.write().unwrap();
        let row = campaigns
            .get_mut(id)
            .filter(|(_, deleted)| !deleted)
            .ok_or_else(|| not_found("Campaign", id))?;
        row.1 = true;
        Ok(())
    }
}

// ============================================================================
// In-Memory Equipment Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryEquipmentRepository {
    equipment: Arc<RwLock<HashMap<EquipmentId, (Equipment, bool)>>>,
    feed: Option<ChangeFeed>,
}

impl InMemoryEquipmentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish changes to `feed`, like the Postgres adapter
    pub fn with_feed(mut self, feed: ChangeFeed) -> Self {
        self.feed = Some(feed);
        self
    }

    pub fn with_equipment(self, equipment: Equipment) -> Self {
        self.equipment
            .write()
            .unwrap()
            .insert(equipment.id, (equipment, false));
        self
    }

    fn modify(
        &self,
        id: &EquipmentId,
        change: impl FnOnce(&mut Equipment),
    ) -> Result<Equipment, DomainError> {
        let (old, new) = {
            let mut equipment = self.equipment.write().unwrap();
            let (item, _) = equipment
                .get_mut(id)
                .filter(|(_, deleted)| !deleted)
                .ok_or_else(|| not_found("Equipment", id))?;
            let old = item.clone();
            change(item);
            (old, item.clone())
        };
        if let Some(feed) = &self.feed {
            feed.publish_update(tables::EQUIPMENT, &old, &new);
        }
        Ok(new)
    }
}

#[async_trait]
impl EquipmentRepository for InMemoryEquipmentRepository {
    async fn create(&self, new: &NewEquipment) -> Result<Equipment, DomainError> {
        let item = Equipment {
            id: EquipmentId::new(),
            name: new.name.clone(),
            category: new.category.clone(),
            serial_number: new.serial_number.clone(),
            status: EquipmentStatus::Available,
            last_maintenance_at: None,
            maintenance_interval_days: new.maintenance_interval_days,
            notes: new.notes.clone(),
            created_at: Utc::now(),
        };
        self.equipment
            .write()
            .unwrap()
            .insert(item.id, (item.clone(), false));
        if let Some(feed) = &self.feed {
            feed.publish_insert(tables::EQUIPMENT, &item);
        }
        Ok(item)
    }

    async fn find_by_id(&self, id: &EquipmentId) -> Result<Option<Equipment>, DomainError> {
        let equipment = self.equipment.read().unwrap();
        Ok(equipment
            .get(id)
            .filter(|(_, deleted)| !deleted)
            .map(|(e, _)| e.clone()))
    }

    async fn list(&self) -> Result<Vec<Equipment>, DomainError> {
        let equipment = self.equipment.read().unwrap();
        let mut result: Vec<Equipment> = equipment
            .values()
            .filter(|(_, deleted)| !deleted)
            .map(|(e, _)| e.clone())
            .collect();
        result.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(result)
    }

    async fn update(
        &self,
        id: &EquipmentId,
        update: &EquipmentUpdate,
    ) -> Result<Equipment, DomainError> {
        self.modify(id, |e| {
            if let Some(name) = &update.name {
                e.name = name.clone();
            }
            if let Some(category) = &update.category {
                e.category = category.clone();
            }
            if let Some(serial) = &update.serial_number {
                e.serial_number = Some(serial.clone());
            }
            if let Some(status) = update.status {
                e.status = status;
            }
            if let Some(days) = update.maintenance_interval_days {
                e.maintenance_interval_days = days;
            }
            if let Some(notes) = &update.notes {
                e.notes = Some(notes.clone());
            }
        })
    }

    async fn record_maintenance(
        &self,
        id: &EquipmentId,
        at: DateTime<Utc>,
    ) -> Result<Equipment, DomainError> {
        self.modify(id, |e| {
            e.last_maintenance_at = Some(at);
            if e.status == EquipmentStatus::NeedsMaintenance {
                e.status = EquipmentStatus::Available;
            }
        })
    }

    async fn soft_delete(&self, id: &EquipmentId) -> Result<(), DomainError> {
        let mut equipment = self.equipment.write().unwrap();
        let row = equipment
            .get_mut(id)
            .filter(|(_, deleted)| !deleted)
            .ok_or_else(|| not_found("Equipment", id))?;
        row.1 = true;
        Ok(())
    }
}

// ============================================================================
// In-Memory Invoice Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryInvoiceRepository {
    invoices: Arc<RwLock<HashMap<InvoiceId, Invoice>>>,
}

impl InMemoryInvoiceRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_invoice(self, invoice: Invoice) -> Self {
        self.invoices.write().unwrap().insert(invoice.id, invoice);
        self
    }
}

#[async_trait]
impl InvoiceRepository for InMemoryInvoiceRepository {
    async fn create(&self, new: &NewInvoice) -> Result<Invoice, DomainError> {
        let now = Utc::now();
        let invoice = Invoice {
            id: InvoiceId::new(),
            customer_id: new.customer_id,
            booking_id: new.booking_id,
            amount_cents: new.amount_cents,
            tax_cents: new.tax_cents,
            status: InvoiceStatus::Issued,
            due_at: new.due_at,
            issued_at: now,
            paid_at: None,
            created_at: now,
        };
        self.invoices
            .write()
            .unwrap()
            .insert(invoice.id, invoice.clone());
        Ok(invoice)
    }

    async fn find_by_id(&self, id: &InvoiceId) -> Result<Option<Invoice>, DomainError> {
        Ok(self.invoices.read().unwrap().get(id).cloned())
    }

    async fn list_for_customer(&self, customer_id: &UserId) -> Result<Vec<Invoice>, DomainError> {
        let invoices = self.invoices.read().unwrap();
        let mut result: Vec<Invoice> = invoices
            .values()
            .filter(|i| i.customer_id == *customer_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.issued_at.cmp(&a.issued_at));
        Ok(result)
    }

    async fn list_by_status(&self, status: InvoiceStatus) -> Result<Vec<Invoice>, DomainError> {
        let invoices = self.invoices.read().unwrap();
        let mut result: Vec<Invoice> = invoices
            .values()
            .filter(|i| i.status == status)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.issued_at.cmp(&a.issued_at));
        Ok(result)
    }

    async fn update_status(
        &self,
        id: &InvoiceId,
        status: InvoiceStatus,
        paid_at: Option<DateTime<Utc>>,
    ) -> Result<Invoice, DomainError> {
        let mut invoices = self.invoices.write().unwrap();
        let invoice = invoices
            .get_mut(id)
            .ok_or_else(|| not_found("Invoice", id))?;
        invoice.status = status;
        invoice.paid_at = paid_at;
        Ok(invoice.clone())
    }
}

// ============================================================================
// In-Memory Ad Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryAdRepository {
    ads: Arc<RwLock<HashMap<AdId, (Ad, bool)>>>,
}

impl InMemoryAdRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ad(self, ad: Ad) -> Self {
        self.ads.write().unwrap().insert(ad.id, (ad, false));
        self
    }
}

#[async_trait]
impl AdRepository for InMemoryAdRepository {
    async fn create(&self, new: &NewAd) -> Result<Ad, DomainError> {
        let ad = Ad {
            id: AdId::new(),
            title: new.title.clone(),
            image_url: new.image_url.clone(),
            link_url: new.link_url.clone(),
            placement: new.placement,
            active: new.active,
            starts_at: new.starts_at,
            ends_at: new.ends_at,
            created_at: Utc::now(),
        };
        self.ads.write().unwrap().insert(ad.id, (ad.clone(), false));
        Ok(ad)
    }

    async fn find_by_id(&self, id: &AdId) -> Result<Option<Ad>, DomainError> {
        let ads = self.ads.read().unwrap();
        Ok(ads
            .get(id)
            .filter(|(_, deleted)| !deleted)
            .map(|(a, _)| a.clone()))
    }

    async fn list(&self, placement: Option<AdPlacement>) -> Result<Vec<Ad>, DomainError> {
        let ads = self.ads.read().unwrap();
        let mut result: Vec<Ad> = ads
            .values()
            .filter(|(a, deleted)| !deleted && placement.map_or(true, |p| a.placement == p))
            .map(|(a, _)| a.clone())
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }

    async fn update(&self, id: &AdId, update: &AdUpdate) -> Result<Ad, DomainError> {
        let mut ads = self.ads.write().unwrap();
        let (ad, _) = ads
            .get_mut(id)
            .filter(|(_, deleted)| !deleted)
            .ok_or_else(|| not_found("Ad", id))?;

        if let Some(title) = &update.title {
            ad.title = title.clone();
        }
        if let Some(url) = &update.image_url {
            ad.image_url = url.clone();
        }
        if let Some(link) = &update.link_url {
            ad.link_url = Some(link.clone());
        }
        if let Some(placement) = update.placement {
            ad.placement = placement;
        }
        if let Some(active) = update.active {
            ad.active = active;
        }
        if let Some(at) = update.starts_at {
            ad.starts_at = Some(at);
        }
        if let Some(at) = update.ends_at {
            ad.ends_at = Some(at);
        }
        Ok(ad.clone())
    }

    async fn soft_delete(&self, id: &AdId) -> Result<(), DomainError> {
        let mut ads = self.ads.write().unwrap();
        let row = ads
            .get_mut(id)
            .filter(|(_, deleted)| !deleted)
            .ok_or_else(|| not_found("Ad", id))?;
        row.1 = true;
        Ok(())
    }
}

// ============================================================================
// Mock Senders
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq)]
enum SenderMode {
    #[default]
    Deliver,
    Fail,
    LogOnly,
}

#[derive(Default)]
pub struct MockEmailSender {
    sent: Arc<RwLock<Vec<EmailMessage>>>,
    mode: SenderMode,
}

impl MockEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every send fails with an API error
    pub fn failing() -> Self {
        Self {
            mode: SenderMode::Fail,
            ..Self::default()
        }
    }

    /// Behaves like an unconfigured sender
    pub fn logging() -> Self {
        Self {
            mode: SenderMode::LogOnly,
            ..Self::default()
        }
    }

    /// Messages accepted for delivery
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.read().unwrap().clone()
    }
}

#[async_trait]
impl EmailSender for MockEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<DeliveryReceipt, DeliveryError> {
        match self.mode {
            SenderMode::Fail => Err(DeliveryError::Api {
                status: 500,
                message: "mock email failure".to_string(),
            }),
            SenderMode::LogOnly => Ok(DeliveryReceipt::logged()),
            SenderMode::Deliver => {
                let mut sent = self.sent.write().unwrap();
                sent.push(message.clone());
                Ok(DeliveryReceipt {
                    provider_message_id: Some(format!("email-{}", sent.len())),
                    logged_only: false,
                })
            }
        }
    }
}

#[derive(Default)]
pub struct MockWhatsAppSender {
    sent: Arc<RwLock<Vec<WhatsAppMessage>>>,
    mode: SenderMode,
}

impl MockWhatsAppSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            mode: SenderMode::Fail,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<WhatsAppMessage> {
        self.sent.read().unwrap().clone()
    }
}

#[async_trait]
impl WhatsAppSender for MockWhatsAppSender {
    async fn send(&self, message: &WhatsAppMessage) -> Result<DeliveryReceipt, DeliveryError> {
        match self.mode {
            SenderMode::Fail => Err(DeliveryError::RateLimited),
            SenderMode::LogOnly => Ok(DeliveryReceipt::logged()),
            SenderMode::Deliver => {
                let mut sent = self.sent.write().unwrap();
                sent.push(message.clone());
                Ok(DeliveryReceipt {
                    provider_message_id: Some(format!("wamid.{}", sent.len())),
                    logged_only: false,
                })
            }
        }
    }
}

// ============================================================================
// Recording Notifier
// ============================================================================

/// Records dispatched requests instead of delivering them
#[derive(Default)]
pub struct RecordingNotifier {
    requests: Arc<RwLock<Vec<NotificationRequest>>>,
    should_fail: Arc<RwLock<bool>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every dispatch fails until `set_failing(false)`
    pub fn failing() -> Self {
        let notifier = Self::default();
        notifier.set_failing(true);
        notifier
    }

    pub fn set_failing(&self, failing: bool) {
        *self.should_fail.write().unwrap() = failing;
    }

    /// Successfully dispatched requests, in order
    pub fn requests(&self) -> Vec<NotificationRequest> {
        self.requests.read().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn dispatch(&self, request: NotificationRequest) -> Result<DispatchReport, AppError> {
        if *self.should_fail.read().unwrap() {
            return Err(DomainError::Database("mock notifier failure".to_string()).into());
        }

        let notification = Notification {
            id: NotificationId::new(),
            user_id: request.recipient,
            notification_type: request.notification_type,
            title: request.title.clone(),
            message: request.message.clone(),
            data: request.data.clone(),
            priority: request.priority.unwrap_or(Priority::Normal),
            channels: vec![Channel::InApp],
            reference_id: request.reference_id,
            read: false,
            read_at: None,
            created_at: Utc::now(),
        };
        self.requests.write().unwrap().push(request);

        Ok(DispatchReport {
            notification,
            deliveries: vec![ChannelDelivery {
                channel: Channel::InApp,
                outcome: DeliveryOutcome::Stored,
            }],
        })
    }

    async fn already_sent(
        &self,
        notification_type: NotificationType,
        reference_id: Uuid,
    ) -> Result<bool, AppError> {
        Ok(self.requests.read().unwrap().iter().any(|r| {
            r.notification_type == notification_type && r.reference_id == Some(reference_id)
        }))
    }
}
