//! Repository port traits
//!
//! These traits define the interface for data persistence.
//! Implementations are provided by adapters (e.g., PostgreSQL).
//! Soft-deleted rows are invisible to every read.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::{
    Ad, AdId, AdPlacement, AdUpdate, Booking, BookingId, BookingStatus, Campaign, CampaignId,
    CampaignUpdate, Equipment, EquipmentId, EquipmentUpdate, Invoice, InvoiceId, InvoiceStatus,
    NewAd, NewBooking, NewCampaign, NewEquipment, NewInvoice, NewNotification, NewUser,
    NewVehicle, Notification, NotificationId, NotificationPreferences, NotificationType, Role,
    User, UserId, Vehicle, VehicleId, VehicleUpdate,
};
use crate::error::DomainError;

/// Repository for User entities
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DomainError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;

    /// Find a user by API key hash
    async fn find_by_api_key_hash(&self, hash: &str) -> Result<Option<User>, DomainError>;

    async fn create(&self, user: &NewUser) -> Result<User, DomainError>;

    /// List users, optionally restricted to one role
    async fn list(&self, role: Option<Role>) -> Result<Vec<User>, DomainError>;
}

/// Repository for stored notifications
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create(&self, notification: &NewNotification) -> Result<Notification, DomainError>;

    async fn find_by_id(&self, id: &NotificationId) -> Result<Option<Notification>, DomainError>;

    /// Newest first
    async fn list_for_user(
        &self,
        user_id: &UserId,
        unread_only: bool,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Notification>, DomainError>;

    async fn count_unread(&self, user_id: &UserId) -> Result<u64, DomainError>;

    /// Mark one notification read. No-op when already read.
    async fn mark_read(&self, id: &NotificationId, at: DateTime<Utc>) -> Result<(), DomainError>;

    /// Mark every unread notification of a user read, returning how many changed
    async fn mark_all_read(&self, user_id: &UserId, at: DateTime<Utc>)
        -> Result<u64, DomainError>;

    async fn soft_delete(&self, id: &NotificationId) -> Result<(), DomainError>;

    /// Whether a notification of this type about this entity was already stored
    async fn exists_for_reference(
        &self,
        notification_type: NotificationType,
        reference_id: Uuid,
    ) -> Result<bool, DomainError>;
}

/// Repository for notification preferences
#[async_trait]
pub trait PreferencesRepository: Send + Sync {
    async fn find(&self, user_id: &UserId)
        -> Result<Option<NotificationPreferences>, DomainError>;

    async fn upsert(&self, prefs: &NotificationPreferences) -> Result<(), DomainError>;
}

/// Repository for bookings
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn create(&self, booking: &NewBooking) -> Result<Booking, DomainError>;

    async fn find_by_id(&self, id: &BookingId) -> Result<Option<Booking>, DomainError>;

    /// Most recent first
    async fn list_for_customer(
        &self,
        customer_id: &UserId,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Booking>, DomainError>;

    /// Bookings scheduled in `[from, to)`, any status, ordered by start
    async fn list_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Booking>, DomainError>;

    async fn update_status(
        &self,
        id: &BookingId,
        status: BookingStatus,
    ) -> Result<Booking, DomainError>;

    async fn reschedule(
        &self,
        id: &BookingId,
        scheduled_at: DateTime<Utc>,
    ) -> Result<Booking, DomainError>;

    /// Confirmed bookings starting in `[from, to)` that have not been reminded
    async fn find_due_reminders(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Booking>, DomainError>;

    async fn mark_reminder_sent(
        &self,
        id: &BookingId,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError>;

    /// Distinct customers with a non-cancelled booking scheduled at or after `since`
    async fn customers_with_bookings_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<UserId>, DomainError>;
}

/// Repository for customer vehicles
#[async_trait]
pub trait VehicleRepository: Send + Sync {
    async fn create(&self, vehicle: &NewVehicle) -> Result<Vehicle, DomainError>;

    async fn find_by_id(&self, id: &VehicleId) -> Result<Option<Vehicle>, DomainError>;

    async fn list_for_owner(&self, owner_id: &UserId) -> Result<Vec<Vehicle>, DomainError>;

    async fn update(&self, id: &VehicleId, update: &VehicleUpdate)
        -> Result<Vehicle, DomainError>;

    async fn soft_delete(&self, id: &VehicleId) -> Result<(), DomainError>;
}

/// Repository for marketing campaigns
#[async_trait]
pub trait CampaignRepository: Send + Sync {
    async fn create(&self, campaign: &NewCampaign) -> Result<Campaign, DomainError>;

    async fn find_by_id(&self, id: &CampaignId) -> Result<Option<Campaign>, DomainError>;

    /// Newest first
    async fn list(&self, limit: u64, offset: u64) -> Result<Vec<Campaign>, DomainError>;

    async fn update(
        &self,
        id: &CampaignId,
        update: &CampaignUpdate,
    ) -> Result<Campaign, DomainError>;

    /// Move a draft or scheduled campaign to `sent` in one guarded write.
    /// Fails with `Conflict` when the campaign is no longer sendable.
    async fn claim_for_send(
        &self,
        id: &CampaignId,
        at: DateTime<Utc>,
    ) -> Result<Campaign, DomainError>;

    async fn record_recipients(
        &self,
        id: &CampaignId,
        recipients_count: i32,
    ) -> Result<Campaign, DomainError>;

    async fn soft_delete(&self, id: &CampaignId) -> Result<(), DomainError>;
}

/// Repository for shop equipment
#[async_trait]
pub trait EquipmentRepository: Send + Sync {
    async fn create(&self, equipment: &NewEquipment) -> Result<Equipment, DomainError>;

    async fn find_by_id(&self, id: &EquipmentId) -> Result<Option<Equipment>, DomainError>;

    async fn list(&self) -> Result<Vec<Equipment>, DomainError>;

    async fn update(
        &self,
        id: &EquipmentId,
        update: &EquipmentUpdate,
    ) -> Result<Equipment, DomainError>;

    /// Stamp maintenance and put the item back in service
    async fn record_maintenance(
        &self,
        id: &EquipmentId,
        at: DateTime<Utc>,
    ) -> Result<Equipment, DomainError>;

    async fn soft_delete(&self, id: &EquipmentId) -> Result<(), DomainError>;
}

/// Repository for invoices
#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    async fn create(&self, invoice: &NewInvoice) -> Result<Invoice, DomainError>;

    async fn find_by_id(&self, id: &InvoiceId) -> Result<Option<Invoice>, DomainError>;

    /// Newest first
    async fn list_for_customer(&self, customer_id: &UserId) -> Result<Vec<Invoice>, DomainError>;

    async fn list_by_status(&self, status: InvoiceStatus) -> Result<Vec<Invoice>, DomainError>;

    async fn update_status(
        &self,
        id: &InvoiceId,
        status: InvoiceStatus,
        paid_at: Option<DateTime<Utc>>,
    ) -> Result<Invoice, DomainError>;
}

/// Repository for site ads
#[async_trait]
pub trait AdRepository: Send + Sync {
    async fn create(&self, ad: &NewAd) -> Result<Ad, DomainError>;

    async fn find_by_id(&self, id: &AdId) -> Result<Option<Ad>, DomainError>;

    async fn list(&self, placement: Option<AdPlacement>) -> Result<Vec<Ad>, DomainError>;

    async fn update(&self, id: &AdId, update: &AdUpdate) -> Result<Ad, DomainError>;

    async fn soft_delete(&self, id: &AdId) -> Result<(), DomainError>;
}
