//! Adapters layer
//!
//! Implementations of port traits for external systems.

pub mod messaging;
pub mod postgres;

pub use messaging::{normalize_phone, HttpEmailSender, WhatsAppCloudSender};
pub use postgres::{
    PostgresAdRepository, PostgresBookingRepository, PostgresCampaignRepository,
    PostgresEquipmentRepository, PostgresInvoiceRepository, PostgresNotificationRepository,
    PostgresPreferencesRepository, PostgresUserRepository, PostgresVehicleRepository,
};
