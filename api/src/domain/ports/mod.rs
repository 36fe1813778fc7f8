//! Domain ports (traits)
//!
//! Port traits define interfaces that the domain layer requires.
//! Adapters provide concrete implementations of these traits.

pub mod messaging;
pub mod repositories;

pub use messaging::{DeliveryReceipt, EmailMessage, EmailSender, WhatsAppMessage, WhatsAppSender};
pub use repositories::{
    AdRepository, BookingRepository, CampaignRepository, EquipmentRepository, InvoiceRepository,
    NotificationRepository, PreferencesRepository, UserRepository, VehicleRepository,
};
