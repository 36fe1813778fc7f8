//! Domain entities
//!
//! Pure domain models representing core business concepts.
//! These are separate from the SeaORM entities in the `entity` module.

/// Declares a UUID-backed identifier newtype.
macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
        pub struct $name(pub uuid::Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<uuid::Uuid> for $name {
            fn from(id: uuid::Uuid) -> Self {
                Self(id)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

/// Implements `as_str`, `Display` and case-insensitive `FromStr` for a
/// fieldless enum stored as text.
macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    _ => Err(format!("Unknown {}: {}", stringify!($name), s)),
                }
            }
        }
    };
}

pub mod ad;
pub mod booking;
pub mod campaign;
pub mod equipment;
pub mod invoice;
pub mod notification;
pub mod preferences;
pub mod user;
pub mod vehicle;

pub use ad::{Ad, AdId, AdPlacement, AdUpdate, NewAd};
pub use booking::{Booking, BookingId, BookingStatus, NewBooking, ServicePackage};
pub use campaign::{
    Campaign, CampaignAudience, CampaignId, CampaignStatus, CampaignUpdate, NewCampaign,
};
pub use equipment::{Equipment, EquipmentId, EquipmentStatus, EquipmentUpdate, NewEquipment};
pub use invoice::{
    format_cents, Invoice, InvoiceId, InvoiceStatus, NewInvoice, MAX_INVOICE_CENTS,
};
pub use notification::{
    Channel, NewNotification, Notification, NotificationId, NotificationType, Priority,
};
pub use preferences::{NotificationPreferences, PreferencesUpdate};
pub use user::{NewUser, Role, User, UserId};
pub use vehicle::{NewVehicle, Vehicle, VehicleId, VehicleType, VehicleUpdate};
