//! Application layer
//!
//! Contains use cases and service orchestration.
//! Services coordinate between domain entities, ports, and external systems.

pub mod ad_service;
pub mod booking_service;
pub mod campaign_service;
pub mod clv_service;
pub mod equipment_service;
pub mod invoice_service;
pub mod notification_service;
pub mod realtime_consumers;
pub mod templates;
pub mod user_service;
pub mod vehicle_service;

pub use ad_service::AdService;
pub use booking_service::{BookingRequest, BookingService, TimeSlot};
pub use campaign_service::{CampaignSendResult, CampaignService};
pub use clv_service::{compute_clv, ClvService, CustomerClv, CustomerSegment};
pub use equipment_service::EquipmentService;
pub use invoice_service::InvoiceService;
pub use notification_service::{
    plan_channels, Audience, BroadcastSummary, ChannelDelivery, ContactPoints, DeliveryOutcome,
    DispatchReport, NotificationRequest, NotificationService, Notifier,
};
pub use realtime_consumers::{BookingNotifier, EquipmentMonitor};
pub use user_service::{hash_api_key, Registration, UserService};
pub use vehicle_service::{FleetEntry, VehicleService};
