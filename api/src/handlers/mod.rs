//! HTTP handlers
//!
//! Axum request handlers for the API endpoints.

pub mod ads;
pub mod bookings;
pub mod campaigns;
pub mod equipment;
pub mod invoices;
pub mod notifications;
pub mod users;
pub mod vehicles;
pub mod webhooks;

pub use ads::{create_ad, delete_ad, list_ads, live_ads, update_ad};
pub use bookings::{
    available_slots, cancel_booking, create_booking, get_booking, list_bookings, list_day,
    reschedule_booking, update_status,
};
pub use campaigns::{
    create_campaign, delete_campaign, get_campaign, list_campaigns, send_campaign,
    update_campaign,
};
pub use equipment::{
    create_equipment, delete_equipment, get_equipment, list_equipment, maintenance_due,
    record_maintenance, update_equipment,
};
pub use invoices::{
    create_invoice, customer_clv, customer_invoices, mark_paid, my_invoices, top_customers,
    void_invoice,
};
pub use notifications::{
    broadcast, delete_notification, get_preferences, list_notifications, mark_all_read,
    mark_read, send_notification, unread_count, update_preferences,
};
pub use users::{me, register};
pub use vehicles::{
    add_vehicle, delete_vehicle, fleet_overview, get_vehicle, list_vehicles, update_vehicle,
};
pub use webhooks::{whatsapp_verify, whatsapp_webhook};
