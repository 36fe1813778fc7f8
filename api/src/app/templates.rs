//! Notification texts for the events the platform announces

use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde_json::json;

use super::notification_service::NotificationRequest;
use crate::domain::entities::{
    format_cents, Booking, Equipment, Invoice, NotificationType, UserId,
};

/// Format a timestamp in the shop's local time
pub fn local_time(at: DateTime<Utc>, utc_offset_minutes: i32) -> String {
    let offset = FixedOffset::east_opt(utc_offset_minutes * 60).unwrap_or(Utc.fix());
    at.with_timezone(&offset)
        .format("%a %b %-d at %-I:%M %p")
        .to_string()
}

fn booking_data(booking: &Booking) -> serde_json::Value {
    json!({
        "booking_id": booking.id,
        "service": booking.service,
        "scheduled_at": booking.scheduled_at,
        "status": booking.status,
    })
}

fn for_booking(
    booking: &Booking,
    notification_type: NotificationType,
    title: &str,
    message: String,
) -> NotificationRequest {
    NotificationRequest::new(booking.customer_id, notification_type, title, message)
        .with_data(booking_data(booking))
        .with_reference(booking.id.0)
}

pub fn booking_confirmation(booking: &Booking, utc_offset_minutes: i32) -> NotificationRequest {
    for_booking(
        booking,
        NotificationType::BookingConfirmation,
        "Booking received",
        format!(
            "Your {} is booked for {}. Total: {}.",
            booking.service.display_name(),
            local_time(booking.scheduled_at, utc_offset_minutes),
            format_cents(booking.total_cents)
        ),
    )
}

pub fn booking_reminder(booking: &Booking, utc_offset_minutes: i32) -> NotificationRequest {
    for_booking(
        booking,
        NotificationType::BookingReminder,
        "Appointment reminder",
        format!(
            "Reminder: your {} is on {}. Please remove valuables from the vehicle.",
            booking.service.display_name(),
            local_time(booking.scheduled_at, utc_offset_minutes)
        ),
    )
}

pub fn booking_rescheduled(booking: &Booking, utc_offset_minutes: i32) -> NotificationRequest {
    for_booking(
        booking,
        NotificationType::BookingRescheduled,
        "Booking rescheduled",
        format!(
            "Your {} has moved to {}.",
            booking.service.display_name(),
            local_time(booking.scheduled_at, utc_offset_minutes)
        ),
    )
}

pub fn booking_cancelled(booking: &Booking, utc_offset_minutes: i32) -> NotificationRequest {
    for_booking(
        booking,
        NotificationType::BookingCancelled,
        "Booking cancelled",
        format!(
            "Your {} on {} was cancelled.",
            booking.service.display_name(),
            local_time(booking.scheduled_at, utc_offset_minutes)
        ),
    )
}

pub fn booking_completed(booking: &Booking) -> NotificationRequest {
    for_booking(
        booking,
        NotificationType::BookingCompleted,
        "Your car is ready",
        format!(
            "Your {} is complete. Thanks for choosing us!",
            booking.service.display_name()
        ),
    )
}

pub fn payment_received(invoice: &Invoice) -> NotificationRequest {
    NotificationRequest::new(
        invoice.customer_id,
        NotificationType::PaymentReceived,
        "Payment received",
        format!(
            "We received your payment of {}. Thank you!",
            format_cents(invoice.total_cents())
        ),
    )
    .with_data(json!({
        "invoice_id": invoice.id,
        "total_cents": invoice.total_cents(),
    }))
    .with_reference(invoice.id.0)
}

pub fn equipment_maintenance(equipment: &Equipment, admin: UserId) -> NotificationRequest {
    let serial = equipment
        .serial_number
        .as_deref()
        .map(|s| format!(" (serial {})", s))
        .unwrap_or_default();
    NotificationRequest::new(
        admin,
        NotificationType::EquipmentMaintenance,
        "Equipment needs maintenance",
        format!("{}{} was flagged for maintenance.", equipment.name, serial),
    )
    .with_data(json!({
        "equipment_id": equipment.id,
        "category": equipment.category,
    }))
    .with_reference(equipment.id.0)
}
