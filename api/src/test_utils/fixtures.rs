//! Test fixtures
//!
//! Factory functions for creating test data with sensible defaults.
//! Each fixture function creates a valid entity that can be customized.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::domain::entities::{
    Booking, BookingId, BookingStatus, Equipment, EquipmentId, EquipmentStatus, Invoice,
    InvoiceId, InvoiceStatus, NotificationPreferences, Role, ServicePackage, User, UserId,
    Vehicle, VehicleId, VehicleType,
};

fn user_with_role(role: Role) -> User {
    let id = Uuid::new_v4();
    let short = id.simple().to_string()[..8].to_string();
    User {
        id: UserId(id),
        email: format!("{}-{}@example.com", role, short),
        full_name: format!("Test {}", role),
        phone: Some("+14155550134".to_string()),
        role,
        api_key_hash: format!("hash-{}", short),
        created_at: Utc::now(),
    }
}

/// Create a customer with a unique id and email
pub fn test_customer() -> User {
    user_with_role(Role::Customer)
}

/// Create an admin with a unique id and email
pub fn test_admin() -> User {
    user_with_role(Role::Admin)
}

/// Default preferences for a user
pub fn test_preferences(user_id: UserId) -> NotificationPreferences {
    NotificationPreferences::defaults_for(user_id)
}

/// Create a pending basic wash two days from now
pub fn test_booking(customer_id: UserId) -> Booking {
    test_booking_at(
        customer_id,
        ServicePackage::BasicWash,
        Utc::now() + Duration::days(2),
    )
}

/// Create a pending booking for a package at a specific time
pub fn test_booking_at(
    customer_id: UserId,
    service: ServicePackage,
    scheduled_at: DateTime<Utc>,
) -> Booking {
    Booking {
        id: BookingId::new(),
        customer_id,
        vehicle_id: None,
        service,
        scheduled_at,
        status: BookingStatus::Pending,
        notes: None,
        total_cents: service.base_price_cents(),
        reminder_sent_at: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn test_vehicle(owner_id: UserId) -> Vehicle {
    Vehicle {
        id: VehicleId::new(),
        owner_id,
        make: "Toyota".to_string(),
        model: "Camry".to_string(),
        year: Some(2021),
        color: Some("Silver".to_string()),
        license_plate: Some("7ABC123".to_string()),
        vehicle_type: VehicleType::Sedan,
        notes: None,
        created_at: Utc::now(),
    }
}

/// Available, never maintained, 30 day interval
pub fn test_equipment(name: &str) -> Equipment {
    Equipment {
        id: EquipmentId::new(),
        name: name.to_string(),
        category: "general".to_string(),
        serial_number: None,
        status: EquipmentStatus::Available,
        last_maintenance_at: None,
        maintenance_interval_days: 30,
        notes: None,
        created_at: Utc::now(),
    }
}

/// Create an issued invoice without tax
pub fn test_invoice(customer_id: UserId, amount_cents: i64) -> Invoice {
    let now = Utc::now();
    Invoice {
        id: InvoiceId::new(),
        customer_id,
        booking_id: None,
        amount_cents,
        tax_cents: 0,
        status: InvoiceStatus::Issued,
        due_at: Some(now + Duration::days(14)),
        issued_at: now,
        paid_at: None,
        created_at: now,
    }
}

/// Create an invoice paid at `paid_at`
pub fn test_paid_invoice(customer_id: UserId, amount_cents: i64, paid_at: DateTime<Utc>) -> Invoice {
    Invoice {
        status: InvoiceStatus::Paid,
        issued_at: paid_at,
        paid_at: Some(paid_at),
        created_at: paid_at,
        ..test_invoice(customer_id, amount_cents)
    }
}
