//! Invoice domain entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BookingId, UserId};

entity_id!(
    /// Unique identifier for an invoice
    InvoiceId
);

/// Largest accepted amount or tax on a single invoice ($10M)
pub const MAX_INVOICE_CENTS: i64 = 1_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Issued,
    Paid,
    Void,
}

text_enum!(InvoiceStatus {
    Issued => "issued",
    Paid => "paid",
    Void => "void",
});

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub customer_id: UserId,
    pub booking_id: Option<BookingId>,
    pub amount_cents: i64,
    pub tax_cents: i64,
    pub status: InvoiceStatus,
    pub due_at: Option<DateTime<Utc>>,
    pub issued_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Invoice {
    pub fn total_cents(&self) -> i64 {
        self.amount_cents.saturating_add(self.tax_cents)
    }
}

#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub customer_id: UserId,
    pub booking_id: Option<BookingId>,
    pub amount_cents: i64,
    pub tax_cents: i64,
    pub due_at: Option<DateTime<Utc>>,
}

/// Format cents as a dollar amount, e.g. `12345` -> `$123.45`
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}${}.{:02}", sign, abs / 100, abs % 100)
}
