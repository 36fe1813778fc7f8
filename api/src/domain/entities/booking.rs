//! Booking domain entity
//!
//! A customer's appointment for one service package.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{UserId, VehicleId};

entity_id!(
    /// Unique identifier for a booking
    BookingId
);

/// Detailing packages on offer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServicePackage {
    BasicWash,
    InteriorDetail,
    FullDetail,
    CeramicCoating,
    PaintCorrection,
}

text_enum!(ServicePackage {
    BasicWash => "basic_wash",
    InteriorDetail => "interior_detail",
    FullDetail => "full_detail",
    CeramicCoating => "ceramic_coating",
    PaintCorrection => "paint_correction",
});

impl ServicePackage {
    pub fn duration_minutes(&self) -> i64 {
        match self {
            ServicePackage::BasicWash => 60,
            ServicePackage::InteriorDetail => 120,
            ServicePackage::FullDetail => 180,
            ServicePackage::CeramicCoating | ServicePackage::PaintCorrection => 240,
        }
    }

    pub fn base_price_cents(&self) -> i64 {
        match self {
            ServicePackage::BasicWash => 3_500,
            ServicePackage::InteriorDetail => 12_000,
            ServicePackage::FullDetail => 22_000,
            ServicePackage::CeramicCoating => 65_000,
            ServicePackage::PaintCorrection => 48_000,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ServicePackage::BasicWash => "Basic Wash",
            ServicePackage::InteriorDetail => "Interior Detail",
            ServicePackage::FullDetail => "Full Detail",
            ServicePackage::CeramicCoating => "Ceramic Coating",
            ServicePackage::PaintCorrection => "Paint Correction",
        }
    }
}

/// Booking lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

text_enum!(BookingStatus {
    Pending => "pending",
    Confirmed => "confirmed",
    InProgress => "in_progress",
    Completed => "completed",
    Cancelled => "cancelled",
    NoShow => "no_show",
});

impl BookingStatus {
    /// Allowed status transitions
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, InProgress)
                | (Confirmed, Cancelled)
                | (Confirmed, NoShow)
                | (InProgress, Completed)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Completed | BookingStatus::Cancelled | BookingStatus::NoShow
        )
    }

    /// Whether a booking in this status holds a service bay
    pub fn occupies_bay(&self) -> bool {
        !matches!(self, BookingStatus::Cancelled | BookingStatus::NoShow)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub customer_id: UserId,
    pub vehicle_id: Option<VehicleId>,
    pub service: ServicePackage,
    pub scheduled_at: DateTime<Utc>,
    pub status: BookingStatus,
    pub notes: Option<String>,
    pub total_cents: i64,
    pub reminder_sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn ends_at(&self) -> DateTime<Utc> {
        self.scheduled_at + Duration::minutes(self.service.duration_minutes())
    }

    /// Whether this booking overlaps the half-open interval `[start, end)`
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.scheduled_at < end && start < self.ends_at()
    }
}

/// Data needed to create a new booking
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub customer_id: UserId,
    pub vehicle_id: Option<VehicleId>,
    pub service: ServicePackage,
    pub scheduled_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub total_cents: i64,
}
