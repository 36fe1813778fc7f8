//! Shop equipment (pressure washers, polishers, extractors...)

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

entity_id!(
    /// Unique identifier for a piece of equipment
    EquipmentId
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentStatus {
    Available,
    InUse,
    NeedsMaintenance,
    Retired,
}

text_enum!(EquipmentStatus {
    Available => "available",
    InUse => "in_use",
    NeedsMaintenance => "needs_maintenance",
    Retired => "retired",
});

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Equipment {
    pub id: EquipmentId,
    pub name: String,
    pub category: String,
    pub serial_number: Option<String>,
    pub status: EquipmentStatus,
    pub last_maintenance_at: Option<DateTime<Utc>>,
    pub maintenance_interval_days: i32,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Equipment {
    /// Date the next maintenance is due, `None` if never maintained
    pub fn next_maintenance_on(&self) -> Option<NaiveDate> {
        self.last_maintenance_at.map(|at| {
            (at + Duration::days(i64::from(self.maintenance_interval_days))).date_naive()
        })
    }

    /// Retired equipment is never due; never-maintained equipment always is
    pub fn is_maintenance_due(&self, today: NaiveDate) -> bool {
        if self.status == EquipmentStatus::Retired {
            return false;
        }
        match self.next_maintenance_on() {
            Some(due) => due <= today,
            None => true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewEquipment {
    pub name: String,
    pub category: String,
    pub serial_number: Option<String>,
    pub maintenance_interval_days: i32,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EquipmentUpdate {
    pub name: Option<String>,
    pub category: Option<String>,
    pub serial_number: Option<String>,
    pub status: Option<EquipmentStatus>,
    pub maintenance_interval_days: Option<i32>,
    pub notes: Option<String>,
}
