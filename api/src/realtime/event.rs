//! Change events published by the repositories

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of row change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventKind {
    Insert,
    Update,
    Delete,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventKind::Insert => write!(f, "INSERT"),
            EventKind::Update => write!(f, "UPDATE"),
            EventKind::Delete => write!(f, "DELETE"),
        }
    }
}

/// Which event kinds a subscription wants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventMask {
    Insert,
    Update,
    Delete,
    #[default]
    All,
}

impl EventMask {
    pub fn matches(&self, kind: EventKind) -> bool {
        match self {
            EventMask::All => true,
            EventMask::Insert => kind == EventKind::Insert,
            EventMask::Update => kind == EventKind::Update,
            EventMask::Delete => kind == EventKind::Delete,
        }
    }
}

impl FromStr for EventMask {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "*" => Ok(EventMask::All),
            "INSERT" => Ok(EventMask::Insert),
            "UPDATE" => Ok(EventMask::Update),
            "DELETE" => Ok(EventMask::Delete),
            other => Err(format!("Unknown event mask: {}", other)),
        }
    }
}

/// One committed row change
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeEvent {
    pub table: String,
    pub kind: EventKind,
    /// New row; `Null` for deletes
    pub record: Value,
    /// Previous row for updates and deletes
    pub old_record: Option<Value>,
    pub committed_at: DateTime<Utc>,
}

impl ChangeEvent {
    /// The row a filter is evaluated against
    pub fn filter_target(&self) -> &Value {
        match self.kind {
            EventKind::Delete => self.old_record.as_ref().unwrap_or(&Value::Null),
            _ => &self.record,
        }
    }

    /// Deserialize the new row
    pub fn record_as<T: for<'de> Deserialize<'de>>(&self) -> Option<T> {
        serde_json::from_value(self.record.clone()).ok()
    }

    /// Deserialize the previous row
    pub fn old_record_as<T: for<'de> Deserialize<'de>>(&self) -> Option<T> {
        self.old_record
            .as_ref()
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}
