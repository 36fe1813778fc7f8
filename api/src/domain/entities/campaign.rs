//! Marketing campaign domain entity
//!
//! A campaign is a promotion message sent once to a resolved audience.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

entity_id!(
    /// Unique identifier for a campaign
    CampaignId
);

/// Who receives a campaign
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CampaignAudience {
    AllCustomers,
    /// Customers without a booking in the last `days`
    InactiveCustomers { days: i64 },
    /// Customers with a booking in the last `days`
    RecentCustomers { days: i64 },
}

impl CampaignAudience {
    pub fn validate(&self) -> Result<(), String> {
        match self {
            CampaignAudience::AllCustomers => Ok(()),
            CampaignAudience::InactiveCustomers { days }
            | CampaignAudience::RecentCustomers { days } => {
                if *days <= 0 || *days > 3650 {
                    Err(format!("audience days must be 1-3650, got {}", days))
                } else {
                    Ok(())
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Draft,
    Scheduled,
    Sent,
    Cancelled,
}

text_enum!(CampaignStatus {
    Draft => "draft",
    Scheduled => "scheduled",
    Sent => "sent",
    Cancelled => "cancelled",
});

impl CampaignStatus {
    pub fn is_sendable(&self) -> bool {
        matches!(self, CampaignStatus::Draft | CampaignStatus::Scheduled)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    pub name: String,
    pub title: String,
    pub message: String,
    pub audience: CampaignAudience,
    pub status: CampaignStatus,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub sent_at: Option<DateTime<Utc>>,
    pub recipients_count: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCampaign {
    pub name: String,
    pub title: String,
    pub message: String,
    pub audience: CampaignAudience,
    pub scheduled_for: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CampaignUpdate {
    pub name: Option<String>,
    pub title: Option<String>,
    pub message: Option<String>,
    pub audience: Option<CampaignAudience>,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub status: Option<CampaignStatus>,
}
