//! Promotional ads shown on the public site

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

entity_id!(
    /// Unique identifier for an ad
    AdId
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdPlacement {
    HomeHero,
    ServicesSidebar,
    BookingBanner,
}

text_enum!(AdPlacement {
    HomeHero => "home_hero",
    ServicesSidebar => "services_sidebar",
    BookingBanner => "booking_banner",
});

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ad {
    pub id: AdId,
    pub title: String,
    pub image_url: String,
    pub link_url: Option<String>,
    pub placement: AdPlacement,
    pub active: bool,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Ad {
    /// Active and inside its optional display window
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.active
            && self.starts_at.map_or(true, |s| s <= now)
            && self.ends_at.map_or(true, |e| now < e)
    }
}

#[derive(Debug, Clone)]
pub struct NewAd {
    pub title: String,
    pub image_url: String,
    pub link_url: Option<String>,
    pub placement: AdPlacement,
    pub active: bool,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdUpdate {
    pub title: Option<String>,
    pub image_url: Option<String>,
    pub link_url: Option<String>,
    pub placement: Option<AdPlacement>,
    pub active: Option<bool>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
}
