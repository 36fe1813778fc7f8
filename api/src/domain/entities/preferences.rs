//! Notification preferences
//!
//! Per-user channel toggles and the quiet-hours window.

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};

use super::{Channel, UserId};

/// Largest accepted UTC offset (UTC+14 / UTC-12 with some headroom)
pub const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPreferences {
    pub user_id: UserId,
    pub email_enabled: bool,
    pub whatsapp_enabled: bool,
    pub push_enabled: bool,
    pub marketing_enabled: bool,
    pub quiet_hours_enabled: bool,
    /// First quiet hour, local time, 0-23
    pub quiet_hours_start: u8,
    /// First hour after the window, local time, 0-23
    pub quiet_hours_end: u8,
    pub utc_offset_minutes: i32,
}

impl NotificationPreferences {
    /// Preferences used for users that never saved any
    pub fn defaults_for(user_id: UserId) -> Self {
        Self {
            user_id,
            email_enabled: true,
            whatsapp_enabled: false,
            push_enabled: false,
            marketing_enabled: true,
            quiet_hours_enabled: false,
            quiet_hours_start: 22,
            quiet_hours_end: 8,
            utc_offset_minutes: 0,
        }
    }

    /// Whether the user accepts deliveries on this channel at all
    pub fn allows(&self, channel: Channel) -> bool {
        match channel {
            Channel::InApp => true,
            Channel::Email => self.email_enabled,
            Channel::WhatsApp => self.whatsapp_enabled,
            Channel::Push => self.push_enabled,
        }
    }

    /// Hour of day in the user's local time
    pub fn local_hour(&self, now: DateTime<Utc>) -> u8 {
        let local = now + Duration::minutes(i64::from(self.utc_offset_minutes));
        local.hour() as u8
    }

    /// Whether `now` falls inside the quiet-hours window.
    ///
    /// The window is `[start, end)` and wraps past midnight when
    /// `start > end`. Equal bounds make an empty window.
    pub fn in_quiet_hours(&self, now: DateTime<Utc>) -> bool {
        if !self.quiet_hours_enabled {
            return false;
        }

        let hour = self.local_hour(now);
        let (start, end) = (self.quiet_hours_start, self.quiet_hours_end);

        if start == end {
            false
        } else if start < end {
            hour >= start && hour < end
        } else {
            hour >= start || hour < end
        }
    }

    /// Apply a partial update, validating ranges
    pub fn apply(&mut self, update: &PreferencesUpdate) -> Result<(), String> {
        if let Some(start) = update.quiet_hours_start {
            if start > 23 {
                return Err(format!("quiet_hours_start must be 0-23, got {}", start));
            }
        }
        if let Some(end) = update.quiet_hours_end {
            if end > 23 {
                return Err(format!("quiet_hours_end must be 0-23, got {}", end));
            }
        }
        if let Some(offset) = update.utc_offset_minutes {
            if !(-MAX_UTC_OFFSET_MINUTES..=MAX_UTC_OFFSET_MINUTES).contains(&offset) {
                return Err(format!(
                    "utc_offset_minutes must be within ±{}, got {}",
                    MAX_UTC_OFFSET_MINUTES, offset
                ));
            }
        }

        if let Some(v) = update.email_enabled {
            self.email_enabled = v;
        }
        if let Some(v) = update.whatsapp_enabled {
            self.whatsapp_enabled = v;
        }
        if let Some(v) = update.push_enabled {
            self.push_enabled = v;
        }
        if let Some(v) = update.marketing_enabled {
            self.marketing_enabled = v;
        }
        if let Some(v) = update.quiet_hours_enabled {
            self.quiet_hours_enabled = v;
        }
        if let Some(v) = update.quiet_hours_start {
            self.quiet_hours_start = v;
        }
        if let Some(v) = update.quiet_hours_end {
            self.quiet_hours_end = v;
        }
        if let Some(v) = update.utc_offset_minutes {
            self.utc_offset_minutes = v;
        }
        Ok(())
    }
}

/// Partial preference update as sent by clients
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreferencesUpdate {
    pub email_enabled: Option<bool>,
    pub whatsapp_enabled: Option<bool>,
    pub push_enabled: Option<bool>,
    pub marketing_enabled: Option<bool>,
    pub quiet_hours_enabled: Option<bool>,
    pub quiet_hours_start: Option<u8>,
    pub quiet_hours_end: Option<u8>,
    pub utc_offset_minutes: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn prefs(start: u8, end: u8) -> NotificationPreferences {
        NotificationPreferences {
            quiet_hours_enabled: true,
            quiet_hours_start: start,
            quiet_hours_end: end,
            ..NotificationPreferences::defaults_for(UserId(Uuid::nil()))
        }
    }

    fn at_hour(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, hour, 30, 0).unwrap()
    }

    #[test]
    fn window_wrapping_midnight() {
        let p = prefs(22, 7);
        assert!(p.in_quiet_hours(at_hour(23)));
        assert!(p.in_quiet_hours(at_hour(0)));
        assert!(p.in_quiet_hours(at_hour(6)));
        assert!(!p.in_quiet_hours(at_hour(7)));
        assert!(!p.in_quiet_hours(at_hour(12)));
        assert!(p.in_quiet_hours(at_hour(22)));
    }

    #[test]
    fn window_within_a_day() {
        let p = prefs(13, 15);
        assert!(p.in_quiet_hours(at_hour(13)));
        assert!(p.in_quiet_hours(at_hour(14)));
        assert!(!p.in_quiet_hours(at_hour(15)));
        assert!(!p.in_quiet_hours(at_hour(12)));
    }

    #[test]
    fn equal_bounds_mean_no_window() {
        let p = prefs(9, 9);
        for h in 0..24 {
            assert!(!p.in_quiet_hours(at_hour(h)));
        }
    }

    #[test]
    fn disabled_window_never_matches() {
        let mut p = prefs(0, 23);
        p.quiet_hours_enabled = false;
        assert!(!p.in_quiet_hours(at_hour(3)));
    }

    #[test]
    fn offset_shifts_local_hour() {
        let mut p = prefs(22, 7);
        // 20:30 UTC is 23:30 at UTC+3
        p.utc_offset_minutes = 180;
        assert_eq!(p.local_hour(at_hour(20)), 23);
        assert!(p.in_quiet_hours(at_hour(20)));

        // 02:30 UTC is 21:30 at UTC-5
        p.utc_offset_minutes = -300;
        assert_eq!(p.local_hour(at_hour(2)), 21);
        assert!(!p.in_quiet_hours(at_hour(2)));
    }

    #[test]
    fn in_app_is_always_allowed() {
        let mut p = prefs(0, 0);
        p.email_enabled = false;
        assert!(p.allows(Channel::InApp));
        assert!(!p.allows(Channel::Email));
        assert!(!p.allows(Channel::WhatsApp));
    }

    #[test]
    fn apply_rejects_out_of_range_hours() {
        let mut p = prefs(22, 7);
        let err = p
            .apply(&PreferencesUpdate {
                quiet_hours_start: Some(24),
                ..Default::default()
            })
            .unwrap_err();
        assert!(err.contains("0-23"));
        // unchanged on error
        assert_eq!(p.quiet_hours_start, 22);
    }

    #[test]
    fn apply_rejects_extreme_offsets() {
        let mut p = prefs(22, 7);
        for offset in [i32::MIN, i32::MAX, MAX_UTC_OFFSET_MINUTES + 1] {
            let update: PreferencesUpdate =
                serde_json::from_value(serde_json::json!({ "utc_offset_minutes": offset }))
                    .unwrap();
            assert!(p.apply(&update).is_err(), "offset {} accepted", offset);
        }
        assert_eq!(p.utc_offset_minutes, 0);

        p.apply(&PreferencesUpdate {
            utc_offset_minutes: Some(-MAX_UTC_OFFSET_MINUTES),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(p.utc_offset_minutes, -MAX_UTC_OFFSET_MINUTES);
    }

    #[test]
    fn apply_updates_only_given_fields() {
        let mut p = prefs(22, 7);
        p.apply(&PreferencesUpdate {
            whatsapp_enabled: Some(true),
            utc_offset_minutes: Some(-240),
            ..Default::default()
        })
        .unwrap();
        assert!(p.whatsapp_enabled);
        assert!(p.email_enabled);
        assert_eq!(p.utc_offset_minutes, -240);
        assert_eq!(p.quiet_hours_end, 7);
    }
}
