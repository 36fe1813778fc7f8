use std::env;
use std::str::FromStr;

use anyhow::{bail, Context};

/// Transactional email API settings
#[derive(Clone, Debug)]
pub struct EmailConfig {
    pub api_url: String,
    pub api_key: String,
    pub from_address: String,
}

/// WhatsApp Cloud API settings
#[derive(Clone, Debug)]
pub struct WhatsAppConfig {
    pub api_url: String,
    pub phone_number_id: String,
    pub access_token: String,
}

/// Opening hours and capacity of the shop, used for slot computation
#[derive(Clone, Debug)]
pub struct BusinessHours {
    pub open_hour: u32,
    pub close_hour: u32,
    pub slot_minutes: u32,
    /// Number of bookings that can run at the same time
    pub bays: usize,
    pub utc_offset_minutes: i32,
}

impl Default for BusinessHours {
    fn default() -> Self {
        Self {
            open_hour: 8,
            close_hour: 18,
            slot_minutes: 60,
            bays: 2,
            utc_offset_minutes: 0,
        }
    }
}

/// Tuning for the customer lifetime value projection
#[derive(Clone, Debug)]
pub struct ClvSettings {
    pub expected_lifespan_years: f64,
    pub vip_threshold_cents: i64,
}

impl Default for ClvSettings {
    fn default() -> Self {
        Self {
            expected_lifespan_years: 3.0,
            vip_threshold_cents: 100_000,
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Base URL for the API (used in outbound links)
    pub api_base_url: String,
    /// None means emails are only logged
    pub email: Option<EmailConfig>,
    /// None means WhatsApp messages are only logged
    pub whatsapp: Option<WhatsAppConfig>,
    /// App secret for verifying WhatsApp webhooks (HMAC-SHA256)
    pub whatsapp_app_secret: Option<String>,
    /// Token echoed back during the WhatsApp webhook verification handshake
    pub whatsapp_verify_token: Option<String>,
    /// Country calling code applied to local phone numbers
    pub default_country_code: String,
    pub business_hours: BusinessHours,
    pub reminder_interval_secs: u64,
    pub reminder_lead_hours: i64,
    pub clv: ClvSettings,
    /// Buffered events per realtime subscriber before it starts lagging
    pub realtime_capacity: usize,
    /// Admin account created at startup if missing
    pub admin_email: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let email = match (
            env::var("EMAIL_API_URL").ok(),
            env::var("EMAIL_API_KEY").ok(),
        ) {
            (Some(api_url), Some(api_key)) => Some(EmailConfig {
                api_url,
                api_key,
                from_address: env::var("EMAIL_FROM")
                    .unwrap_or_else(|_| "DetailHub <bookings@detailhub.local>".to_string()),
            }),
            _ => None,
        };

        let whatsapp = match (
            env::var("WHATSAPP_PHONE_NUMBER_ID").ok(),
            env::var("WHATSAPP_ACCESS_TOKEN").ok(),
        ) {
            (Some(phone_number_id), Some(access_token)) => Some(WhatsAppConfig {
                api_url: env::var("WHATSAPP_API_URL")
                    .unwrap_or_else(|_| "https://graph.facebook.com/v19.0".to_string()),
                phone_number_id,
                access_token,
            }),
            _ => None,
        };

        let defaults = BusinessHours::default();
        let business_hours = BusinessHours {
            open_hour: parse_var("BUSINESS_OPEN_HOUR", defaults.open_hour)?,
            close_hour: parse_var("BUSINESS_CLOSE_HOUR", defaults.close_hour)?,
            slot_minutes: parse_var("SLOT_MINUTES", defaults.slot_minutes)?,
            bays: parse_var("SERVICE_BAYS", defaults.bays)?,
            utc_offset_minutes: parse_var(
                "BUSINESS_UTC_OFFSET_MINUTES",
                defaults.utc_offset_minutes,
            )?,
        };
        if business_hours.open_hour >= business_hours.close_hour || business_hours.close_hour > 24
        {
            bail!(
                "BUSINESS_OPEN_HOUR ({}) must be before BUSINESS_CLOSE_HOUR ({})",
                business_hours.open_hour,
                business_hours.close_hour
            );
        }
        if business_hours.slot_minutes == 0 || business_hours.bays == 0 {
            bail!("SLOT_MINUTES and SERVICE_BAYS must be positive");
        }

        let clv_defaults = ClvSettings::default();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: parse_var("PORT", 8080)?,
            api_base_url: env::var("API_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            email,
            whatsapp,
            whatsapp_app_secret: env::var("WHATSAPP_APP_SECRET").ok(),
            whatsapp_verify_token: env::var("WHATSAPP_VERIFY_TOKEN").ok(),
            default_country_code: env::var("DEFAULT_COUNTRY_CODE")
                .unwrap_or_else(|_| "1".to_string()),
            business_hours,
            reminder_interval_secs: parse_var("REMINDER_INTERVAL_SECS", 300)?,
            reminder_lead_hours: parse_var("REMINDER_LEAD_HOURS", 24)?,
            clv: ClvSettings {
                expected_lifespan_years: parse_var(
                    "CLV_LIFESPAN_YEARS",
                    clv_defaults.expected_lifespan_years,
                )?,
                vip_threshold_cents: parse_var(
                    "CLV_VIP_THRESHOLD_CENTS",
                    clv_defaults.vip_threshold_cents,
                )?,
            },
            realtime_capacity: parse_var("REALTIME_CAPACITY", 256)?,
            admin_email: env::var("ADMIN_EMAIL").ok().filter(|e| !e.trim().is_empty()),
        })
    }

    /// Check if the email API is configured
    pub fn email_enabled(&self) -> bool {
        self.email.is_some()
    }

    /// Check if the WhatsApp Cloud API is configured
    pub fn whatsapp_enabled(&self) -> bool {
        self.whatsapp.is_some()
    }
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} has invalid value '{}': {}", name, raw, e)),
        Err(_) => Ok(default),
    }
}
