//! PostgreSQL adapter for PreferencesRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{sea_query::OnConflict, DatabaseConnection, EntityTrait, Set};

use crate::domain::entities::{NotificationPreferences, UserId};
use crate::domain::ports::PreferencesRepository;
use crate::entity::notification_preferences;
use crate::error::DomainError;

/// PostgreSQL implementation of PreferencesRepository
pub struct PostgresPreferencesRepository {
    db: DatabaseConnection,
}

impl PostgresPreferencesRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PreferencesRepository for PostgresPreferencesRepository {
    async fn find(
        &self,
        user_id: &UserId,
    ) -> Result<Option<NotificationPreferences>, DomainError> {
        let result = notification_preferences::Entity::find_by_id(user_id.0)
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.map(|m| m.into()))
    }

    async fn upsert(&self, prefs: &NotificationPreferences) -> Result<(), DomainError> {
        use notification_preferences::Column;

        let model = notification_preferences::ActiveModel {
            user_id: Set(prefs.user_id.0),
            email_enabled: Set(prefs.email_enabled),
            whatsapp_enabled: Set(prefs.whatsapp_enabled),
            push_enabled: Set(prefs.push_enabled),
            marketing_enabled: Set(prefs.marketing_enabled),
            quiet_hours_enabled: Set(prefs.quiet_hours_enabled),
            quiet_hours_start: Set(i16::from(prefs.quiet_hours_start)),
            quiet_hours_end: Set(i16::from(prefs.quiet_hours_end)),
            utc_offset_minutes: Set(prefs.utc_offset_minutes),
            updated_at: Set(Utc::now().fixed_offset()),
        };

        notification_preferences::Entity::insert(model)
            .on_conflict(
                OnConflict::column(Column::UserId)
                    .update_columns([
                        Column::EmailEnabled,
                        Column::WhatsappEnabled,
                        Column::PushEnabled,
                        Column::MarketingEnabled,
                        Column::QuietHoursEnabled,
                        Column::QuietHoursStart,
                        Column::QuietHoursEnd,
                        Column::UtcOffsetMinutes,
                        Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(())
    }
}

/// Convert SeaORM model to domain entity
impl From<notification_preferences::Model> for NotificationPreferences {
    fn from(model: notification_preferences::Model) -> Self {
        NotificationPreferences {
            user_id: UserId(model.user_id),
            email_enabled: model.email_enabled,
            whatsapp_enabled: model.whatsapp_enabled,
            push_enabled: model.push_enabled,
            marketing_enabled: model.marketing_enabled,
            quiet_hours_enabled: model.quiet_hours_enabled,
            quiet_hours_start: model.quiet_hours_start.clamp(0, 23) as u8,
            quiet_hours_end: model.quiet_hours_end.clamp(0, 23) as u8,
            utc_offset_minutes: model.utc_offset_minutes,
        }
    }
}
