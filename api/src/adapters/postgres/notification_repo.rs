//! PostgreSQL adapter for NotificationRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::domain::entities::{
    NewNotification, Notification, NotificationId, NotificationType, Priority, UserId,
};
use crate::domain::ports::NotificationRepository;
use crate::entity::notifications;
use crate::error::DomainError;
use crate::realtime::{tables, ChangeFeed};

/// PostgreSQL implementation of NotificationRepository
pub struct PostgresNotificationRepository {
    db: DatabaseConnection,
    feed: ChangeFeed,
}

impl PostgresNotificationRepository {
    pub fn new(db: DatabaseConnection, feed: ChangeFeed) -> Self {
        Self { db, feed }
    }

    async fn find_live(&self, id: &NotificationId) -> Result<notifications::Model, DomainError> {
        notifications::Entity::find_by_id(id.0)
            .filter(notifications::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?
            .ok_or_else(|| DomainError::NotFound(format!("Notification {}", id)))
    }
}

#[async_trait]
impl NotificationRepository for PostgresNotificationRepository {
    async fn create(&self, notification: &NewNotification) -> Result<Notification, DomainError> {
        let channels = serde_json::to_value(&notification.channels)
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        let model = notifications::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(notification.user_id.0),
            notification_type: Set(notification.notification_type.to_string()),
            title: Set(notification.title.clone()),
            message: Set(notification.message.clone()),
            data: Set(notification.data.clone()),
            priority: Set(notification.priority.to_string()),
            channels: Set(channels),
            reference_id: Set(notification.reference_id),
            read: Set(false),
            read_at: Set(None),
            created_at: Set(Utc::now().fixed_offset()),
            deleted_at: Set(None),
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        let created: Notification = result.into();
        self.feed.publish_insert(tables::NOTIFICATIONS, &created);
        Ok(created)
    }

    async fn find_by_id(&self, id: &NotificationId) -> Result<Option<Notification>, DomainError> {
        let result = notifications::Entity::find_by_id(id.0)
            .filter(notifications::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.map(|m| m.into()))
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
        unread_only: bool,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Notification>, DomainError> {
        let mut query = notifications::Entity::find()
            .filter(notifications::Column::UserId.eq(user_id.0))
            .filter(notifications::Column::DeletedAt.is_null());
        if unread_only {
            query = query.filter(notifications::Column::Read.eq(false));
        }

        let results = query
            .order_by_desc(notifications::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(results.into_iter().map(|m| m.into()).collect())
    }

    async fn count_unread(&self, user_id: &UserId) -> Result<u64, DomainError> {
        notifications::Entity::find()
            .filter(notifications::Column::UserId.eq(user_id.0))
            .filter(notifications::Column::Read.eq(false))
            .filter(notifications::Column::DeletedAt.is_null())
            .count(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))
    }

    async fn mark_read(&self, id: &NotificationId, at: DateTime<Utc>) -> Result<(), DomainError> {
        let model = self.find_live(id).await?;
        if model.read {
            return Ok(());
        }

        let old: Notification = model.clone().into();
        let mut active = model.into_active_model();
        active.read = Set(true);
        active.read_at = Set(Some(at.fixed_offset()));

        let updated = active
            .update(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        let new: Notification = updated.into();
        self.feed.publish_update(tables::NOTIFICATIONS, &old, &new);
        Ok(())
    }

    async fn mark_all_read(
        &self,
        user_id: &UserId,
        at: DateTime<Utc>,
    ) -> Result<u64, DomainError> {
        let unread = notifications::Entity::find()
            .filter(notifications::Column::UserId.eq(user_id.0))
            .filter(notifications::Column::Read.eq(false))
            .filter(notifications::Column::DeletedAt.is_null())
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        if unread.is_empty() {
            return Ok(0);
        }

        let ids: Vec<Uuid> = unread.iter().map(|m| m.id).collect();
        let result = notifications::Entity::update_many()
            .col_expr(notifications::Column::Read, Expr::value(true))
            .col_expr(notifications::Column::ReadAt, Expr::value(at.fixed_offset()))
            .filter(notifications::Column::Id.is_in(ids))
            .filter(notifications::Column::Read.eq(false))
            .exec(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        for model in unread {
            let old: Notification = model.into();
            let mut new = old.clone();
            new.read = true;
            new.read_at = Some(at);
            self.feed.publish_update(tables::NOTIFICATIONS, &old, &new);
        }

        Ok(result.rows_affected)
    }

    async fn soft_delete(&self, id: &NotificationId) -> Result<(), DomainError> {
        let model = self.find_live(id).await?;
        let old: Notification = model.clone().into();

        let mut active = model.into_active_model();
        active.deleted_at = Set(Some(Utc::now().fixed_offset()));
        active
            .update(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        self.feed.publish_delete(tables::NOTIFICATIONS, &old);
        Ok(())
    }

    async fn exists_for_reference(
        &self,
        notification_type: NotificationType,
        reference_id: Uuid,
    ) -> Result<bool, DomainError> {
        // Deleted rows count: the notification was still sent
        let count = notifications::Entity::find()
            .filter(notifications::Column::NotificationType.eq(notification_type.to_string()))
            .filter(notifications::Column::ReferenceId.eq(reference_id))
            .count(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(count > 0)
    }
}

/// Convert SeaORM model to domain entity
impl From<notifications::Model> for Notification {
    fn from(model: notifications::Model) -> Self {
        Notification {
            id: NotificationId(model.id),
            user_id: UserId(model.user_id),
            notification_type: model
                .notification_type
                .parse()
                .unwrap_or(NotificationType::Announcement),
            title: model.title,
            message: model.message,
            data: model.data,
            priority: model.priority.parse().unwrap_or(Priority::Normal),
            channels: serde_json::from_value(model.channels).unwrap_or_default(),
            reference_id: model.reference_id,
            read: model.read,
            read_at: model.read_at.map(|dt| dt.with_timezone(&Utc)),
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}
