//! PostgreSQL adapter for BookingRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::domain::entities::{
    Booking, BookingId, BookingStatus, NewBooking, ServicePackage, UserId, VehicleId,
};
use crate::domain::ports::BookingRepository;
use crate::entity::bookings;
use crate::error::DomainError;
use crate::realtime::{tables, ChangeFeed};

/// PostgreSQL implementation of BookingRepository
pub struct PostgresBookingRepository {
    db: DatabaseConnection,
    feed: ChangeFeed,
}

impl PostgresBookingRepository {
    pub fn new(db: DatabaseConnection, feed: ChangeFeed) -> Self {
        Self { db, feed }
    }

    async fn find_model(&self, id: &BookingId) -> Result<bookings::Model, DomainError> {
        bookings::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?
            .ok_or_else(|| DomainError::NotFound(format!("Booking {}", id)))
    }

    /// Save an updated model and publish the change
    async fn save(
        &self,
        old: bookings::Model,
        active: bookings::ActiveModel,
    ) -> Result<Booking, DomainError> {
        let updated = active
            .update(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        let old: Booking = old.into();
        let new: Booking = updated.into();
        self.feed.publish_update(tables::BOOKINGS, &old, &new);
        Ok(new)
    }
}

#[async_trait]
impl BookingRepository for PostgresBookingRepository {
    async fn create(&self, booking: &NewBooking) -> Result<Booking, DomainError> {
        let now = Utc::now().fixed_offset();

        let model = bookings::ActiveModel {
            id: Set(Uuid::new_v4()),
            customer_id: Set(booking.customer_id.0),
            vehicle_id: Set(booking.vehicle_id.map(|v| v.0)),
            service: Set(booking.service.to_string()),
            scheduled_at: Set(booking.scheduled_at.fixed_offset()),
            status: Set(BookingStatus::Pending.to_string()),
            notes: Set(booking.notes.clone()),
            total_cents: Set(booking.total_cents),
            reminder_sent_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        let created: Booking = result.into();
        self.feed.publish_insert(tables::BOOKINGS, &created);
        Ok(created)
    }

    async fn find_by_id(&self, id: &BookingId) -> Result<Option<Booking>, DomainError> {
        let result = bookings::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.map(|m| m.into()))
    }

    async fn list_for_customer(
        &self,
        customer_id: &UserId,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Booking>, DomainError> {
        let results = bookings::Entity::find()
            .filter(bookings::Column::CustomerId.eq(customer_id.0))
            .order_by_desc(bookings::Column::ScheduledAt)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(results.into_iter().map(|m| m.into()).collect())
    }

    async fn list_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Booking>, DomainError> {
        let results = bookings::Entity::find()
            .filter(bookings::Column::ScheduledAt.gte(from.fixed_offset()))
            .filter(bookings::Column::ScheduledAt.lt(to.fixed_offset()))
            .order_by_asc(bookings::Column::ScheduledAt)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(results.into_iter().map(|m| m.into()).collect())
    }

    async fn update_status(
        &self,
        id: &BookingId,
        status: BookingStatus,
    ) -> Result<Booking, DomainError> {
        let model = self.find_model(id).await?;

        let mut active = model.clone().into_active_model();
        active.status = Set(status.to_string());
        active.updated_at = Set(Utc::now().fixed_offset());

        self.save(model, active).await
    }

    async fn reschedule(
        &self,
        id: &BookingId,
        scheduled_at: DateTime<Utc>,
    ) -> Result<Booking, DomainError> {
        let model = self.find_model(id).await?;

        let mut active = model.clone().into_active_model();
        active.scheduled_at = Set(scheduled_at.fixed_offset());
        active.reminder_sent_at = Set(None);
        active.updated_at = Set(Utc::now().fixed_offset());

        self.save(model, active).await
    }

    async fn find_due_reminders(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Booking>, DomainError> {
        let results = bookings::Entity::find()
            .filter(bookings::Column::Status.eq(BookingStatus::Confirmed.as_str()))
            .filter(bookings::Column::ReminderSentAt.is_null())
            .filter(bookings::Column::ScheduledAt.gte(from.fixed_offset()))
            .filter(bookings::Column::ScheduledAt.lt(to.fixed_offset()))
            .order_by_asc(bookings::Column::ScheduledAt)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(results.into_iter().map(|m| m.into()).collect())
    }

    async fn mark_reminder_sent(
        &self,
        id: &BookingId,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let model = self.find_model(id).await?;

        let mut active = model.clone().into_active_model();
        active.reminder_sent_at = Set(Some(at.fixed_offset()));

        self.save(model, active).await?;
        Ok(())
    }

    async fn customers_with_bookings_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<UserId>, DomainError> {
        let ids: Vec<Uuid> = bookings::Entity::find()
            .select_only()
            .column(bookings::Column::CustomerId)
            .distinct()
            .filter(bookings::Column::ScheduledAt.gte(since.fixed_offset()))
            .filter(bookings::Column::Status.ne(BookingStatus::Cancelled.as_str()))
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(ids.into_iter().map(UserId).collect())
    }
}

/// Convert SeaORM model to domain entity
impl From<bookings::Model> for Booking {
    fn from(model: bookings::Model) -> Self {
        Booking {
            id: BookingId(model.id),
            customer_id: UserId(model.customer_id),
            vehicle_id: model.vehicle_id.map(VehicleId),
            service: model.service.parse().unwrap_or(ServicePackage::BasicWash),
            scheduled_at: model.scheduled_at.with_timezone(&Utc),
            status: model.status.parse().unwrap_or(BookingStatus::Pending),
            notes: model.notes,
            total_cents: model.total_cents,
            reminder_sent_at: model.reminder_sent_at.map(|dt| dt.with_timezone(&Utc)),
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}
