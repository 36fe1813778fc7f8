//! PostgreSQL adapter for InvoiceRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::domain::entities::{
    BookingId, Invoice, InvoiceId, InvoiceStatus, NewInvoice, UserId,
};
use crate::domain::ports::InvoiceRepository;
use crate::entity::invoices;
use crate::error::DomainError;
use crate::realtime::{tables, ChangeFeed};

/// PostgreSQL implementation of InvoiceRepository
pub struct PostgresInvoiceRepository {
    db: DatabaseConnection,
    feed: ChangeFeed,
}

impl PostgresInvoiceRepository {
    pub fn new(db: DatabaseConnection, feed: ChangeFeed) -> Self {
        Self { db, feed }
    }
}

#[async_trait]
impl InvoiceRepository for PostgresInvoiceRepository {
    async fn create(&self, invoice: &NewInvoice) -> Result<Invoice, DomainError> {
        let now = Utc::now().fixed_offset();

        let model = invoices::ActiveModel {
            id: Set(Uuid::new_v4()),
            customer_id: Set(invoice.customer_id.0),
            booking_id: Set(invoice.booking_id.map(|b| b.0)),
            amount_cents: Set(invoice.amount_cents),
            tax_cents: Set(invoice.tax_cents),
            status: Set(InvoiceStatus::Issued.to_string()),
            due_at: Set(invoice.due_at.map(|dt| dt.fixed_offset())),
            issued_at: Set(now),
            paid_at: Set(None),
            created_at: Set(now),
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        let created: Invoice = result.into();
        self.feed.publish_insert(tables::INVOICES, &created);
        Ok(created)
    }

    async fn find_by_id(&self, id: &InvoiceId) -> Result<Option<Invoice>, DomainError> {
        let result = invoices::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.map(|m| m.into()))
    }

    async fn list_for_customer(&self, customer_id: &UserId) -> Result<Vec<Invoice>, DomainError> {
        let results = invoices::Entity::find()
            .filter(invoices::Column::CustomerId.eq(customer_id.0))
            .order_by_desc(invoices::Column::IssuedAt)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(results.into_iter().map(|m| m.into()).collect())
    }

    async fn list_by_status(&self, status: InvoiceStatus) -> Result<Vec<Invoice>, DomainError> {
        let results = invoices::Entity::find()
            .filter(invoices::Column::Status.eq(status.as_str()))
            .order_by_desc(invoices::Column::IssuedAt)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(results.into_iter().map(|m| m.into()).collect())
    }

    async fn update_status(
        &self,
        id: &InvoiceId,
        status: InvoiceStatus,
        paid_at: Option<DateTime<Utc>>,
    ) -> Result<Invoice, DomainError> {
        let model = invoices::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?
            .ok_or_else(|| DomainError::NotFound(format!("Invoice {}", id)))?;
        let old: Invoice = model.clone().into();

        let mut active = model.into_active_model();
        active.status = Set(status.to_string());
        active.paid_at = Set(paid_at.map(|dt| dt.fixed_offset()));

        let updated = active
            .update(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        let new: Invoice = updated.into();
        self.feed.publish_update(tables::INVOICES, &old, &new);
        Ok(new)
    }
}

/// Convert SeaORM model to domain entity
impl From<invoices::Model> for Invoice {
    fn from(model: invoices::Model) -> Self {
        Invoice {
            id: InvoiceId(model.id),
            customer_id: UserId(model.customer_id),
            booking_id: model.booking_id.map(BookingId),
            amount_cents: model.amount_cents,
            tax_cents: model.tax_cents,
            status: model.status.parse().unwrap_or(InvoiceStatus::Issued),
            due_at: model.due_at.map(|dt| dt.with_timezone(&Utc)),
            issued_at: model.issued_at.with_timezone(&Utc),
            paid_at: model.paid_at.map(|dt| dt.with_timezone(&Utc)),
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}
