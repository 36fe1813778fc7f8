//! Invoice service

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::notification_service::Notifier;
use super::templates;
use crate::domain::entities::{
    format_cents, Invoice, InvoiceId, InvoiceStatus, NewInvoice, UserId, MAX_INVOICE_CENTS,
};
use crate::domain::ports::{InvoiceRepository, UserRepository};
use crate::error::{AppError, DomainError};

pub struct InvoiceService<IR, UR, N>
where
    IR: InvoiceRepository,
    UR: UserRepository,
    N: Notifier,
{
    invoices: Arc<IR>,
    users: Arc<UR>,
    notifier: Arc<N>,
}

impl<IR, UR, N> InvoiceService<IR, UR, N>
where
    IR: InvoiceRepository,
    UR: UserRepository,
    N: Notifier,
{
    pub fn new(invoices: Arc<IR>, users: Arc<UR>, notifier: Arc<N>) -> Self {
        Self {
            invoices,
            users,
            notifier,
        }
    }

    pub async fn create(&self, invoice: &NewInvoice) -> Result<Invoice, AppError> {
        if invoice.amount_cents <= 0 {
            return Err(AppError::BadRequest(
                "Invoice amount must be positive".to_string(),
            ));
        }
        if invoice.tax_cents < 0 {
            return Err(AppError::BadRequest("Tax cannot be negative".to_string()));
        }
        if invoice.amount_cents > MAX_INVOICE_CENTS || invoice.tax_cents > MAX_INVOICE_CENTS {
            return Err(AppError::BadRequest(format!(
                "Invoice amount and tax are limited to {}",
                format_cents(MAX_INVOICE_CENTS)
            )));
        }
        self.users
            .find_by_id(&invoice.customer_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {}", invoice.customer_id)))?;

        let invoice = self.invoices.create(invoice).await?;
        tracing::info!(
            invoice_id = %invoice.id,
            customer_id = %invoice.customer_id,
            total_cents = invoice.total_cents(),
            "Invoice issued"
        );
        Ok(invoice)
    }

    pub async fn get(&self, id: &InvoiceId) -> Result<Invoice, AppError> {
        self.invoices
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Invoice {}", id)))
    }

    pub async fn list_for_customer(&self, customer_id: &UserId) -> Result<Vec<Invoice>, AppError> {
        Ok(self.invoices.list_for_customer(customer_id).await?)
    }

    /// Settle an issued invoice and tell the customer
    pub async fn mark_paid(&self, id: &InvoiceId, at: DateTime<Utc>) -> Result<Invoice, AppError> {
        let invoice = self.get(id).await?;
        if invoice.status != InvoiceStatus::Issued {
            return Err(DomainError::Conflict(format!(
                "Only issued invoices can be paid, this one is {}",
                invoice.status
            ))
            .into());
        }

        let paid = self
            .invoices
            .update_status(id, InvoiceStatus::Paid, Some(at))
            .await?;
        tracing::info!(invoice_id = %id, "Invoice paid");

        if let Err(e) = self
            .notifier
            .dispatch(templates::payment_received(&paid))
            .await
        {
            tracing::warn!(invoice_id = %id, error = %e, "Failed to send payment receipt");
        }

        Ok(paid)
    }

    pub async fn void(&self, id: &InvoiceId) -> Result<Invoice, AppError> {
        let invoice = self.get(id).await?;
        if invoice.status != InvoiceStatus::Issued {
            return Err(DomainError::Conflict(format!(
                "Only issued invoices can be voided, this one is {}",
                invoice.status
            ))
            .into());
        }

        let voided = self
            .invoices
            .update_status(id, InvoiceStatus::Void, None)
            .await?;
        tracing::info!(invoice_id = %id, "Invoice voided");
        Ok(voided)
    }
}
