//! Customer lifetime value
//!
//! Computed from paid invoices only. `compute_clv` is pure; the service
//! loads invoices and ranks customers.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::ClvSettings;
use crate::domain::entities::{Invoice, InvoiceStatus, Role, UserId};
use crate::domain::ports::{InvoiceRepository, UserRepository};
use crate::error::AppError;

const DAYS_PER_YEAR: f64 = 365.25;
const MIN_SPAN_DAYS: i64 = 30;
const AT_RISK_AFTER_DAYS: i64 = 90;
const CHURNED_AFTER_DAYS: i64 = 180;
const LOYAL_MIN_ORDERS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerSegment {
    Prospect,
    New,
    Loyal,
    Vip,
    AtRisk,
    Churned,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerClv {
    pub customer_id: UserId,
    pub total_revenue_cents: i64,
    pub order_count: usize,
    pub average_order_cents: i64,
    pub first_purchase_at: Option<DateTime<Utc>>,
    pub last_purchase_at: Option<DateTime<Utc>>,
    pub purchase_frequency_per_year: f64,
    pub predicted_value_cents: i64,
    pub segment: CustomerSegment,
}

/// Lifetime value of one customer from their invoices, evaluated at `now`.
/// Invoices that are not paid are ignored.
pub fn compute_clv(
    customer_id: UserId,
    invoices: &[Invoice],
    settings: &ClvSettings,
    now: DateTime<Utc>,
) -> CustomerClv {
    let mut purchases: Vec<(DateTime<Utc>, i64)> = invoices
        .iter()
        .filter(|i| i.status == InvoiceStatus::Paid)
        .map(|i| (i.paid_at.unwrap_or(i.issued_at), i.total_cents()))
        .collect();
    purchases.sort_by_key(|(at, _)| *at);

    let order_count = purchases.len();
    let total_revenue_cents = purchases
        .iter()
        .fold(0i64, |total, (_, cents)| total.saturating_add(*cents));
    let first_purchase_at = purchases.first().map(|(at, _)| *at);
    let last_purchase_at = purchases.last().map(|(at, _)| *at);

    let (average_order_cents, purchase_frequency_per_year) = match (first_purchase_at, last_purchase_at) {
        (Some(first), Some(last)) => {
            let span_days = (last - first).num_days().max(MIN_SPAN_DAYS);
            let years = span_days as f64 / DAYS_PER_YEAR;
            (
                total_revenue_cents / order_count as i64,
                order_count as f64 / years,
            )
        }
        _ => (0, 0.0),
    };

    let predicted_value_cents = (average_order_cents as f64
        * purchase_frequency_per_year
        * settings.expected_lifespan_years)
        .round() as i64;

    let segment = match last_purchase_at {
        None => CustomerSegment::Prospect,
        Some(last) => {
            let idle_days = (now - last).num_days();
            if idle_days > CHURNED_AFTER_DAYS {
                CustomerSegment::Churned
            } else if idle_days > AT_RISK_AFTER_DAYS {
                CustomerSegment::AtRisk
            } else if total_revenue_cents >= settings.vip_threshold_cents {
                CustomerSegment::Vip
            } else if order_count >= LOYAL_MIN_ORDERS {
                CustomerSegment::Loyal
            } else {
                CustomerSegment::New
            }
        }
    };

    CustomerClv {
        customer_id,
        total_revenue_cents,
        order_count,
        average_order_cents,
        first_purchase_at,
        last_purchase_at,
        purchase_frequency_per_year,
        predicted_value_cents,
        segment,
    }
}

pub struct ClvService<IR, UR>
where
    IR: InvoiceRepository,
    UR: UserRepository,
{
    invoices: Arc<IR>,
    users: Arc<UR>,
    settings: ClvSettings,
}

impl<IR, UR> ClvService<IR, UR>
where
    IR: InvoiceRepository,
    UR: UserRepository,
{
    pub fn new(invoices: Arc<IR>, users: Arc<UR>, settings: ClvSettings) -> Self {
        Self {
            invoices,
            users,
            settings,
        }
    }

    pub async fn customer_clv(
        &self,
        customer_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<CustomerClv, AppError> {
        self.users
            .find_by_id(customer_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {}", customer_id)))?;

        let invoices = self.invoices.list_for_customer(customer_id).await?;
        Ok(compute_clv(*customer_id, &invoices, &self.settings, now))
    }

    /// Customers ranked by predicted value, highest first
    pub async fn top_customers(
        &self,
        limit: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<CustomerClv>, AppError> {
        let mut by_customer: HashMap<UserId, Vec<Invoice>> = HashMap::new();
        for invoice in self.invoices.list_by_status(InvoiceStatus::Paid).await? {
            by_customer
                .entry(invoice.customer_id)
                .or_default()
                .push(invoice);
        }

        let customers = self.users.list(Some(Role::Customer)).await?;
        let mut ranked: Vec<CustomerClv> = customers
            .iter()
            .map(|c| {
                let invoices = by_customer.get(&c.id).map(Vec::as_slice).unwrap_or(&[]);
                compute_clv(c.id, invoices, &self.settings, now)
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.predicted_value_cents
                .cmp(&a.predicted_value_cents)
                .then(b.total_revenue_cents.cmp(&a.total_revenue_cents))
        });
        ranked.truncate(limit.clamp(1, 100));
        Ok(ranked)
    }
}
