//! Invoice and customer value handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::app::CustomerClv;
use crate::domain::entities::{BookingId, Invoice, InvoiceId, NewInvoice, User, UserId};
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateInvoiceRequest {
    pub customer_id: Uuid,
    #[serde(default)]
    pub booking_id: Option<Uuid>,
    pub amount_cents: i64,
    #[serde(default)]
    pub tax_cents: i64,
    #[serde(default)]
    pub due_at: Option<DateTime<Utc>>,
}

impl From<CreateInvoiceRequest> for NewInvoice {
    fn from(request: CreateInvoiceRequest) -> Self {
        NewInvoice {
            customer_id: UserId(request.customer_id),
            booking_id: request.booking_id.map(BookingId),
            amount_cents: request.amount_cents,
            tax_cents: request.tax_cents,
            due_at: request.due_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TopCustomersQuery {
    #[serde(default = "default_top")]
    pub limit: usize,
}

fn default_top() -> usize {
    10
}

/// GET /api/invoices
pub async fn my_invoices(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<Invoice>>, AppError> {
    Ok(Json(
        state.invoice_service.list_for_customer(&user.id).await?,
    ))
}

/// POST /api/admin/invoices
pub async fn create_invoice(
    State(state): State<AppState>,
    Json(request): Json<CreateInvoiceRequest>,
) -> Result<(StatusCode, Json<Invoice>), AppError> {
    let invoice = state.invoice_service.create(&request.into()).await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

/// GET /api/admin/customers/:id/invoices
pub async fn customer_invoices(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
) -> Result<Json<Vec<Invoice>>, AppError> {
    Ok(Json(
        state
            .invoice_service
            .list_for_customer(&UserId(customer_id))
            .await?,
    ))
}

/// POST /api/admin/invoices/:id/paid
pub async fn mark_paid(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Invoice>, AppError> {
    Ok(Json(
        state
            .invoice_service
            .mark_paid(&InvoiceId(id), Utc::now())
            .await?,
    ))
}

/// POST /api/admin/invoices/:id/void
pub async fn void_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Invoice>, AppError> {
    Ok(Json(state.invoice_service.void(&InvoiceId(id)).await?))
}

/// GET /api/admin/customers/:id/clv
pub async fn customer_clv(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
) -> Result<Json<CustomerClv>, AppError> {
    Ok(Json(
        state
            .clv_service
            .customer_clv(&UserId(customer_id), Utc::now())
            .await?,
    ))
}

/// GET /api/admin/customers/top?limit=10
pub async fn top_customers(
    State(state): State<AppState>,
    Query(query): Query<TopCustomersQuery>,
) -> Result<Json<Vec<CustomerClv>>, AppError> {
    Ok(Json(
        state
            .clv_service
            .top_customers(query.limit, Utc::now())
            .await?,
    ))
}
