//! Booking handlers
//!
//! Slot availability, customer bookings, and the admin day sheet.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::app::{BookingRequest, TimeSlot};
use crate::domain::entities::{Booking, BookingId, BookingStatus, ServicePackage, User, VehicleId};
use crate::error::AppError;
use crate::AppState;

/// Query parameters for GET /api/slots
#[derive(Debug, Deserialize)]
pub struct SlotsQuery {
    pub date: NaiveDate,
    pub package: ServicePackage,
}

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    #[serde(default)]
    pub vehicle_id: Option<Uuid>,
    pub service: ServicePackage,
    pub scheduled_at: DateTime<Utc>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl From<CreateBookingRequest> for BookingRequest {
    fn from(request: CreateBookingRequest) -> Self {
        BookingRequest {
            vehicle_id: request.vehicle_id.map(VehicleId),
            service: request.service,
            scheduled_at: request.scheduled_at,
            notes: request.notes,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListBookingsQuery {
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

fn default_limit() -> u64 {
    20
}

#[derive(Debug, Deserialize)]
pub struct RescheduleRequest {
    pub scheduled_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct DayQuery {
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: BookingStatus,
}

/// GET /api/slots?date=YYYY-MM-DD&package=basic_wash
///
/// Public: open slots for a package on a business-local day.
pub async fn available_slots(
    State(state): State<AppState>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<Vec<TimeSlot>>, AppError> {
    let slots = state
        .booking_service
        .available_slots(query.date, query.package)
        .await?;
    Ok(Json(slots))
}

/// POST /api/bookings
pub async fn create_booking(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let booking = state
        .booking_service
        .create_booking(&user, request.into())
        .await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// GET /api/bookings
pub async fn list_bookings(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<ListBookingsQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let bookings = state
        .booking_service
        .list_for_customer(&user.id, query.limit, query.offset)
        .await?;
    Ok(Json(bookings))
}

/// GET /api/bookings/:id
pub async fn get_booking(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.booking_service.get(&user, &BookingId(id)).await?))
}

/// POST /api/bookings/:id/cancel
pub async fn cancel_booking(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(
        state.booking_service.cancel(&user, &BookingId(id)).await?,
    ))
}

/// POST /api/bookings/:id/reschedule
pub async fn reschedule_booking(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(request): Json<RescheduleRequest>,
) -> Result<Json<Booking>, AppError> {
    let booking = state
        .booking_service
        .reschedule(&user, &BookingId(id), request.scheduled_at)
        .await?;
    Ok(Json(booking))
}

/// GET /api/admin/bookings?date=YYYY-MM-DD
pub async fn list_day(
    State(state): State<AppState>,
    Query(query): Query<DayQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    Ok(Json(state.booking_service.list_for_day(query.date).await?))
}

/// PATCH /api/admin/bookings/:id/status
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<StatusRequest>,
) -> Result<Json<Booking>, AppError> {
    let booking = state
        .booking_service
        .transition(&BookingId(id), request.status)
        .await?;
    Ok(Json(booking))
}
