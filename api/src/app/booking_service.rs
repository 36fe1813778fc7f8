//! Booking service
//!
//! Slot availability, booking lifecycle and appointment reminders.
//! Confirmation, cancellation and completion messages are not sent here:
//! they follow from the change feed (see `realtime_consumers`).

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Serialize;

use super::notification_service::Notifier;
use super::templates;
use crate::config::BusinessHours;
use crate::domain::entities::{
    Booking, BookingId, BookingStatus, NewBooking, ServicePackage, User, UserId, VehicleId,
};
use crate::domain::ports::{BookingRepository, VehicleRepository};
use crate::error::{AppError, DomainError};

/// Longest package duration; bookings starting this long before a window
/// can still overlap it
const LONGEST_SERVICE_MINUTES: i64 = 240;

const MAX_NOTES_LEN: usize = 1000;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSlot {
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

/// Booking request from a customer
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub vehicle_id: Option<VehicleId>,
    pub service: ServicePackage,
    pub scheduled_at: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Service for managing bookings
pub struct BookingService<BR, VR, N>
where
    BR: BookingRepository,
    VR: VehicleRepository,
    N: Notifier,
{
    bookings: Arc<BR>,
    vehicles: Arc<VR>,
    notifier: Arc<N>,
    hours: BusinessHours,
    reminder_lead_hours: i64,
}

impl<BR, VR, N> BookingService<BR, VR, N>
where
    BR: BookingRepository,
    VR: VehicleRepository,
    N: Notifier,
{
    pub fn new(
        bookings: Arc<BR>,
        vehicles: Arc<VR>,
        notifier: Arc<N>,
        hours: BusinessHours,
        reminder_lead_hours: i64,
    ) -> Self {
        Self {
            bookings,
            vehicles,
            notifier,
            hours,
            reminder_lead_hours,
        }
    }

    /// Convert a shop-local wall clock time on `date` to UTC
    fn local_to_utc(&self, date: NaiveDate, minutes_from_midnight: i64) -> DateTime<Utc> {
        let midnight = date.and_time(NaiveTime::MIN);
        let local = midnight + Duration::minutes(minutes_from_midnight);
        Utc.from_utc_datetime(&(local - Duration::minutes(i64::from(self.hours.utc_offset_minutes))))
    }

    /// Opening and closing instants of the shop on `date`
    fn business_window(&self, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
        (
            self.local_to_utc(date, i64::from(self.hours.open_hour) * 60),
            self.local_to_utc(date, i64::from(self.hours.close_hour) * 60),
        )
    }

    /// Shop-local calendar date of an instant
    fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        (at + Duration::minutes(i64::from(self.hours.utc_offset_minutes))).date_naive()
    }

    /// Bookings holding a bay anywhere in `[start, end)`
    async fn occupying(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Booking>, AppError> {
        let candidates = self
            .bookings
            .list_between(start - Duration::minutes(LONGEST_SERVICE_MINUTES), end)
            .await?;
        Ok(candidates
            .into_iter()
            .filter(|b| b.status.occupies_bay() && b.overlaps(start, end))
            .collect())
    }

    /// Free slots for `package` on `date`, evaluated at `now`
    pub async fn available_slots_at(
        &self,
        date: NaiveDate,
        package: ServicePackage,
        now: DateTime<Utc>,
    ) -> Result<Vec<TimeSlot>, AppError> {
        let (open, close) = self.business_window(date);
        let booked = self.occupying(open, close).await?;
        let duration = Duration::minutes(package.duration_minutes());
        let step = Duration::minutes(i64::from(self.hours.slot_minutes));

        let mut slots = Vec::new();
        let mut start = open;
        while start + duration <= close {
            let end = start + duration;
            if start > now {
                let overlapping = booked.iter().filter(|b| b.overlaps(start, end)).count();
                if overlapping < self.hours.bays {
                    slots.push(TimeSlot {
                        starts_at: start,
                        ends_at: end,
                    });
                }
            }
            start += step;
        }

        Ok(slots)
    }

    pub async fn available_slots(
        &self,
        date: NaiveDate,
        package: ServicePackage,
    ) -> Result<Vec<TimeSlot>, AppError> {
        self.available_slots_at(date, package, Utc::now()).await
    }

    /// Fails with a conflict unless `[start, start + duration)` is inside
    /// business hours and has a free bay. `exclude` is ignored when counting.
    async fn ensure_available(
        &self,
        start: DateTime<Utc>,
        package: ServicePackage,
        exclude: Option<BookingId>,
    ) -> Result<(), AppError> {
        let end = start + Duration::minutes(package.duration_minutes());
        let (open, close) = self.business_window(self.local_date(start));
        if start < open || end > close {
            return Err(DomainError::Conflict(
                "Requested time is outside business hours".to_string(),
            )
            .into());
        }

        let overlapping = self
            .occupying(start, end)
            .await?
            .into_iter()
            .filter(|b| Some(b.id) != exclude)
            .count();
        if overlapping >= self.hours.bays {
            return Err(DomainError::Conflict("No bay available at that time".to_string()).into());
        }
        Ok(())
    }

    pub async fn create_booking_at(
        &self,
        customer: &User,
        request: BookingRequest,
        now: DateTime<Utc>,
    ) -> Result<Booking, AppError> {
        if request.scheduled_at <= now {
            return Err(AppError::BadRequest(
                "Bookings must start in the future".to_string(),
            ));
        }
        if request
            .notes
            .as_ref()
            .is_some_and(|n| n.len() > MAX_NOTES_LEN)
        {
            return Err(AppError::BadRequest(format!(
                "Notes are limited to {} characters",
                MAX_NOTES_LEN
            )));
        }

        if let Some(vehicle_id) = &request.vehicle_id {
            let vehicle = self
                .vehicles
                .find_by_id(vehicle_id)
                .await?
                .filter(|v| v.owner_id == customer.id)
                .ok_or_else(|| AppError::NotFound(format!("Vehicle {}", vehicle_id)))?;
            tracing::debug!(vehicle = %vehicle.label(), "Booking for vehicle");
        }

        self.ensure_available(request.scheduled_at, request.service, None)
            .await?;

        let booking = self
            .bookings
            .create(&NewBooking {
                customer_id: customer.id,
                vehicle_id: request.vehicle_id,
                service: request.service,
                scheduled_at: request.scheduled_at,
                notes: request.notes,
                total_cents: request.service.base_price_cents(),
            })
            .await?;

        tracing::info!(
            booking_id = %booking.id,
            customer_id = %customer.id,
            service = %booking.service,
            "Booking created"
        );
        Ok(booking)
    }

    pub async fn create_booking(
        &self,
        customer: &User,
        request: BookingRequest,
    ) -> Result<Booking, AppError> {
        self.create_booking_at(customer, request, Utc::now()).await
    }

    /// A booking visible to `user`: their own, or any for admins
    pub async fn get(&self, user: &User, id: &BookingId) -> Result<Booking, AppError> {
        self.bookings
            .find_by_id(id)
            .await?
            .filter(|b| user.is_admin() || b.customer_id == user.id)
            .ok_or_else(|| AppError::NotFound(format!("Booking {}", id)))
    }

    pub async fn list_for_customer(
        &self,
        customer_id: &UserId,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Booking>, AppError> {
        Ok(self
            .bookings
            .list_for_customer(customer_id, limit.clamp(1, 100), offset)
            .await?)
    }

    /// Every booking starting on the shop-local `date`
    pub async fn list_for_day(&self, date: NaiveDate) -> Result<Vec<Booking>, AppError> {
        let start = self.local_to_utc(date, 0);
        Ok(self
            .bookings
            .list_between(start, start + Duration::days(1))
            .await?)
    }

    /// Move a booking along its lifecycle (admin)
    pub async fn transition(
        &self,
        id: &BookingId,
        next: BookingStatus,
    ) -> Result<Booking, AppError> {
        let booking = self
            .bookings
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Booking {}", id)))?;

        if !booking.status.can_transition_to(next) {
            return Err(DomainError::Conflict(format!(
                "Cannot move booking from {} to {}",
                booking.status, next
            ))
            .into());
        }

        let updated = self.bookings.update_status(id, next).await?;
        tracing::info!(booking_id = %id, from = %booking.status, to = %next, "Booking status changed");
        Ok(updated)
    }

    pub async fn cancel(&self, user: &User, id: &BookingId) -> Result<Booking, AppError> {
        self.get(user, id).await?;
        self.transition(id, BookingStatus::Cancelled).await
    }

    pub async fn reschedule_at(
        &self,
        user: &User,
        id: &BookingId,
        scheduled_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Booking, AppError> {
        let booking = self.get(user, id).await?;

        if !matches!(
            booking.status,
            BookingStatus::Pending | BookingStatus::Confirmed
        ) {
            return Err(DomainError::Conflict(format!(
                "A {} booking cannot be rescheduled",
                booking.status
            ))
            .into());
        }
        if scheduled_at <= now {
            return Err(AppError::BadRequest(
                "Bookings must start in the future".to_string(),
            ));
        }
        if scheduled_at == booking.scheduled_at {
            return Ok(booking);
        }

        self.ensure_available(scheduled_at, booking.service, Some(booking.id))
            .await?;

        Ok(self.bookings.reschedule(id, scheduled_at).await?)
    }

    pub async fn reschedule(
        &self,
        user: &User,
        id: &BookingId,
        scheduled_at: DateTime<Utc>,
    ) -> Result<Booking, AppError> {
        self.reschedule_at(user, id, scheduled_at, Utc::now()).await
    }

    /// Remind customers of confirmed bookings starting within the lead time.
    ///
    /// Returns how many reminders were stored. A booking whose reminder could
    /// not be stored is retried on the next run. A failed stamp is logged and
    /// does not stop the sweep.
    pub async fn send_due_reminders(&self, now: DateTime<Utc>) -> Result<usize, AppError> {
        let due = self
            .bookings
            .find_due_reminders(now, now + Duration::hours(self.reminder_lead_hours))
            .await?;

        let mut sent = 0;
        for booking in due {
            let request = templates::booking_reminder(&booking, self.hours.utc_offset_minutes);
            match self.notifier.dispatch(request).await {
                Ok(_) => {
                    sent += 1;
                    if let Err(e) = self.bookings.mark_reminder_sent(&booking.id, now).await {
                        tracing::warn!(
                            booking_id = %booking.id,
                            error = %e,
                            "Reminder sent but not recorded"
                        );
                    }
                }
                Err(e) => {
                    tracing::warn!(booking_id = %booking.id, error = %e, "Failed to send reminder");
                }
            }
        }

        if sent > 0 {
            tracing::info!(count = sent, "Booking reminders sent");
        }
        Ok(sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::NotificationType;
    use crate::test_utils::{
        test_admin, test_booking_at, test_customer, test_vehicle, InMemoryBookingRepository,
        InMemoryVehicleRepository, RecordingNotifier,
    };

    type Service =
        BookingService<InMemoryBookingRepository, InMemoryVehicleRepository, RecordingNotifier>;

    fn hours() -> BusinessHours {
        BusinessHours {
            open_hour: 8,
            close_hour: 18,
            slot_minutes: 60,
            bays: 1,
            utc_offset_minutes: 0,
        }
    }

    fn create_service(
        bookings: InMemoryBookingRepository,
        vehicles: InMemoryVehicleRepository,
    ) -> (Service, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::new());
        let service = BookingService::new(
            Arc::new(bookings),
            Arc::new(vehicles),
            notifier.clone(),
            hours(),
            24,
        );
        (service, notifier)
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 10).unwrap()
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.from_utc_datetime(&date().and_hms_opt(hour, 0, 0).unwrap())
    }

    fn day_before() -> DateTime<Utc> {
        at(9) - Duration::days(1)
    }

    fn request(service: ServicePackage, hour: u32) -> BookingRequest {
        BookingRequest {
            vehicle_id: None,
            service,
            scheduled_at: at(hour),
            notes: None,
        }
    }

    #[tokio::test]
    async fn slots_cover_the_business_day() {
        let (service, _) =
            create_service(InMemoryBookingRepository::new(), InMemoryVehicleRepository::new());

        let slots = service
            .available_slots_at(date(), ServicePackage::FullDetail, day_before())
            .await
            .unwrap();

        // 3h package: 8..15 inclusive
        assert_eq!(slots.len(), 8);
        assert_eq!(slots[0].starts_at, at(8));
        assert_eq!(slots.last().unwrap().ends_at, at(18));
    }

    #[tokio::test]
    async fn slots_skip_full_and_past_times() {
        let customer = test_customer();
        let booked = test_booking_at(customer.id, ServicePackage::InteriorDetail, at(10));
        let (service, _) = create_service(
            InMemoryBookingRepository::new().with_booking(booked),
            InMemoryVehicleRepository::new(),
        );

        let slots = service
            .available_slots_at(date(), ServicePackage::BasicWash, at(8))
            .await
            .unwrap();
        let starts: Vec<_> = slots.iter().map(|s| s.starts_at).collect();

        // 8:00 is not in the future; 10:00 and 11:00 are taken
        assert!(!starts.contains(&at(8)));
        assert!(starts.contains(&at(9)));
        assert!(!starts.contains(&at(10)));
        assert!(!starts.contains(&at(11)));
        assert!(starts.contains(&at(12)));
    }

    #[tokio::test]
    async fn cancelled_bookings_free_their_bay() {
        let customer = test_customer();
        let mut booked = test_booking_at(customer.id, ServicePackage::BasicWash, at(10));
        booked.status = BookingStatus::Cancelled;
        let (service, _) = create_service(
            InMemoryBookingRepository::new().with_booking(booked),
            InMemoryVehicleRepository::new(),
        );

        let slots = service
            .available_slots_at(date(), ServicePackage::BasicWash, day_before())
            .await
            .unwrap();
        assert!(slots.iter().any(|s| s.starts_at == at(10)));
    }

    #[tokio::test]
    async fn business_offset_shifts_slots() {
        let (mut service, _) =
            create_service(InMemoryBookingRepository::new(), InMemoryVehicleRepository::new());
        service.hours.utc_offset_minutes = -5 * 60;

        let slots = service
            .available_slots_at(date(), ServicePackage::BasicWash, day_before())
            .await
            .unwrap();
        // 08:00 at UTC-5 is 13:00 UTC
        assert_eq!(slots[0].starts_at, at(13));
    }

    #[tokio::test]
    async fn create_booking_prices_and_stores() {
        let customer = test_customer();
        let (service, _) =
            create_service(InMemoryBookingRepository::new(), InMemoryVehicleRepository::new());

        let booking = service
            .create_booking_at(&customer, request(ServicePackage::CeramicCoating, 9), day_before())
            .await
            .unwrap();

        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.total_cents, 65_000);
        assert_eq!(booking.customer_id, customer.id);
    }

    #[tokio::test]
    async fn create_booking_conflicts_when_full() {
        let customer = test_customer();
        let (service, _) =
            create_service(InMemoryBookingRepository::new(), InMemoryVehicleRepository::new());

        service
            .create_booking_at(&customer, request(ServicePackage::FullDetail, 9), day_before())
            .await
            .unwrap();
        let err = service
            .create_booking_at(&customer, request(ServicePackage::BasicWash, 11), day_before())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Domain(DomainError::Conflict(_))));
    }

    #[tokio::test]
    async fn create_booking_validates_time_and_vehicle() {
        let customer = test_customer();
        let stranger = test_customer();
        let vehicle = test_vehicle(stranger.id);
        let (service, _) = create_service(
            InMemoryBookingRepository::new(),
            InMemoryVehicleRepository::new().with_vehicle(vehicle.clone()),
        );

        // In the past
        let err = service
            .create_booking_at(&customer, request(ServicePackage::BasicWash, 9), at(12))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        // After closing
        let err = service
            .create_booking_at(&customer, request(ServicePackage::FullDetail, 16), day_before())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Domain(DomainError::Conflict(_))));

        // Someone else's vehicle
        let mut req = request(ServicePackage::BasicWash, 9);
        req.vehicle_id = Some(vehicle.id);
        let err = service
            .create_booking_at(&customer, req, day_before())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn transitions_follow_the_lifecycle() {
        let customer = test_customer();
        let booking = test_booking_at(customer.id, ServicePackage::BasicWash, at(9));
        let (service, _) = create_service(
            InMemoryBookingRepository::new().with_booking(booking.clone()),
            InMemoryVehicleRepository::new(),
        );

        let err = service
            .transition(&booking.id, BookingStatus::Completed)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Domain(DomainError::Conflict(_))));

        for next in [
            BookingStatus::Confirmed,
            BookingStatus::InProgress,
            BookingStatus::Completed,
        ] {
            let updated = service.transition(&booking.id, next).await.unwrap();
            assert_eq!(updated.status, next);
        }

        let err = service.cancel(&customer, &booking.id).await.unwrap_err();
        assert!(matches!(err, AppError::Domain(DomainError::Conflict(_))));
    }

    #[tokio::test]
    async fn only_owner_or_admin_can_cancel() {
        let owner = test_customer();
        let other = test_customer();
        let booking = test_booking_at(owner.id, ServicePackage::BasicWash, at(9));
        let (service, _) = create_service(
            InMemoryBookingRepository::new().with_booking(booking.clone()),
            InMemoryVehicleRepository::new(),
        );

        assert!(matches!(
            service.cancel(&other, &booking.id).await,
            Err(AppError::NotFound(_))
        ));
        let cancelled = service.cancel(&test_admin(), &booking.id).await.unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
    }

    #[tokio::test]
    async fn reschedule_ignores_its_own_slot() {
        let customer = test_customer();
        let (service, _) =
            create_service(InMemoryBookingRepository::new(), InMemoryVehicleRepository::new());
        let booking = service
            .create_booking_at(&customer, request(ServicePackage::InteriorDetail, 9), day_before())
            .await
            .unwrap();

        // Overlaps its current 9-11 slot only
        let moved = service
            .reschedule_at(&customer, &booking.id, at(10), day_before())
            .await
            .unwrap();
        assert_eq!(moved.scheduled_at, at(10));
        assert!(moved.reminder_sent_at.is_none());
    }

    #[tokio::test]
    async fn reschedule_rejects_finished_bookings() {
        let customer = test_customer();
        let mut booking = test_booking_at(customer.id, ServicePackage::BasicWash, at(9));
        booking.status = BookingStatus::Completed;
        let (service, _) = create_service(
            InMemoryBookingRepository::new().with_booking(booking.clone()),
            InMemoryVehicleRepository::new(),
        );

        let err = service
            .reschedule_at(&customer, &booking.id, at(12), day_before())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Domain(DomainError::Conflict(_))));
    }

    #[tokio::test]
    async fn list_for_day_uses_local_date() {
        let customer = test_customer();
        let bookings = InMemoryBookingRepository::new()
            .with_booking(test_booking_at(customer.id, ServicePackage::BasicWash, at(9)))
            .with_booking(test_booking_at(
                customer.id,
                ServicePackage::BasicWash,
                at(9) + Duration::days(1),
            ));
        let (service, _) = create_service(bookings, InMemoryVehicleRepository::new());

        assert_eq!(service.list_for_day(date()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn reminders_are_sent_once() {
        let customer = test_customer();
        let mut soon = test_booking_at(customer.id, ServicePackage::BasicWash, at(15));
        soon.status = BookingStatus::Confirmed;
        let mut pending = test_booking_at(customer.id, ServicePackage::BasicWash, at(16));
        pending.status = BookingStatus::Pending;
        let mut later = test_booking_at(
            customer.id,
            ServicePackage::BasicWash,
            at(15) + Duration::days(3),
        );
        later.status = BookingStatus::Confirmed;

        let (service, notifier) = create_service(
            InMemoryBookingRepository::new()
                .with_booking(soon.clone())
                .with_booking(pending)
                .with_booking(later),
            InMemoryVehicleRepository::new(),
        );

        assert_eq!(service.send_due_reminders(at(9)).await.unwrap(), 1);
        assert_eq!(service.send_due_reminders(at(10)).await.unwrap(), 0);

        let sent = notifier.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].notification_type, NotificationType::BookingReminder);
        assert_eq!(sent[0].reference_id, Some(soon.id.0));
    }

    #[tokio::test]
    async fn failed_reminders_are_retried() {
        let customer = test_customer();
        let mut soon = test_booking_at(customer.id, ServicePackage::BasicWash, at(15));
        soon.status = BookingStatus::Confirmed;

        let notifier = Arc::new(RecordingNotifier::failing());
        let service = BookingService::new(
            Arc::new(InMemoryBookingRepository::new().with_booking(soon)),
            Arc::new(InMemoryVehicleRepository::new()),
            notifier.clone(),
            hours(),
            24,
        );

        assert_eq!(service.send_due_reminders(at(9)).await.unwrap(), 0);
        notifier.set_failing(false);
        assert_eq!(service.send_due_reminders(at(9)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn stamp_failure_does_not_stop_the_sweep() {
        let customer = test_customer();
        let mut first = test_booking_at(customer.id, ServicePackage::BasicWash, at(14));
        first.status = BookingStatus::Confirmed;
        let mut second = test_booking_at(customer.id, ServicePackage::BasicWash, at(15));
        second.status = BookingStatus::Confirmed;

        let (service, notifier) = create_service(
            InMemoryBookingRepository::new()
                .with_booking(first.clone())
                .with_booking(second.clone())
                .failing_reminder_stamp(first.id),
            InMemoryVehicleRepository::new(),
        );

        assert_eq!(service.send_due_reminders(at(9)).await.unwrap(), 2);
        let reminded: Vec<_> = notifier
            .requests()
            .iter()
            .map(|r| r.reference_id)
            .collect();
        assert_eq!(reminded, vec![Some(first.id.0), Some(second.id.0)]);

        // Only the unstamped booking comes up again
        assert_eq!(service.send_due_reminders(at(10)).await.unwrap(), 1);
        assert_eq!(notifier.requests().len(), 3);
        assert_eq!(notifier.requests()[2].reference_id, Some(first.id.0));
    }
}
