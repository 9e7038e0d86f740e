//! Bookings service.
//!
//! Submission and cancellation each run as one store transaction: every
//! document the outcome depends on is read inside it, all writes are buffered
//! behind those reads, and commit applies them together or not at all.

use std::{future::Future, num::NonZeroU32, sync::Arc};

use async_trait::async_trait;
use jiff::{Timestamp, civil::Date};
use mockall::automock;
use tracing::{debug, info, instrument, warn};

use crate::{
    domain::{
        bookings::{
            errors::BookingsServiceError,
            models::{Booking, BookingHistoryFilter, BookingId, BookingStatus, NewBooking},
            repository::BookingsRepository,
            stats::BookingStats,
        },
        carts::{
            CartItemsRepository,
            models::{CartItemId, CartItemStatus},
        },
        catalog::{
            CoursesRepository, SchedulesRepository,
            models::{Course, RosterEntry, ScheduleInstance, compute_availability},
        },
    },
    ids::UserId,
    store::{Collection, DocumentStore, StoreError},
};

/// Tunables of the booking transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingSettings {
    /// Attempts per transaction when commits keep hitting contention.
    pub max_attempts: NonZeroU32,
    /// Re-check seats inside the submit transaction.
    pub enforce_capacity: bool,
}

impl Default for BookingSettings {
    fn default() -> Self {
        Self {
            max_attempts: NonZeroU32::MIN.saturating_add(4),
            enforce_capacity: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoreBookingsService {
    store: Arc<dyn DocumentStore>,
    settings: BookingSettings,
    bookings_repository: BookingsRepository,
    items_repository: CartItemsRepository,
    courses_repository: CoursesRepository,
    schedules_repository: SchedulesRepository,
}

impl StoreBookingsService {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_settings(store, BookingSettings::default())
    }

    #[must_use]
    pub fn with_settings(store: Arc<dyn DocumentStore>, settings: BookingSettings) -> Self {
        Self {
            store,
            settings,
            bookings_repository: BookingsRepository::new(),
            items_repository: CartItemsRepository::new(),
            courses_repository: CoursesRepository::new(),
            schedules_repository: SchedulesRepository::new(),
        }
    }

    /// Run `attempt` until it succeeds, fails for a reason other than
    /// contention, or the attempt budget is spent.
    async fn retrying<T, F, Fut>(&self, mut attempt: F) -> Result<T, BookingsServiceError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, BookingsServiceError>>,
    {
        let max_attempts = self.settings.max_attempts.get();
        let mut attempts = 1;

        loop {
            match attempt().await {
                Err(error) if error.is_contention() && attempts < max_attempts => {
                    warn!(attempts, max_attempts, "transaction contended, retrying: {error:?}");
                    attempts += 1;
                }
                result => return result,
            }
        }
    }

    async fn try_submit(
        &self,
        booking: &NewBooking,
        now: Timestamp,
    ) -> Result<Booking, BookingsServiceError> {
        let mut tx = self.store.begin().await?;

        let mut schedules: Vec<ScheduleInstance> = Vec::new();
        let mut courses: Vec<Course> = Vec::new();
        let mut cart_items: Vec<CartItemId> = Vec::new();

        for line in &booking.lines {
            let schedule_id = &line.details.instance_id;

            if !schedules.iter().any(|schedule| &schedule.id == schedule_id) {
                let schedule = self
                    .schedules_repository
                    .get_schedule_in(tx.as_mut(), schedule_id)
                    .await?
                    .ok_or_else(|| BookingsServiceError::ReferentialIntegrity {
                        collection: Collection::Schedules,
                        id: schedule_id.to_string(),
                    })?;

                schedules.push(schedule);
            }

            let course_id = &line.details.course_id;

            if !courses.iter().any(|course| &course.id == course_id) {
                let course = self
                    .courses_repository
                    .get_course_in(tx.as_mut(), course_id)
                    .await?
                    .ok_or_else(|| BookingsServiceError::ReferentialIntegrity {
                        collection: Collection::Courses,
                        id: course_id.to_string(),
                    })?;

                courses.push(course);
            }

            let Some(item_id) = &line.cart_item else {
                continue;
            };

            if cart_items.contains(item_id) {
                continue;
            }

            let item = self
                .items_repository
                .get_item_in(tx.as_mut(), item_id)
                .await?
                .ok_or_else(|| BookingsServiceError::ReferentialIntegrity {
                    collection: Collection::Cart,
                    id: item_id.to_string(),
                })?;

            if item.status != CartItemStatus::Pending {
                return Err(BookingsServiceError::InvalidState(format!(
                    "cart item {item_id} is already {}",
                    item.status.name()
                )));
            }

            cart_items.push(item.id);
        }

        if self.settings.enforce_capacity {
            for schedule in &schedules {
                let lines: Vec<_> = booking
                    .lines
                    .iter()
                    .filter(|line| line.details.instance_id == schedule.id)
                    .collect();

                let Some(course) = lines.first().and_then(|line| {
                    courses.iter().find(|course| course.id == line.details.course_id)
                }) else {
                    continue;
                };

                let requested = lines
                    .iter()
                    .fold(0_u32, |total, line| total.saturating_add(line.quantity));

                let available = compute_availability(schedule, course).available_spots;

                if requested > available {
                    return Err(BookingsServiceError::CapacityExceeded {
                        schedule: schedule.id.clone(),
                        requested,
                        available,
                    });
                }
            }
        }

        let booking_id = BookingId::new(tx.allocate_id(Collection::Bookings));
        let record = booking.to_booking(booking_id.clone(), now);

        for schedule in &schedules {
            let mut roster = schedule.roster.clone();

            roster.extend(
                booking
                    .lines
                    .iter()
                    .filter(|line| line.details.instance_id == schedule.id)
                    .map(|line| RosterEntry {
                        booking_id: booking_id.clone(),
                        user_id: booking.user_id.clone(),
                        user_email: booking.user_email.clone(),
                        booked_at: now,
                        quantity: line.quantity,
                    }),
            );

            self.schedules_repository
                .write_roster(tx.as_mut(), &schedule.id, &roster, now)?;
        }

        for item in &cart_items {
            self.items_repository
                .mark_booked(tx.as_mut(), item, &booking_id, now);
        }

        self.bookings_repository.create_in(tx.as_mut(), &record)?;

        tx.commit().await.map_err(|error| match error {
            StoreError::NotFound { collection, id } => {
                BookingsServiceError::ReferentialIntegrity { collection, id }
            }
            other => other.into(),
        })?;

        Ok(record)
    }

    async fn try_cancel(
        &self,
        booking_id: &BookingId,
        user: &UserId,
        now: Timestamp,
    ) -> Result<Booking, BookingsServiceError> {
        let mut tx = self.store.begin().await?;

        let mut booking = self
            .bookings_repository
            .get_booking_in(tx.as_mut(), booking_id)
            .await?
            .ok_or(BookingsServiceError::NotFound)?;

        if booking.user_id != *user {
            return Err(BookingsServiceError::Unauthorized);
        }

        if booking.status == BookingStatus::Cancelled {
            return Err(BookingsServiceError::InvalidState(
                "booking is already cancelled".to_string(),
            ));
        }

        let mut schedules: Vec<ScheduleInstance> = Vec::new();

        for item in &booking.items {
            let schedule_id = &item.details.instance_id;

            if schedules.iter().any(|schedule| &schedule.id == schedule_id) {
                continue;
            }

            // A schedule removed since booking has no roster left to clean.
            if let Some(schedule) = self
                .schedules_repository
                .get_schedule_in(tx.as_mut(), schedule_id)
                .await?
            {
                schedules.push(schedule);
            }
        }

        self.bookings_repository
            .mark_cancelled_in(tx.as_mut(), booking_id, now);

        for schedule in &schedules {
            let roster: Vec<RosterEntry> = schedule
                .roster
                .iter()
                .filter(|entry| entry.booking_id != *booking_id)
                .cloned()
                .collect();

            self.schedules_repository
                .write_roster(tx.as_mut(), &schedule.id, &roster, now)?;
        }

        tx.commit().await?;

        booking.status = BookingStatus::Cancelled;
        booking.cancelled_at = Some(now);
        booking.updated_at = now;

        Ok(booking)
    }
}

#[async_trait]
impl BookingsService for StoreBookingsService {
    #[instrument(skip(self, booking), fields(user = %booking.user_id, lines = booking.lines.len()))]
    async fn submit_booking(
        &self,
        booking: NewBooking,
        now: Timestamp,
    ) -> Result<Booking, BookingsServiceError> {
        booking.validate().map_err(BookingsServiceError::Validation)?;

        let record = self.retrying(|| self.try_submit(&booking, now)).await?;

        info!(
            booking = %record.id,
            total_quantity = record.summary.total_quantity,
            "booking submitted"
        );

        Ok(record)
    }

    #[instrument(skip(self), fields(booking = %booking, user = %user))]
    async fn cancel_booking(
        &self,
        booking: &BookingId,
        user: &UserId,
        now: Timestamp,
    ) -> Result<Booking, BookingsServiceError> {
        let cancelled = self.retrying(|| self.try_cancel(booking, user, now)).await?;

        info!("booking cancelled");

        Ok(cancelled)
    }

    #[instrument(skip(self), fields(booking = %booking))]
    async fn get_booking(&self, booking: &BookingId) -> Result<Booking, BookingsServiceError> {
        self.bookings_repository
            .get_booking(self.store.as_ref(), booking)
            .await?
            .ok_or(BookingsServiceError::NotFound)
    }

    async fn list_bookings(&self, user: &UserId) -> Result<Vec<Booking>, BookingsServiceError> {
        let bookings = self
            .bookings_repository
            .list_for_user(self.store.as_ref(), user)
            .await?;

        debug!(count = bookings.len(), "listed bookings");

        Ok(bookings)
    }

    async fn get_booking_history(
        &self,
        user: &UserId,
        filter: BookingHistoryFilter,
    ) -> Result<Vec<Booking>, BookingsServiceError> {
        let mut bookings = self.list_bookings(user).await?;

        bookings.retain(|booking| filter.admits(booking));

        Ok(bookings)
    }

    async fn get_booking_stats(
        &self,
        user: &UserId,
        today: Date,
    ) -> Result<BookingStats, BookingsServiceError> {
        let bookings = self.list_bookings(user).await?;

        Ok(BookingStats::from_bookings(&bookings, today))
    }
}

#[automock]
#[async_trait]
pub trait BookingsService: Send + Sync {
    /// Turn booking lines into a confirmed booking in one transaction.
    ///
    /// The booking document is created, each originating cart row is flipped
    /// to booked, and a roster entry per line is appended to its schedule.
    async fn submit_booking(
        &self,
        booking: NewBooking,
        now: Timestamp,
    ) -> Result<Booking, BookingsServiceError>;

    /// Cancel a confirmed booking of `user` and drop its roster entries.
    async fn cancel_booking(
        &self,
        booking: &BookingId,
        user: &UserId,
        now: Timestamp,
    ) -> Result<Booking, BookingsServiceError>;

    /// Retrieve a single booking.
    async fn get_booking(&self, booking: &BookingId) -> Result<Booking, BookingsServiceError>;

    /// Bookings of `user`, newest first.
    async fn list_bookings(&self, user: &UserId) -> Result<Vec<Booking>, BookingsServiceError>;

    async fn get_booking_history(
        &self,
        user: &UserId,
        filter: BookingHistoryFilter,
    ) -> Result<Vec<Booking>, BookingsServiceError>;

    async fn get_booking_stats(
        &self,
        user: &UserId,
        today: Date,
    ) -> Result<BookingStats, BookingsServiceError>;
}
