//! Studio Façade

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    sync::Arc,
};

use jiff::{Timestamp, civil::Date};
use serde_json::Value;
use tracing::{instrument, warn};

use crate::{
    config::BookingConfig,
    domain::{
        bookings::{
            BookingsService,
            models::{
                Booking, BookingHistoryFilter, BookingId, BookingLine, NewBooking, UpcomingClass,
                upcoming_classes,
            },
            stats::BookingStats,
        },
        carts::{
            CartsService,
            models::{CartItem, CartItemId, CartSummary, CartView, NewCartItem},
        },
        catalog::{
            CatalogService,
            models::{
                Availability, Course, CourseFilter, CourseId, ScheduleId, ScheduleInstance,
                ScheduleWithCourse,
            },
        },
    },
    identity::Identity,
    notifications::{BookingConfirmation, ConfirmationSender},
};

use super::{
    envelope::{ApiResponse, respond},
    errors::{ApiError, ErrorKind},
    health::{self, HealthReport},
    settings::AppSettings,
    utc_date,
};

/// Typed entry point for presentation code.
///
/// Every call returns an [`ApiResponse`]; "today" is the UTC date of the
/// `now` handed in.
#[derive(Clone)]
pub struct StudioApi {
    catalog: Arc<dyn CatalogService>,
    carts: Arc<dyn CartsService>,
    bookings: Arc<dyn BookingsService>,
    confirmations: Arc<dyn ConfirmationSender>,
    config: BookingConfig,
}

impl Debug for StudioApi {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("StudioApi")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl StudioApi {
    #[must_use]
    pub fn new(
        catalog: Arc<dyn CatalogService>,
        carts: Arc<dyn CartsService>,
        bookings: Arc<dyn BookingsService>,
        confirmations: Arc<dyn ConfirmationSender>,
        config: BookingConfig,
    ) -> Self {
        Self {
            catalog,
            carts,
            bookings,
            confirmations,
            config,
        }
    }

    pub async fn list_courses(&self, filter: CourseFilter) -> ApiResponse<Vec<Course>> {
        respond("listCourses", self.catalog.list_courses(filter).await)
    }

    pub async fn get_course(&self, course: &CourseId) -> ApiResponse<Course> {
        respond("getCourse", self.catalog.get_course(course).await)
    }

    pub async fn get_schedule(&self, schedule: &ScheduleId) -> ApiResponse<ScheduleInstance> {
        respond("getSchedule", self.catalog.get_schedule(schedule).await)
    }

    pub async fn list_schedules_for_course(
        &self,
        course: &CourseId,
    ) -> ApiResponse<Vec<ScheduleInstance>> {
        respond(
            "listSchedulesForCourse",
            self.catalog.list_schedules_for_course(course).await,
        )
    }

    /// Instances still bookable at `now`.
    pub async fn list_available_schedules(
        &self,
        now: Timestamp,
    ) -> ApiResponse<Vec<ScheduleInstance>> {
        respond(
            "listAvailableSchedules",
            self.catalog.list_available_schedules(utc_date(now)).await,
        )
    }

    pub async fn search_schedules_by_teacher(
        &self,
        teacher: &str,
    ) -> ApiResponse<Vec<ScheduleInstance>> {
        respond(
            "searchSchedulesByTeacher",
            self.catalog.search_schedules_by_teacher(teacher).await,
        )
    }

    pub async fn list_schedules_with_courses(
        &self,
        from: Option<Date>,
        to: Option<Date>,
    ) -> ApiResponse<Vec<ScheduleWithCourse>> {
        respond(
            "listSchedulesWithCourses",
            self.catalog.list_schedules_with_courses(from, to).await,
        )
    }

    pub async fn check_availability(
        &self,
        course: &CourseId,
        schedule: &ScheduleId,
        now: Timestamp,
    ) -> ApiResponse<Availability> {
        respond(
            "checkAvailability",
            self.catalog
                .check_availability(course, schedule, utc_date(now))
                .await,
        )
    }

    /// Add a class to the caller's cart, checking seats first when configured.
    #[instrument(skip_all, fields(user = %identity.uid, schedule = %item.details.instance_id))]
    pub async fn add_to_cart(
        &self,
        identity: &Identity,
        item: NewCartItem,
        now: Timestamp,
    ) -> ApiResponse<CartItem> {
        if self.config.check_availability {
            if let Err(error) = self.ensure_seats(&item, now).await {
                return respond("addToCart", Err(error));
            }
        }

        respond(
            "addToCart",
            self.carts.add_to_cart(&identity.uid, item, now).await,
        )
    }

    async fn ensure_seats(&self, item: &NewCartItem, now: Timestamp) -> Result<(), ApiError> {
        let availability = self
            .catalog
            .check_availability(
                &item.details.course_id,
                &item.details.instance_id,
                utc_date(now),
            )
            .await?;

        if availability.available_spots < item.quantity() {
            return Err(ApiError::new(
                ErrorKind::CapacityExceeded,
                format!(
                    "Only {} spots available for this class.",
                    availability.available_spots
                ),
            ));
        }

        Ok(())
    }

    /// Pending rows of the caller together with their summary.
    pub async fn get_cart(&self, identity: &Identity, now: Timestamp) -> ApiResponse<CartView> {
        let result = self.carts.get_cart(&identity.uid).await.map(|items| {
            let summary = CartSummary::from_items(&items, utc_date(now));

            CartView { items, summary }
        });

        respond("getCart", result)
    }

    pub async fn update_cart_quantity(
        &self,
        item: &CartItemId,
        quantity: i64,
        now: Timestamp,
    ) -> ApiResponse<()> {
        respond(
            "updateCartQuantity",
            self.carts.update_quantity(item, quantity, now).await,
        )
    }

    pub async fn remove_from_cart(&self, item: &CartItemId) -> ApiResponse<()> {
        respond("removeFromCart", self.carts.remove_from_cart(item).await)
    }

    pub async fn clear_cart(&self, identity: &Identity) -> ApiResponse<usize> {
        respond("clearCart", self.carts.clear_cart(&identity.uid).await)
    }

    /// Book `lines` for the caller, then hand off a confirmation.
    ///
    /// A failed confirmation is logged and never fails the booking.
    #[instrument(skip_all, fields(user = %identity.uid, lines = lines.len()))]
    pub async fn submit_booking(
        &self,
        identity: &Identity,
        lines: Vec<BookingLine>,
        payment_details: Option<Value>,
        now: Timestamp,
    ) -> ApiResponse<Booking> {
        let booking = NewBooking {
            user_id: identity.uid.clone(),
            user_email: identity.email.clone(),
            lines,
            payment_details,
        };

        let result = self.bookings.submit_booking(booking, now).await;

        if self.config.send_confirmations {
            if let Ok(booking) = &result {
                self.confirm(booking).await;
            }
        }

        respond("submitBooking", result)
    }

    /// Book every pending row of the caller's cart.
    pub async fn checkout(
        &self,
        identity: &Identity,
        payment_details: Option<Value>,
        now: Timestamp,
    ) -> ApiResponse<Booking> {
        let items = match self.carts.get_cart(&identity.uid).await {
            Ok(items) => items,
            Err(error) => return respond("checkout", Err(error)),
        };

        let lines = items.into_iter().map(BookingLine::from).collect();

        self.submit_booking(identity, lines, payment_details, now)
            .await
    }

    async fn confirm(&self, booking: &Booking) {
        if let Err(error) = self
            .confirmations
            .send(BookingConfirmation::from(booking))
            .await
        {
            warn!(booking = %booking.id, "failed to send booking confirmation: {error}");
        }
    }

    /// Cancel one of the caller's bookings.
    #[instrument(skip_all, fields(user = %identity.uid, booking = %booking))]
    pub async fn cancel_booking(
        &self,
        identity: &Identity,
        booking: &BookingId,
        now: Timestamp,
    ) -> ApiResponse<Booking> {
        if self.config.check_cancellable {
            if let Err(error) = self.ensure_cancellable(identity, booking, now).await {
                return respond("cancelBooking", Err(error));
            }
        }

        respond(
            "cancelBooking",
            self.bookings
                .cancel_booking(booking, &identity.uid, now)
                .await,
        )
    }

    /// Ownership stays with the bookings service.
    async fn ensure_cancellable(
        &self,
        identity: &Identity,
        booking: &BookingId,
        now: Timestamp,
    ) -> Result<(), ApiError> {
        let booking = self.bookings.get_booking(booking).await?;

        if booking.user_id == identity.uid && !booking.is_cancellable(utc_date(now)) {
            return Err(ApiError::new(
                ErrorKind::InvalidState,
                "This booking cannot be cancelled",
            ));
        }

        Ok(())
    }

    pub async fn get_booking(&self, booking: &BookingId) -> ApiResponse<Booking> {
        respond("getBooking", self.bookings.get_booking(booking).await)
    }

    pub async fn list_bookings(&self, identity: &Identity) -> ApiResponse<Vec<Booking>> {
        respond("listBookings", self.bookings.list_bookings(&identity.uid).await)
    }

    pub async fn get_booking_history(
        &self,
        identity: &Identity,
        filter: BookingHistoryFilter,
    ) -> ApiResponse<Vec<Booking>> {
        respond(
            "getBookingHistory",
            self.bookings
                .get_booking_history(&identity.uid, filter)
                .await,
        )
    }

    pub async fn get_booking_stats(
        &self,
        identity: &Identity,
        now: Timestamp,
    ) -> ApiResponse<BookingStats> {
        respond(
            "getBookingStats",
            self.bookings
                .get_booking_stats(&identity.uid, utc_date(now))
                .await,
        )
    }

    /// Classes ahead of the caller across confirmed bookings, soonest first.
    pub async fn get_upcoming_classes(
        &self,
        identity: &Identity,
        now: Timestamp,
    ) -> ApiResponse<Vec<UpcomingClass>> {
        let result = self
            .bookings
            .list_bookings(&identity.uid)
            .await
            .map(|bookings| upcoming_classes(&bookings, utc_date(now)));

        respond("getUpcomingClasses", result)
    }

    #[must_use]
    pub fn app_settings(&self) -> AppSettings {
        AppSettings::default()
    }

    pub async fn health_check(&self, now: Timestamp) -> HealthReport {
        health::check(self.catalog.as_ref(), now).await
    }
}
