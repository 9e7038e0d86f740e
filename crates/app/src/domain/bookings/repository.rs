//! Bookings Repository

use std::cmp::Reverse;

use jiff::Timestamp;
use serde_json::json;

use crate::{
    domain::bookings::models::{Booking, BookingId, BookingStatus},
    ids::UserId,
    store::{Collection, DocumentStore, Fields, Query, Record, StoreError, Transaction, decode_valid},
};

#[derive(Debug, Clone, Default)]
pub(crate) struct BookingsRepository;

impl BookingsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn get_booking(
        &self,
        store: &dyn DocumentStore,
        booking: &BookingId,
    ) -> Result<Option<Booking>, StoreError> {
        store
            .get(Collection::Bookings, booking.as_str())
            .await?
            .map(Booking::from_store)
            .transpose()
    }

    pub(crate) async fn get_booking_in(
        &self,
        tx: &mut dyn Transaction,
        booking: &BookingId,
    ) -> Result<Option<Booking>, StoreError> {
        tx.get(Collection::Bookings, booking.as_str())
            .await?
            .map(Booking::from_store)
            .transpose()
    }

    /// Bookings of `user`, newest booking date first.
    pub(crate) async fn list_for_user(
        &self,
        store: &dyn DocumentStore,
        user: &UserId,
    ) -> Result<Vec<Booking>, StoreError> {
        let query = Query::new().eq("userId", user.as_str());

        let mut bookings: Vec<Booking> =
            decode_valid(store.query(Collection::Bookings, &query).await?);

        bookings.sort_by_key(|booking| Reverse(booking.booking_date));

        Ok(bookings)
    }

    pub(crate) fn create_in(
        &self,
        tx: &mut dyn Transaction,
        booking: &Booking,
    ) -> Result<(), StoreError> {
        tx.set(Collection::Bookings, booking.id.as_str(), booking.to_store()?);

        Ok(())
    }

    pub(crate) fn mark_cancelled_in(
        &self,
        tx: &mut dyn Transaction,
        booking: &BookingId,
        now: Timestamp,
    ) {
        let mut fields = Fields::new();
        fields.insert("status".to_string(), json!(BookingStatus::Cancelled.name()));
        fields.insert("cancelledAt".to_string(), json!(now));
        fields.insert("updatedAt".to_string(), json!(now));

        tx.update(Collection::Bookings, booking.as_str(), fields);
    }
}
