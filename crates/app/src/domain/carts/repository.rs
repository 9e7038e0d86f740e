//! Cart Items Repository

use std::cmp::Reverse;

use jiff::Timestamp;
use serde_json::json;

use crate::{
    domain::{
        bookings::models::BookingId,
        carts::models::{CartItem, CartItemId, CartItemStatus, NewCartItem},
    },
    ids::UserId,
    store::{Collection, DocumentStore, Fields, Query, Record, StoreError, Transaction, decode_valid},
};

#[derive(Debug, Clone, Default)]
pub(crate) struct CartItemsRepository;

impl CartItemsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_item(
        &self,
        store: &dyn DocumentStore,
        user: &UserId,
        item: NewCartItem,
        now: Timestamp,
    ) -> Result<CartItem, StoreError> {
        // The store assigns the id.
        let fields = item
            .into_cart_item(CartItemId::new(String::new()), user.clone(), now)
            .to_store()?;

        CartItem::from_store(store.add(Collection::Cart, fields).await?)
    }

    /// Read one row inside `tx`, so the commit fails if it changes meanwhile.
    pub(crate) async fn get_item_in(
        &self,
        tx: &mut dyn Transaction,
        item: &CartItemId,
    ) -> Result<Option<CartItem>, StoreError> {
        tx.get(Collection::Cart, item.as_str())
            .await?
            .map(CartItem::from_store)
            .transpose()
    }

    /// Pending rows of `user`, most recently added first.
    pub(crate) async fn list_pending(
        &self,
        store: &dyn DocumentStore,
        user: &UserId,
    ) -> Result<Vec<CartItem>, StoreError> {
        let query = Query::new()
            .eq("userId", user.as_str())
            .eq("status", CartItemStatus::Pending.name());

        let mut items: Vec<CartItem> = decode_valid(store.query(Collection::Cart, &query).await?);

        // RFC 3339 strings stop sorting chronologically once fractional seconds vary.
        items.sort_by_key(|item| Reverse(item.added_at));

        Ok(items)
    }

    pub(crate) async fn set_quantity(
        &self,
        store: &dyn DocumentStore,
        item: &CartItemId,
        quantity: u32,
        now: Timestamp,
    ) -> Result<(), StoreError> {
        let mut fields = Fields::new();
        fields.insert("quantity".to_string(), json!(quantity));
        fields.insert("updatedAt".to_string(), json!(now));

        store.update(Collection::Cart, item.as_str(), fields).await
    }

    pub(crate) async fn delete_item(
        &self,
        store: &dyn DocumentStore,
        item: &CartItemId,
    ) -> Result<bool, StoreError> {
        store.delete(Collection::Cart, item.as_str()).await
    }

    pub(crate) fn delete_items_in(&self, tx: &mut dyn Transaction, items: &[CartItem]) {
        for item in items {
            tx.delete(Collection::Cart, item.id.as_str());
        }
    }

    /// Buffer the pending to booked flip of one row in `tx`.
    pub(crate) fn mark_booked(
        &self,
        tx: &mut dyn Transaction,
        item: &CartItemId,
        booking: &BookingId,
        now: Timestamp,
    ) {
        let mut fields = Fields::new();
        fields.insert("status".to_string(), json!(CartItemStatus::Booked.name()));
        fields.insert("bookingId".to_string(), json!(booking.as_str()));
        fields.insert("bookedAt".to_string(), json!(now));
        fields.insert("updatedAt".to_string(), json!(now));

        tx.update(Collection::Cart, item.as_str(), fields);
    }
}
