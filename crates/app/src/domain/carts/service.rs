//! Carts service.

use std::sync::Arc;

use async_trait::async_trait;
use jiff::{Timestamp, civil::Date};
use mockall::automock;
use tracing::{debug, instrument};

use crate::{
    domain::carts::{
        errors::CartsServiceError,
        models::{CartItem, CartItemId, CartItemStatus, CartSummary, NewCartItem},
        repository::CartItemsRepository,
    },
    ids::UserId,
    store::DocumentStore,
    validation::require,
};

#[derive(Debug, Clone)]
pub struct StoreCartsService {
    store: Arc<dyn DocumentStore>,
    items_repository: CartItemsRepository,
}

impl StoreCartsService {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            items_repository: CartItemsRepository::new(),
        }
    }
}

fn validate_new_item(user: &UserId, item: &NewCartItem) -> Result<(), CartsServiceError> {
    let mut violations = Vec::new();

    require(&mut violations, "userId", user.as_str());
    item.details.collect_violations(&mut violations);

    if item.quantity() == 0 {
        violations.push("quantity must be at least 1".to_string());
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(CartsServiceError::Validation(violations))
    }
}

#[async_trait]
impl CartsService for StoreCartsService {
    #[instrument(skip(self, item), fields(user = %user, schedule = %item.details.instance_id))]
    async fn add_to_cart(
        &self,
        user: &UserId,
        item: NewCartItem,
        now: Timestamp,
    ) -> Result<CartItem, CartsServiceError> {
        validate_new_item(user, &item)?;

        let item = self
            .items_repository
            .create_item(self.store.as_ref(), user, item, now)
            .await?;

        debug!(item = %item.id, "added cart item");

        Ok(item)
    }

    async fn get_cart(&self, user: &UserId) -> Result<Vec<CartItem>, CartsServiceError> {
        Ok(self
            .items_repository
            .list_pending(self.store.as_ref(), user)
            .await?)
    }

    #[instrument(skip(self), fields(item = %item))]
    async fn update_quantity(
        &self,
        item: &CartItemId,
        quantity: i64,
        now: Timestamp,
    ) -> Result<(), CartsServiceError> {
        if quantity <= 0 {
            return self.remove_from_cart(item).await;
        }

        let quantity = u32::try_from(quantity).map_err(|source| {
            CartsServiceError::Validation(vec![format!("quantity {quantity}: {source}")])
        })?;

        self.items_repository
            .set_quantity(self.store.as_ref(), item, quantity, now)
            .await?;

        Ok(())
    }

    #[instrument(skip(self), fields(item = %item))]
    async fn remove_from_cart(&self, item: &CartItemId) -> Result<(), CartsServiceError> {
        let existed = self
            .items_repository
            .delete_item(self.store.as_ref(), item)
            .await?;

        if !existed {
            return Err(CartsServiceError::NotFound);
        }

        Ok(())
    }

    #[instrument(skip(self), fields(user = %user))]
    async fn clear_cart(&self, user: &UserId) -> Result<usize, CartsServiceError> {
        let items = self
            .items_repository
            .list_pending(self.store.as_ref(), user)
            .await?;

        if items.is_empty() {
            return Ok(0);
        }

        let mut tx = self.store.begin().await?;
        let mut still_pending = Vec::with_capacity(items.len());

        // A row may have been booked or removed since the listing.
        for item in items {
            let current = self
                .items_repository
                .get_item_in(tx.as_mut(), &item.id)
                .await?;

            still_pending.extend(current.filter(|row| row.status == CartItemStatus::Pending));
        }

        if still_pending.is_empty() {
            return Ok(0);
        }

        self.items_repository.delete_items_in(tx.as_mut(), &still_pending);

        tx.commit().await?;

        debug!(count = still_pending.len(), "cleared cart");

        Ok(still_pending.len())
    }

    async fn get_cart_summary(
        &self,
        user: &UserId,
        today: Date,
    ) -> Result<CartSummary, CartsServiceError> {
        let items = self.get_cart(user).await?;

        Ok(CartSummary::from_items(&items, today))
    }
}

#[automock]
#[async_trait]
pub trait CartsService: Send + Sync {
    /// Add a pending row to the user's cart.
    async fn add_to_cart(
        &self,
        user: &UserId,
        item: NewCartItem,
        now: Timestamp,
    ) -> Result<CartItem, CartsServiceError>;

    /// Pending rows, most recently added first.
    async fn get_cart(&self, user: &UserId) -> Result<Vec<CartItem>, CartsServiceError>;

    /// Set a row's quantity; zero or less removes the row.
    async fn update_quantity(
        &self,
        item: &CartItemId,
        quantity: i64,
        now: Timestamp,
    ) -> Result<(), CartsServiceError>;

    async fn remove_from_cart(&self, item: &CartItemId) -> Result<(), CartsServiceError>;

    /// Delete every pending row of the user, returning how many went.
    async fn clear_cart(&self, user: &UserId) -> Result<usize, CartsServiceError>;

    async fn get_cart_summary(
        &self,
        user: &UserId,
        today: Date,
    ) -> Result<CartSummary, CartsServiceError>;
}

#[cfg(test)]
mod tests {
    use jiff::{ToSpan, civil::date};
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use crate::{
        store::{Collection, Document, Fields, MemoryStore, Query, StoreError, Transaction},
        test::{TestContext, fixtures},
    };

    use super::*;

    #[tokio::test]
    async fn add_to_cart_persists_pending_row() -> TestResult {
        let ctx = TestContext::new().await;

        let item = ctx
            .carts
            .add_to_cart(&ctx.user, ctx.new_cart_item(2).await?, ctx.now)
            .await?;

        assert!(!item.id.is_blank());
        assert_eq!(item.status, CartItemStatus::Pending);
        assert_eq!(item.quantity, 2);
        assert_eq!(item.added_at, ctx.now);

        let cart = ctx.carts.get_cart(&ctx.user).await?;

        assert_eq!(cart, vec![item]);

        Ok(())
    }

    #[tokio::test]
    async fn add_to_cart_defaults_quantity_to_one() -> TestResult {
        let ctx = TestContext::new().await;

        let mut new_item = ctx.new_cart_item(1).await?;
        new_item.quantity = None;

        let item = ctx.carts.add_to_cart(&ctx.user, new_item, ctx.now).await?;

        assert_eq!(item.quantity, 1);

        Ok(())
    }

    #[tokio::test]
    async fn add_to_cart_rejects_missing_fields_without_writing() -> TestResult {
        let ctx = TestContext::new().await;

        let mut new_item = ctx.new_cart_item(1).await?;
        new_item.details.class_name = String::new();
        new_item.details.price = Decimal::from(-5);

        let writes_before = ctx.store.write_count().await;

        let result = ctx.carts.add_to_cart(&ctx.user, new_item, ctx.now).await;

        assert!(
            matches!(&result, Err(CartsServiceError::Validation(violations)) if violations.len() == 2),
            "expected Validation with two violations, got {result:?}"
        );
        assert_eq!(ctx.store.write_count().await, writes_before);

        Ok(())
    }

    #[tokio::test]
    async fn add_to_cart_rejects_blank_user() -> TestResult {
        let ctx = TestContext::new().await;

        let result = ctx
            .carts
            .add_to_cart(&UserId::new(" "), ctx.new_cart_item(1).await?, ctx.now)
            .await;

        assert!(
            matches!(result, Err(CartsServiceError::Validation(_))),
            "expected Validation, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn get_cart_returns_newest_first_and_only_own_rows() -> TestResult {
        let ctx = TestContext::new().await;

        let first = ctx
            .carts
            .add_to_cart(&ctx.user, ctx.new_cart_item(1).await?, ctx.now)
            .await?;
        let second = ctx
            .carts
            .add_to_cart(&ctx.user, ctx.new_cart_item(1).await?, ctx.now + 5.minutes())
            .await?;
        ctx.carts
            .add_to_cart(&UserId::new("someone-else"), ctx.new_cart_item(1).await?, ctx.now)
            .await?;

        let ids: Vec<CartItemId> = ctx
            .carts
            .get_cart(&ctx.user)
            .await?
            .into_iter()
            .map(|item| item.id)
            .collect();

        assert_eq!(ids, vec![second.id, first.id]);

        Ok(())
    }

    #[tokio::test]
    async fn update_quantity_changes_row_in_place() -> TestResult {
        let ctx = TestContext::new().await;

        let item = ctx
            .carts
            .add_to_cart(&ctx.user, ctx.new_cart_item(1).await?, ctx.now)
            .await?;

        ctx.carts.update_quantity(&item.id, 4, ctx.now).await?;

        let cart = ctx.carts.get_cart(&ctx.user).await?;

        assert_eq!(cart.first().map(|row| row.quantity), Some(4));
        assert_eq!(cart.first().and_then(|row| row.updated_at), Some(ctx.now));

        Ok(())
    }

    #[tokio::test]
    async fn update_quantity_to_zero_removes_row() -> TestResult {
        let ctx = TestContext::new().await;

        let item = ctx
            .carts
            .add_to_cart(&ctx.user, ctx.new_cart_item(1).await?, ctx.now)
            .await?;

        ctx.carts.update_quantity(&item.id, 0, ctx.now).await?;

        assert!(ctx.carts.get_cart(&ctx.user).await?.is_empty());

        let result = ctx.carts.update_quantity(&item.id, -1, ctx.now).await;

        assert!(
            matches!(result, Err(CartsServiceError::NotFound)),
            "expected NotFound for a removed row, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn update_quantity_of_unknown_row_returns_not_found() {
        let ctx = TestContext::new().await;

        let result = ctx
            .carts
            .update_quantity(&CartItemId::new("missing"), 3, ctx.now)
            .await;

        assert!(
            matches!(result, Err(CartsServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn remove_from_cart_unknown_row_returns_not_found() {
        let ctx = TestContext::new().await;

        let result = ctx.carts.remove_from_cart(&CartItemId::new("missing")).await;

        assert!(
            matches!(result, Err(CartsServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn clear_cart_deletes_only_pending_rows_of_user() -> TestResult {
        let ctx = TestContext::new().await;

        ctx.carts
            .add_to_cart(&ctx.user, ctx.new_cart_item(1).await?, ctx.now)
            .await?;
        ctx.carts
            .add_to_cart(&ctx.user, ctx.new_cart_item(2).await?, ctx.now)
            .await?;
        let other = UserId::new("someone-else");
        ctx.carts
            .add_to_cart(&other, ctx.new_cart_item(1).await?, ctx.now)
            .await?;

        assert_eq!(ctx.carts.clear_cart(&ctx.user).await?, 2);
        assert!(ctx.carts.get_cart(&ctx.user).await?.is_empty());
        assert_eq!(ctx.carts.get_cart(&other).await?.len(), 1);

        Ok(())
    }

    /// Books one cart row through the inner store as a transaction begins,
    /// the way a concurrent checkout would between listing and deleting.
    #[derive(Debug)]
    struct BookingRace {
        inner: Arc<MemoryStore>,
        row: CartItemId,
    }

    #[async_trait]
    impl DocumentStore for BookingRace {
        async fn get(
            &self,
            collection: Collection,
            id: &str,
        ) -> Result<Option<Document>, StoreError> {
            self.inner.get(collection, id).await
        }

        async fn query(
            &self,
            collection: Collection,
            query: &Query,
        ) -> Result<Vec<Document>, StoreError> {
            self.inner.query(collection, query).await
        }

        async fn add(&self, collection: Collection, fields: Fields) -> Result<Document, StoreError> {
            self.inner.add(collection, fields).await
        }

        async fn update(
            &self,
            collection: Collection,
            id: &str,
            fields: Fields,
        ) -> Result<(), StoreError> {
            self.inner.update(collection, id, fields).await
        }

        async fn delete(&self, collection: Collection, id: &str) -> Result<bool, StoreError> {
            self.inner.delete(collection, id).await
        }

        async fn begin(&self) -> Result<Box<dyn Transaction>, StoreError> {
            let booked = fixtures::fields(serde_json::json!({
                "status": "booked",
                "bookingId": "booking-elsewhere",
            }));
            self.inner
                .update(Collection::Cart, self.row.as_str(), booked)
                .await?;

            self.inner.begin().await
        }
    }

    #[tokio::test]
    async fn clear_cart_keeps_rows_booked_after_listing() -> TestResult {
        let ctx = TestContext::new().await;

        let item = ctx
            .carts
            .add_to_cart(&ctx.user, ctx.new_cart_item(2).await?, ctx.now)
            .await?;

        let carts = StoreCartsService::new(Arc::new(BookingRace {
            inner: ctx.store.clone(),
            row: item.id.clone(),
        }));

        assert_eq!(carts.clear_cart(&ctx.user).await?, 0);

        let row = ctx.store.get(Collection::Cart, item.id.as_str()).await?;

        assert!(
            matches!(&row, Some(document) if document.fields.get("status") == Some(&serde_json::json!("booked"))),
            "expected the booked row to survive, got {row:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn clear_empty_cart_is_a_no_op() -> TestResult {
        let ctx = TestContext::new().await;

        assert_eq!(ctx.carts.clear_cart(&ctx.user).await?, 0);
        assert_eq!(ctx.store.commit_count().await, 0);

        Ok(())
    }

    #[tokio::test]
    async fn summary_matches_cart_rows() -> TestResult {
        let ctx = TestContext::new().await;

        let mut twenty = ctx.new_cart_item(2).await?;
        twenty.details.price = Decimal::from(20);
        let mut fifteen = ctx.new_cart_item(1).await?;
        fifteen.details.price = Decimal::from(15);
        fifteen.details.date = Some(date(2026, 10, 1));

        ctx.carts.add_to_cart(&ctx.user, twenty, ctx.now).await?;
        ctx.carts.add_to_cart(&ctx.user, fifteen, ctx.now).await?;

        let summary = ctx.carts.get_cart_summary(&ctx.user, ctx.today).await?;

        assert_eq!(summary.total_amount, Decimal::from(55));
        assert_eq!(summary.total_quantity, 3);
        assert_eq!(summary.total_items, 2);
        assert_eq!(summary.upcoming_classes_count, 1);

        Ok(())
    }

    #[tokio::test]
    async fn summary_counts_rows_dated_today() -> TestResult {
        let ctx = TestContext::new().await;

        let mut today = ctx.new_cart_item(1).await?;
        today.details.date = Some(ctx.today);

        ctx.carts.add_to_cart(&ctx.user, today, ctx.now).await?;

        let summary = ctx.carts.get_cart_summary(&ctx.user, ctx.today).await?;

        assert_eq!(summary.upcoming_classes_count, 1);

        Ok(())
    }

    #[tokio::test]
    async fn get_cart_skips_malformed_rows() -> TestResult {
        let ctx = TestContext::new().await;

        ctx.store
            .seed(
                Collection::Cart,
                "broken",
                fixtures::fields(serde_json::json!({
                    "userId": ctx.user.as_str(),
                    "status": "pending",
                })),
            )
            .await;

        assert!(ctx.carts.get_cart(&ctx.user).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn store_failures_surface_as_store_errors() {
        let ctx = TestContext::new().await;

        ctx.store
            .fail_next_read(Collection::Cart, StoreError::Unavailable("offline".to_string()))
            .await;

        let result = ctx.carts.get_cart(&ctx.user).await;

        assert!(
            matches!(result, Err(CartsServiceError::Store(StoreError::Unavailable(_)))),
            "expected Store(Unavailable), got {result:?}"
        );
    }
}
