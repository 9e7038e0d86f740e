//! Document Store
//!
//! The persistence port every service is built on: named collections of
//! schemaless documents, predicate queries, and all-or-nothing multi-document
//! transactions. [`MemoryStore`] is the in-process adapter.

use std::fmt::Debug;

use async_trait::async_trait;

mod document;
pub mod errors;
mod memory;
mod record;

pub use document::{Collection, Direction, Document, Fields, Filter, FilterOp, OrderBy, Query};
pub use errors::StoreError;
pub use memory::{MemoryStore, Snapshot};
pub use record::Record;
pub(crate) use record::decode_valid;

/// Persistence backend shared by all services.
///
/// Implementations must be cheap to share between concurrent logical
/// requests; the handle itself carries no per-request state.
#[async_trait]
pub trait DocumentStore: Debug + Send + Sync {
    /// Fetch a document by id, `None` when absent.
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError>;

    /// Run a filtered, ordered query.
    async fn query(
        &self,
        collection: Collection,
        query: &Query,
    ) -> Result<Vec<Document>, StoreError>;

    /// Insert a document under a freshly generated id.
    async fn add(&self, collection: Collection, fields: Fields) -> Result<Document, StoreError>;

    /// Merge top-level fields into an existing document.
    ///
    /// Fails with [`StoreError::NotFound`] when the document is absent.
    async fn update(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> Result<(), StoreError>;

    /// Delete a document, returning whether it existed.
    async fn delete(&self, collection: Collection, id: &str) -> Result<bool, StoreError>;

    /// Begin an optimistic transaction.
    async fn begin(&self) -> Result<Box<dyn Transaction>, StoreError>;
}

/// A serializable multi-document transaction.
///
/// Every read must happen before the first write. Writes are buffered and
/// applied atomically by [`Transaction::commit`], which fails with
/// [`StoreError::Aborted`] when any document read by the transaction changed
/// in the meantime. A dropped transaction has no effect.
#[async_trait]
pub trait Transaction: Send {
    /// Read a document inside the transaction snapshot.
    async fn get(
        &mut self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<Document>, StoreError>;

    /// Reserve an id for a document this transaction will create.
    fn allocate_id(&self, collection: Collection) -> String;

    /// Create or overwrite a document.
    fn set(&mut self, collection: Collection, id: &str, fields: Fields);

    /// Merge fields into a document that must exist at commit time.
    fn update(&mut self, collection: Collection, id: &str, fields: Fields);

    /// Remove a document; deleting an absent one is not an error.
    fn delete(&mut self, collection: Collection, id: &str);

    /// Apply every buffered write, or none of them.
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}
