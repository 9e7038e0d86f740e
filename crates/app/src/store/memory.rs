//! In-process document store.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::{
    ids::TypedId,
    store::{Collection, Document, DocumentStore, Fields, Query, StoreError, Transaction},
};

/// Snapshot of every stored document, keyed by collection then id.
pub type Snapshot = BTreeMap<Collection, BTreeMap<String, Fields>>;

/// A [`DocumentStore`] held in memory.
///
/// Transactions are optimistic: each read records the document version it
/// observed and commit aborts when any of them moved. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    collections: BTreeMap<Collection, BTreeMap<String, Versioned>>,
    clock: u64,
    commits: u64,
    writes: u64,
    faults: Faults,
}

#[derive(Debug, Clone)]
struct Versioned {
    fields: Fields,
    version: u64,
}

#[derive(Debug, Default)]
struct Faults {
    commit: Option<CommitFault>,
    reads: HashMap<Collection, StoreError>,
}

#[derive(Debug)]
struct CommitFault {
    after_writes: usize,
    error: StoreError,
}

impl MemoryState {
    fn document(&self, collection: Collection, id: &str) -> Option<&Versioned> {
        self.collections.get(&collection)?.get(id)
    }

    fn version_of(&self, collection: Collection, id: &str) -> Option<u64> {
        self.document(collection, id).map(|document| document.version)
    }

    fn write(&mut self, collection: Collection, id: &str, fields: Fields) {
        self.clock += 1;
        self.writes += 1;

        let version = self.clock;

        self.collections
            .entry(collection)
            .or_default()
            .insert(id.to_string(), Versioned { fields, version });
    }

    fn remove(&mut self, collection: Collection, id: &str) -> bool {
        let removed = self
            .collections
            .get_mut(&collection)
            .and_then(|documents| documents.remove(id))
            .is_some();

        if removed {
            self.clock += 1;
            self.writes += 1;
        }

        removed
    }

    fn check_read(&mut self, collection: Collection) -> Result<(), StoreError> {
        match self.faults.reads.remove(&collection) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl MemoryStore {
    /// An empty store with no pending faults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a document under a known id, replacing any previous version.
    pub async fn seed(&self, collection: Collection, id: &str, fields: Fields) {
        self.state.lock().await.write(collection, id, fields);
    }

    /// Copy of every document currently stored.
    pub async fn snapshot(&self) -> Snapshot {
        let state = self.state.lock().await;

        state
            .collections
            .iter()
            .map(|(collection, documents)| {
                let documents = documents
                    .iter()
                    .map(|(id, document)| (id.clone(), document.fields.clone()))
                    .collect();

                (*collection, documents)
            })
            .collect()
    }

    /// Number of transactions committed so far.
    pub async fn commit_count(&self) -> u64 {
        self.state.lock().await.commits
    }

    /// Number of document writes applied so far, in or out of transactions.
    pub async fn write_count(&self) -> u64 {
        self.state.lock().await.writes
    }

    /// Fail the next commit before it applies anything.
    pub async fn fail_next_commit(&self, error: StoreError) {
        self.fail_commit_after(0, error).await;
    }

    /// Fail the next commit once `after_writes` of its writes have been staged.
    pub async fn fail_commit_after(&self, after_writes: usize, error: StoreError) {
        self.state.lock().await.faults.commit = Some(CommitFault {
            after_writes,
            error,
        });
    }

    /// Fail the next read against `collection`.
    pub async fn fail_next_read(&self, collection: Collection, error: StoreError) {
        self.state.lock().await.faults.reads.insert(collection, error);
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError> {
        let mut state = self.state.lock().await;

        state.check_read(collection)?;

        Ok(state
            .document(collection, id)
            .map(|document| Document::new(id, document.fields.clone())))
    }

    async fn query(
        &self,
        collection: Collection,
        query: &Query,
    ) -> Result<Vec<Document>, StoreError> {
        let mut state = self.state.lock().await;

        state.check_read(collection)?;

        let mut documents: Vec<Document> = state
            .collections
            .get(&collection)
            .into_iter()
            .flatten()
            .filter(|(_, document)| query.matches(&document.fields))
            .map(|(id, document)| Document::new(id.clone(), document.fields.clone()))
            .collect();

        query.sort(&mut documents);

        Ok(documents)
    }

    async fn add(&self, collection: Collection, fields: Fields) -> Result<Document, StoreError> {
        let id = TypedId::<Document>::generate().into_string();

        self.state.lock().await.write(collection, &id, fields.clone());

        Ok(Document::new(id, fields))
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;

        let Some(existing) = state.document(collection, id) else {
            return Err(StoreError::not_found(collection, id));
        };

        let mut merged = existing.fields.clone();
        merged.extend(fields);

        state.write(collection, id, merged);

        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<bool, StoreError> {
        Ok(self.state.lock().await.remove(collection, id))
    }

    async fn begin(&self) -> Result<Box<dyn Transaction>, StoreError> {
        Ok(Box::new(MemoryTransaction {
            state: Arc::clone(&self.state),
            reads: HashMap::new(),
            writes: Vec::new(),
        }))
    }
}

#[derive(Debug)]
enum PendingWrite {
    Set {
        collection: Collection,
        id: String,
        fields: Fields,
    },
    Update {
        collection: Collection,
        id: String,
        fields: Fields,
    },
    Delete {
        collection: Collection,
        id: String,
    },
}

impl PendingWrite {
    fn key(&self) -> (Collection, String) {
        match self {
            Self::Set { collection, id, .. }
            | Self::Update { collection, id, .. }
            | Self::Delete { collection, id } => (*collection, id.clone()),
        }
    }
}

#[derive(Debug)]
struct MemoryTransaction {
    state: Arc<Mutex<MemoryState>>,
    reads: HashMap<(Collection, String), Option<u64>>,
    writes: Vec<PendingWrite>,
}

#[async_trait]
impl Transaction for MemoryTransaction {
    async fn get(
        &mut self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<Document>, StoreError> {
        if !self.writes.is_empty() {
            return Err(StoreError::FailedPrecondition(
                "transactions must perform all reads before any write".to_string(),
            ));
        }

        let mut state = self.state.lock().await;

        state.check_read(collection)?;

        let document = state.document(collection, id);

        self.reads
            .entry((collection, id.to_string()))
            .or_insert_with(|| document.map(|document| document.version));

        Ok(document.map(|document| Document::new(id, document.fields.clone())))
    }

    fn allocate_id(&self, _collection: Collection) -> String {
        TypedId::<Document>::generate().into_string()
    }

    fn set(&mut self, collection: Collection, id: &str, fields: Fields) {
        self.writes.push(PendingWrite::Set {
            collection,
            id: id.to_string(),
            fields,
        });
    }

    fn update(&mut self, collection: Collection, id: &str, fields: Fields) {
        self.writes.push(PendingWrite::Update {
            collection,
            id: id.to_string(),
            fields,
        });
    }

    fn delete(&mut self, collection: Collection, id: &str) {
        self.writes.push(PendingWrite::Delete {
            collection,
            id: id.to_string(),
        });
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let Self {
            state,
            reads,
            writes,
        } = *self;

        let mut state = state.lock().await;
        let mut fault = state.faults.commit.take();

        for ((collection, id), observed) in &reads {
            if state.version_of(*collection, id) != *observed {
                debug!(%collection, %id, "transaction read went stale");

                return Err(StoreError::Aborted(format!(
                    "{collection}/{id} changed since it was read"
                )));
            }
        }

        let mut staged: HashMap<(Collection, String), Option<Fields>> = HashMap::new();

        for (staged_count, write) in writes.into_iter().enumerate() {
            if let Some(CommitFault { error, .. }) =
                fault.take_if(|fault| fault.after_writes <= staged_count)
            {
                return Err(error);
            }

            let key = write.key();

            let current = match staged.get(&key) {
                Some(fields) => fields.clone(),
                None => state
                    .document(key.0, &key.1)
                    .map(|document| document.fields.clone()),
            };

            let next = match write {
                PendingWrite::Set { fields, .. } => Some(fields),
                PendingWrite::Update { fields, .. } => {
                    let Some(mut merged) = current else {
                        return Err(StoreError::not_found(key.0, key.1));
                    };

                    merged.extend(fields);

                    Some(merged)
                }
                PendingWrite::Delete { .. } => None,
            };

            staged.insert(key, next);
        }

        if let Some(CommitFault { error, .. }) = fault {
            return Err(error);
        }

        for ((collection, id), fields) in staged {
            match fields {
                Some(fields) => state.write(collection, &id, fields),
                None => {
                    state.remove(collection, &id);
                }
            }
        }

        state.commits += 1;

        Ok(())
    }
}
