//! Document store errors.

use thiserror::Error;

use crate::store::Collection;

/// Store error variants, one per store status code.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document {collection}/{id} not found")]
    NotFound { collection: Collection, id: String },

    #[error("document {collection}/{id} already exists")]
    AlreadyExists { collection: Collection, id: String },

    /// A document read by the transaction changed before commit.
    #[error("transaction aborted: {0}")]
    Aborted(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("resource exhausted")]
    ResourceExhausted,

    #[error("operation cancelled")]
    Cancelled,

    #[error("permission denied")]
    PermissionDenied,

    #[error("unauthenticated")]
    Unauthenticated,

    #[error("failed precondition: {0}")]
    FailedPrecondition(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A stored document could not be mapped onto its record type.
    #[error("malformed document {collection}/{id}: {reason}")]
    Malformed {
        collection: Collection,
        id: String,
        reason: String,
    },

    #[error("internal store error: {0}")]
    Internal(String),
}

impl StoreError {
    pub(crate) fn not_found(collection: Collection, id: impl Into<String>) -> Self {
        Self::NotFound {
            collection,
            id: id.into(),
        }
    }

    /// Store status code in its wire spelling.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not-found",
            Self::AlreadyExists { .. } => "already-exists",
            Self::Aborted(_) => "aborted",
            Self::Unavailable(_) => "unavailable",
            Self::DeadlineExceeded => "deadline-exceeded",
            Self::ResourceExhausted => "resource-exhausted",
            Self::Cancelled => "cancelled",
            Self::PermissionDenied => "permission-denied",
            Self::Unauthenticated => "unauthenticated",
            Self::FailedPrecondition(_) => "failed-precondition",
            Self::InvalidArgument(_) => "invalid-argument",
            Self::Malformed { .. } => "data-loss",
            Self::Internal(_) => "internal",
        }
    }

    /// Whether repeating the whole operation may succeed.
    ///
    /// Transactions leave no partial effect behind, so these are safe to retry.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Aborted(_) | Self::Unavailable(_) | Self::DeadlineExceeded | Self::ResourceExhausted
        )
    }
}
