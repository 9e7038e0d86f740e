//! Catalog service errors.

use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum CatalogServiceError {
    #[error("catalog entry not found")]
    NotFound,

    /// Availability was requested for an instance on or before today.
    #[error("schedule is not in the future")]
    ScheduleInPast,

    #[error("invalid catalog data: {0}")]
    InvalidData(String),

    #[error("storage error")]
    Store(#[source] StoreError),
}

impl From<StoreError> for CatalogServiceError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound { .. } => Self::NotFound,
            StoreError::Malformed { reason, .. } => Self::InvalidData(reason),
            other => Self::Store(other),
        }
    }
}
