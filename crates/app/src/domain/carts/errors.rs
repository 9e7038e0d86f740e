//! Carts service errors.

use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum CartsServiceError {
    #[error("cart item not found")]
    NotFound,

    /// Input rejected before any store call.
    #[error("invalid cart item: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("invalid cart data: {0}")]
    InvalidData(String),

    #[error("storage error")]
    Store(#[source] StoreError),
}

impl From<StoreError> for CartsServiceError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound { .. } => Self::NotFound,
            StoreError::Malformed { reason, .. } => Self::InvalidData(reason),
            other => Self::Store(other),
        }
    }
}
