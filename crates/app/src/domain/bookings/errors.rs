//! Bookings service errors.

use thiserror::Error;

use crate::{
    domain::catalog::models::ScheduleId,
    store::{Collection, StoreError},
};

#[derive(Debug, Error)]
pub enum BookingsServiceError {
    #[error("booking not found")]
    NotFound,

    /// Payload rejected before any store call.
    #[error("invalid booking: {}", .0.join(", "))]
    Validation(Vec<String>),

    /// A course or schedule referenced by the booking no longer exists.
    #[error("{collection} document {id} no longer exists")]
    ReferentialIntegrity { collection: Collection, id: String },

    #[error("booking belongs to another user")]
    Unauthorized,

    #[error("{0}")]
    InvalidState(String),

    #[error("schedule {schedule} has {available} spots left, {requested} requested")]
    CapacityExceeded {
        schedule: ScheduleId,
        requested: u32,
        available: u32,
    },

    #[error("invalid booking data: {0}")]
    InvalidData(String),

    #[error("storage error")]
    Store(#[source] StoreError),
}

impl BookingsServiceError {
    /// Contention on a transaction; another attempt may succeed.
    pub(crate) const fn is_contention(&self) -> bool {
        matches!(self, Self::Store(StoreError::Aborted(_)))
    }
}

impl From<StoreError> for BookingsServiceError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound { .. } => Self::NotFound,
            StoreError::Malformed { reason, .. } => Self::InvalidData(reason),
            other => Self::Store(other),
        }
    }
}
