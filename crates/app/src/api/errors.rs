//! Façade error taxonomy.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::Serialize;

use crate::{
    domain::{
        bookings::BookingsServiceError, carts::CartsServiceError, catalog::CatalogServiceError,
    },
    store::StoreError,
};

/// Failure categories surfaced to presentation code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    /// Malformed input, rejected before any store call.
    Validation,
    NotFound,
    /// A referenced document vanished between cart-add and submit.
    ReferentialIntegrity,
    Unauthorized,
    InvalidState,
    CapacityExceeded,
    /// Contention or an unreachable store; the operation left nothing behind.
    TransientStore,
    Unknown,
}

const UNEXPECTED: &str = "An unexpected error occurred";

/// Fixed user-facing text for a store status code.
#[must_use]
pub fn store_code_message(code: &str) -> Option<&'static str> {
    let message = match code {
        "permission-denied" => "You do not have permission for this action. Please sign in.",
        "not-found" => "The requested data could not be found.",
        "unavailable" => "Service is temporarily unavailable. Please try again.",
        "unauthenticated" => "Please sign in to continue.",
        "already-exists" => "This item already exists.",
        "resource-exhausted" => "Too many requests. Please wait and try again.",
        "cancelled" => "Operation was cancelled.",
        "deadline-exceeded" => "Operation timed out. Please try again.",
        _ => return None,
    };

    Some(message)
}

/// Error half of the response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub kind: ErrorKind,
    /// Store status code, when the failure came from the store.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
    pub user_message: String,
    /// Operation that failed.
    pub context: &'static str,
    /// Only transient store failures are worth retrying.
    pub retryable: bool,
}

impl ApiError {
    #[must_use]
    pub fn new(kind: ErrorKind, user_message: impl Into<String>) -> Self {
        Self {
            kind,
            code: None,
            user_message: user_message.into(),
            context: "",
            retryable: kind == ErrorKind::TransientStore,
        }
    }

    fn not_found() -> Self {
        Self::new(
            ErrorKind::NotFound,
            store_code_message("not-found").unwrap_or(UNEXPECTED),
        )
    }

    fn unexpected() -> Self {
        Self::new(ErrorKind::Unknown, UNEXPECTED)
    }

    #[must_use]
    pub(crate) fn in_context(mut self, context: &'static str) -> Self {
        self.context = context;
        self
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.user_message)
    }
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        let kind = if error.is_transient() {
            ErrorKind::TransientStore
        } else {
            match error {
                StoreError::NotFound { .. } => ErrorKind::NotFound,
                StoreError::PermissionDenied | StoreError::Unauthenticated => {
                    ErrorKind::Unauthorized
                }
                StoreError::InvalidArgument(_) => ErrorKind::Validation,
                _ => ErrorKind::Unknown,
            }
        };

        let code = error.code();
        let user_message = store_code_message(code).map_or_else(
            || match kind {
                ErrorKind::Unknown => UNEXPECTED.to_string(),
                _ => error.to_string(),
            },
            str::to_string,
        );

        Self {
            code: Some(code),
            ..Self::new(kind, user_message)
        }
    }
}

impl From<CatalogServiceError> for ApiError {
    fn from(error: CatalogServiceError) -> Self {
        match error {
            CatalogServiceError::NotFound => Self::not_found(),
            CatalogServiceError::ScheduleInPast => {
                Self::new(ErrorKind::Validation, "Cannot book classes in the past.")
            }
            CatalogServiceError::InvalidData(_) => Self::unexpected(),
            CatalogServiceError::Store(error) => error.into(),
        }
    }
}

impl From<CartsServiceError> for ApiError {
    fn from(error: CartsServiceError) -> Self {
        match error {
            CartsServiceError::NotFound => Self::not_found(),
            error @ CartsServiceError::Validation(_) => {
                Self::new(ErrorKind::Validation, error.to_string())
            }
            CartsServiceError::InvalidData(_) => Self::unexpected(),
            CartsServiceError::Store(error) => error.into(),
        }
    }
}

impl From<BookingsServiceError> for ApiError {
    fn from(error: BookingsServiceError) -> Self {
        let kind = match error {
            BookingsServiceError::NotFound => return Self::not_found(),
            BookingsServiceError::InvalidData(_) => return Self::unexpected(),
            BookingsServiceError::Store(error) => return error.into(),
            BookingsServiceError::Validation(_) => ErrorKind::Validation,
            BookingsServiceError::ReferentialIntegrity { .. } => ErrorKind::ReferentialIntegrity,
            BookingsServiceError::Unauthorized => ErrorKind::Unauthorized,
            BookingsServiceError::InvalidState(_) => ErrorKind::InvalidState,
            BookingsServiceError::CapacityExceeded { .. } => ErrorKind::CapacityExceeded,
        };

        Self::new(kind, error.to_string())
    }
}
