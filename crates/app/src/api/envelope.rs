//! Uniform `{success, data, error}` response envelope.

use std::fmt::Display;

use serde::Serialize;
use tracing::{debug, error};

use super::errors::{ApiError, ErrorKind};

/// Outcome of one façade call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T> ApiResponse<T> {
    #[must_use]
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    #[must_use]
    pub fn failed(error: ApiError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
        }
    }

    /// Unwrap the envelope back into a `Result`.
    ///
    /// # Errors
    ///
    /// Returns the carried [`ApiError`], or an unknown error for an envelope
    /// that reports success without data.
    pub fn into_result(self) -> Result<T, ApiError> {
        match (self.data, self.error) {
            (_, Some(error)) => Err(error),
            (Some(data), None) => Ok(data),
            (None, None) => Err(ApiError::new(
                ErrorKind::Unknown,
                "An unexpected error occurred",
            )),
        }
    }
}

/// Wrap a service result, translating the failure for presentation code.
pub(crate) fn respond<T, E>(context: &'static str, result: Result<T, E>) -> ApiResponse<T>
where
    E: Into<ApiError> + Display,
{
    match result {
        Ok(data) => ApiResponse::ok(data),
        Err(source) => {
            let detail = source.to_string();
            let error = source.into().in_context(context);

            if error.kind == ErrorKind::Unknown {
                error!(context, "unclassified failure: {detail}");
            } else {
                debug!(context, kind = ?error.kind, "request failed: {detail}");
            }

            ApiResponse::failed(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use testresult::TestResult;

    use crate::store::StoreError;

    use super::*;

    #[test]
    fn success_serializes_with_data() -> TestResult {
        let response = respond::<_, ApiError>("listCourses", Ok(vec![1, 2]));

        assert_eq!(
            serde_json::to_value(&response)?,
            json!({"success": true, "data": [1, 2], "error": null})
        );

        Ok(())
    }

    #[test]
    fn failure_carries_context_and_message() -> TestResult {
        let response =
            respond::<(), _>("getCart", Err(StoreError::Unavailable("offline".to_string())));

        assert!(!response.success, "expected failure envelope");

        let error = match response.into_result() {
            Err(error) => error,
            other => return Err(format!("expected error, got {other:?}").into()),
        };

        assert_eq!(error.context, "getCart");
        assert_eq!(error.kind, ErrorKind::TransientStore);
        assert_eq!(
            error.user_message,
            "Service is temporarily unavailable. Please try again."
        );

        Ok(())
    }
}
