//! Studio Façade
//!
//! The single typed entry point for presentation code: wraps the catalog,
//! cart and booking services in a `{success, data, error}` envelope and
//! translates their failures into a small user-facing taxonomy.

use jiff::{Timestamp, civil::Date, tz::TimeZone};

mod envelope;
mod errors;
mod health;
mod settings;
mod studio;

pub use envelope::ApiResponse;
pub use errors::{ApiError, ErrorKind, store_code_message};
pub use health::{HealthReport, HealthServices, HealthStatus, ServiceHealth, ServiceStatus};
pub use settings::{AppSettings, ValueRange};
pub use studio::StudioApi;

/// Calendar date of `now` in UTC, the studio's notion of "today".
#[must_use]
pub fn utc_date(now: Timestamp) -> Date {
    now.to_zoned(TimeZone::UTC).date()
}
