//! Diagnostic health check over the catalog read paths.

use jiff::Timestamp;
use serde::Serialize;

use crate::domain::catalog::{CatalogService, models::CourseFilter};

use super::{errors::ApiError, utc_date};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceStatus {
    Ok,
    Error,
}

/// Result of exercising one read path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceHealth {
    pub status: ServiceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    pub message: String,
}

impl ServiceHealth {
    fn probe<T, E: Into<ApiError>>(result: Result<Vec<T>, E>, noun: &str) -> Self {
        match result {
            Ok(rows) => Self {
                status: ServiceStatus::Ok,
                count: Some(rows.len()),
                message: format!("{} {noun} available", rows.len()),
            },
            Err(error) => Self {
                status: ServiceStatus::Error,
                count: None,
                message: error.into().user_message,
            },
        }
    }

    fn is_ok(&self) -> bool {
        self.status == ServiceStatus::Ok
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthServices {
    pub courses: ServiceHealth,
    pub schedules: ServiceHealth,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub message: String,
    pub timestamp: Timestamp,
    pub services: HealthServices,
}

/// Run both catalog probes; never writes.
pub(crate) async fn check(catalog: &dyn CatalogService, now: Timestamp) -> HealthReport {
    let courses = ServiceHealth::probe(
        catalog.list_courses(CourseFilter::default()).await,
        "classes",
    );

    let schedules = ServiceHealth::probe(
        catalog.list_available_schedules(utc_date(now)).await,
        "schedules",
    );

    let (status, message) = if courses.is_ok() && schedules.is_ok() {
        (HealthStatus::Healthy, "All services operational")
    } else {
        (HealthStatus::Degraded, "Some services have issues")
    };

    HealthReport {
        status,
        message: message.to_string(),
        timestamp: now,
        services: HealthServices { courses, schedules },
    }
}
