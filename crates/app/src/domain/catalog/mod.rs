//! Catalog: courses and their dated schedule instances.

pub mod errors;
pub mod models;
mod repository;
mod service;

pub(crate) use repository::{CoursesRepository, SchedulesRepository};

pub use errors::CatalogServiceError;
pub use service::*;
