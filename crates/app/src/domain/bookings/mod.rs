//! Bookings

pub mod errors;
pub mod models;
mod repository;
mod service;
pub mod stats;

pub use errors::BookingsServiceError;
pub use service::*;
