//! Carts

pub mod errors;
pub mod models;
mod repository;
mod service;

pub(crate) use repository::CartItemsRepository;

pub use errors::CartsServiceError;
pub use service::*;
