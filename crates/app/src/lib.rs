//! Yoga studio booking core: catalog queries, carts and the transactional
//! booking engine over an injected document store.

pub mod api;
pub mod config;
pub mod context;
pub mod domain;
pub mod identity;
pub mod ids;
pub mod notifications;
pub mod observability;
pub mod store;

#[cfg(test)]
mod test;

mod validation;
