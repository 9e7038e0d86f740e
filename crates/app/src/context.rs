//! App Context

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    sync::Arc,
};

use thiserror::Error;

use crate::{
    api::StudioApi,
    config::AppConfig,
    domain::{
        bookings::{BookingsService, StoreBookingsService},
        carts::{CartsService, StoreCartsService},
        catalog::{CatalogService, StoreCatalogService},
    },
    notifications::{ConfirmationSender, LoggingConfirmationSender},
    observability::{self, ObservabilityError},
    store::DocumentStore,
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to load configuration")]
    Config(#[source] clap::Error),

    #[error("failed to initialise logging")]
    Logging(#[source] ObservabilityError),
}

#[derive(Clone)]
pub struct AppContext {
    pub catalog: Arc<dyn CatalogService>,
    pub carts: Arc<dyn CartsService>,
    pub bookings: Arc<dyn BookingsService>,
    pub confirmations: Arc<dyn ConfirmationSender>,
    pub api: StudioApi,
}

impl Debug for AppContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("AppContext")
            .field("api", &self.api)
            .finish_non_exhaustive()
    }
}

impl AppContext {
    /// Wire every service onto `store`, confirmations going to the log.
    #[must_use]
    pub fn from_store(store: Arc<dyn DocumentStore>, config: &AppConfig) -> Self {
        Self::with_confirmations(store, config, Arc::new(LoggingConfirmationSender))
    }

    #[must_use]
    pub fn with_confirmations(
        store: Arc<dyn DocumentStore>,
        config: &AppConfig,
        confirmations: Arc<dyn ConfirmationSender>,
    ) -> Self {
        let catalog: Arc<dyn CatalogService> = Arc::new(StoreCatalogService::new(store.clone()));
        let carts: Arc<dyn CartsService> = Arc::new(StoreCartsService::new(store.clone()));
        let bookings: Arc<dyn BookingsService> = Arc::new(StoreBookingsService::with_settings(
            store,
            config.booking.settings(),
        ));

        let api = StudioApi::new(
            catalog.clone(),
            carts.clone(),
            bookings.clone(),
            confirmations.clone(),
            config.booking.clone(),
        );

        Self {
            catalog,
            carts,
            bookings,
            confirmations,
            api,
        }
    }

    /// Load configuration from the environment, install logging and wire
    /// the services onto `store`.
    ///
    /// # Errors
    ///
    /// Returns an error when the environment holds an unparsable value or a
    /// global subscriber is already installed.
    pub fn bootstrap(store: Arc<dyn DocumentStore>) -> Result<Self, AppInitError> {
        let config = AppConfig::load().map_err(AppInitError::Config)?;

        observability::init_logging(&config.logging).map_err(AppInitError::Logging)?;

        Ok(Self::from_store(store, &config))
    }
}
