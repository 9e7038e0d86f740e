//! Application configuration

use clap::Parser;

mod booking;
mod logging;

pub use booking::BookingConfig;
pub use logging::{DEFAULT_LOG_FILTER, LogFormat, LoggingConfig};

/// Studio booking core configuration, read from the environment.
#[derive(Debug, Parser)]
#[command(name = "yoga-app", about = "Yoga studio booking core", long_about = None)]
pub struct AppConfig {
    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// Booking and cart behaviour.
    #[command(flatten)]
    pub booking: BookingConfig,
}

impl AppConfig {
    /// Load configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable holds a value that cannot be parsed.
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse_from(["yoga-app"])
    }
}
