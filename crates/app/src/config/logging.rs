//! Logging settings read from the environment.

use clap::Args;

/// Filter used when `RUST_LOG` is unset: this crate at `info`, dependencies at `warn`.
pub const DEFAULT_LOG_FILTER: &str = "yoga_app=info,warn";

/// Line format of emitted events.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Single-line human readable output.
    #[default]
    Compact,

    /// One JSON object per event, carrying the current span and its parents.
    Json,
}

/// Where log output goes and how much of it.
#[derive(Clone, Debug, Args)]
pub struct LoggingConfig {
    /// `EnvFilter` directives, e.g. `yoga_app::domain::bookings=debug,warn`.
    #[arg(long = "log-filter", env = "RUST_LOG", default_value = DEFAULT_LOG_FILTER)]
    pub filter: String,

    /// Output line format.
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,

    /// Emit an event when an instrumented span closes, with its busy and idle time.
    ///
    /// Useful for timing booking transactions and their retries.
    #[arg(long, env = "LOG_SPAN_CLOSE", default_value_t = false)]
    pub span_close: bool,
}

impl LoggingConfig {
    /// The configured filter, or [`DEFAULT_LOG_FILTER`] when it is blank.
    #[must_use]
    pub fn filter_directives(&self) -> &str {
        let filter = self.filter.trim();

        if filter.is_empty() {
            DEFAULT_LOG_FILTER
        } else {
            filter
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
            log_format: LogFormat::default(),
            span_close: false,
        }
    }
}
