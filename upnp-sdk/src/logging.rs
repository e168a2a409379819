//! Logging setup for applications built on the SDK
//!
//! The library crates only emit `tracing` events; nothing is printed until a
//! subscriber is installed. These helpers install one for the common cases.

use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Logging mode for different use cases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggingMode {
    /// No subscriber; every event is dropped
    Silent,
    /// Compact stderr output
    Development,
    /// Verbose output with threads and source locations
    Debug,
    /// One JSON object per event, for log collectors
    Json,
}

impl LoggingMode {
    /// Parse a `UPNP_LOG_MODE` value, case-insensitively
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "silent" => Some(LoggingMode::Silent),
            "development" | "dev" => Some(LoggingMode::Development),
            "debug" => Some(LoggingMode::Debug),
            "json" => Some(LoggingMode::Json),
            _ => None,
        }
    }
}

/// Logging configuration error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracingInit(String),

    #[error("Invalid environment variable: {0}")]
    InvalidEnv(String),
}

/// Initialize logging with the specified mode
///
/// Call this once, early, before searching the network.
///
/// # Examples
///
/// ```rust,no_run
/// use upnp_sdk::logging::{init_logging, LoggingMode};
///
/// init_logging(LoggingMode::Development).unwrap();
/// ```
///
/// # Environment Variables
///
/// - `UPNP_LOG_LEVEL`: filter directives (e.g. `debug`, `description_cache=trace`)
/// - `RUST_LOG`: used when `UPNP_LOG_LEVEL` is not set
pub fn init_logging(mode: LoggingMode) -> Result<(), LoggingError> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    match mode {
        LoggingMode::Silent => Ok(()),
        LoggingMode::Development => {
            let filter = create_env_filter("info")?;

            Registry::default()
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(false)
                        .compact(),
                )
                .with(filter)
                .try_init()
                .map_err(|e| LoggingError::TracingInit(e.to_string()))
        }
        LoggingMode::Debug => {
            let filter = create_env_filter("debug")?;

            Registry::default()
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .pretty()
                        .with_thread_ids(true)
                        .with_file(true)
                        .with_line_number(true),
                )
                .with(filter)
                .try_init()
                .map_err(|e| LoggingError::TracingInit(e.to_string()))
        }
        LoggingMode::Json => {
            let filter = create_env_filter("info")?;

            Registry::default()
                .with(fmt::layer().with_writer(std::io::stderr).json())
                .with(filter)
                .try_init()
                .map_err(|e| LoggingError::TracingInit(e.to_string()))
        }
    }
}

/// Initialize logging from the `UPNP_LOG_MODE` environment variable
///
/// Unset means [`LoggingMode::Silent`]; an unknown value is an error.
pub fn init_logging_from_env() -> Result<(), LoggingError> {
    let mode = match std::env::var("UPNP_LOG_MODE") {
        Ok(value) => LoggingMode::from_name(&value)
            .ok_or_else(|| LoggingError::InvalidEnv(format!("UPNP_LOG_MODE={}", value)))?,
        Err(_) => LoggingMode::Silent,
    };

    init_logging(mode)
}

/// Filter from `UPNP_LOG_LEVEL`, then `RUST_LOG`, then `default_level`
fn create_env_filter(default_level: &str) -> Result<EnvFilter, LoggingError> {
    let directives = std::env::var("UPNP_LOG_LEVEL")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| default_level.to_string());

    EnvFilter::try_new(&directives).map_err(|e| LoggingError::InvalidEnv(format!("{}: {}", directives, e)))
}

/// Check if a global subscriber has been installed
pub fn is_initialized() -> bool {
    tracing::dispatcher::has_been_set()
}
