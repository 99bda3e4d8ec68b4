//! Logging configuration for autowire
//!
//! Structured logging setup with JSON (production) and pretty (development)
//! output formats.
//!
//! # Features
//!
//! - `logging` - Enable debug logging (default)
//! - `logging-json` - Use JSON structured output
//! - `logging-pretty` - Use colorful pretty output
//!
//! # Example
//!
//! ```rust,ignore
//! use autowire::logging;
//!
//! // Initialize with default settings
//! logging::init();
//!
//! // Or use the builder for custom configuration
//! logging::builder()
//!     .with_level(tracing::Level::DEBUG)
//!     .init();
//! ```

#[cfg(feature = "logging")]
use tracing::Level;

/// Logging format configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// JSON structured logging (production default)
    #[default]
    Json,
    /// Pretty colorful output (development)
    Pretty,
    /// Compact single-line output
    Compact,
}

/// Builder for logging configuration
#[cfg(feature = "logging")]
#[derive(Debug, Clone)]
pub struct LoggingBuilder {
    level: Level,
    format: LogFormat,
}

#[cfg(feature = "logging")]
impl LoggingBuilder {
    fn new() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::default(),
        }
    }

    /// Set the maximum log level
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Use JSON output format
    pub fn json(mut self) -> Self {
        self.format = LogFormat::Json;
        self
    }

    /// Use pretty output format
    pub fn pretty(mut self) -> Self {
        self.format = LogFormat::Pretty;
        self
    }

    /// Use compact output format
    pub fn compact(mut self) -> Self {
        self.format = LogFormat::Compact;
        self
    }

    /// Initialize the global subscriber.
    ///
    /// No-op unless a `tracing-subscriber` feature is enabled; does nothing
    /// if a global subscriber is already set.
    pub fn init(self) {
        #[cfg(any(feature = "logging-pretty", feature = "logging-json"))]
        {
            use tracing_subscriber::EnvFilter;

            let filter = EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("autowire={}", self.level)));

            let builder = tracing_subscriber::fmt().with_env_filter(filter);

            let result = match self.format {
                #[cfg(feature = "logging-json")]
                LogFormat::Json => builder.json().try_init(),
                LogFormat::Pretty => builder.pretty().try_init(),
                _ => builder.compact().try_init(),
            };
            // Already-set subscriber is fine; keep whatever the host app chose
            let _ = result;
        }
    }
}

/// Create a logging configuration builder
#[cfg(feature = "logging")]
pub fn builder() -> LoggingBuilder {
    LoggingBuilder::new()
}

/// Initialize logging with default settings
#[cfg(feature = "logging")]
pub fn init() {
    builder().init();
}

/// Initialize pretty (development) logging
#[cfg(feature = "logging")]
pub fn init_pretty() {
    builder().pretty().init();
}

/// Initialize JSON (production) logging
#[cfg(feature = "logging")]
pub fn init_json() {
    builder().json().init();
}
