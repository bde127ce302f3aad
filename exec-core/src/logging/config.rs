//! Logging configuration and initialization.

use std::env;

use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable format with colors (default for terminals)
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
    /// JSON format for log aggregation
    Json,
}

impl LogFormat {
    /// Parse format from string, defaulting to pretty
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            "compact" => LogFormat::Compact,
            _ => LogFormat::Pretty,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Output format (pretty, compact, json)
    pub format: LogFormat,
    /// Default log level filter when `RUST_LOG` is unset
    pub default_level: String,
    /// Include target (module path)
    pub include_target: bool,
    /// Include thread IDs
    pub include_thread_ids: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            default_level: "info".to_string(),
            include_target: true,
            include_thread_ids: false,
        }
    }
}

impl LogConfig {
    /// Create config from environment variables
    ///
    /// Reads:
    /// - `LOG_FORMAT`: pretty, compact, or json
    /// - `LOG_LEVEL`: default level (fallback when RUST_LOG is not set)
    pub fn from_env() -> Self {
        Self {
            format: env::var("LOG_FORMAT")
                .map(|s| LogFormat::parse(&s))
                .unwrap_or_default(),
            default_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            ..Default::default()
        }
    }

    /// Config for JSON output (log aggregation)
    pub fn json() -> Self {
        Self {
            format: LogFormat::Json,
            include_thread_ids: true,
            ..Default::default()
        }
    }

    /// Set the default log level
    pub fn with_default_level(mut self, level: impl Into<String>) -> Self {
        self.default_level = level.into();
        self
    }
}

/// Initialize logging with the given configuration
///
/// # Errors
///
/// Returns an error if a subscriber is already set.
pub fn init_logging(config: LogConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.default_level));

    let timer = ChronoUtc::new("%Y-%m-%dT%H:%M:%S%.3fZ".to_string());
    let base = fmt::layer()
        .with_timer(timer)
        .with_target(config.include_target)
        .with_thread_ids(config.include_thread_ids);

    let registry = tracing_subscriber::registry().with(env_filter);
    match config.format {
        LogFormat::Pretty => registry.with(base).try_init()?,
        LogFormat::Compact => registry.with(base.compact()).try_init()?,
        LogFormat::Json => registry.with(base.json()).try_init()?,
    }
    Ok(())
}
