//! Logging setup for Sinew.
//!
//! All crates emit `tracing` events; this module only installs a subscriber
//! for applications that do not bring their own.
//!
//! # Environment Variables
//!
//! - `SINEW_DEBUG=true|1|yes` - Enable debug logging
//! - `SINEW_LOG_LEVEL=trace|debug|info|warn|error` - Set a specific level
//! - `SINEW_LOG_FORMAT=json|pretty|compact` - Output format (default: json)
//!
//! # Usage
//!
//! ```rust,no_run
//! use sinew_query::logging;
//!
//! // Call once at startup
//! logging::init();
//! ```
//!
//! Preload steps log at `debug` (one event per step), stitching at `trace`,
//! and oversized key sets or slow queries at `warn`.

use std::env;
use std::sync::Once;

use sinew_schema::SinewConfig;

static INIT: Once = Once::new();

/// Output format of the installed subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per event.
    #[default]
    Json,
    /// Multi-line human readable output.
    Pretty,
    /// Single-line human readable output.
    Compact,
}

impl LogFormat {
    /// Parse a format name; unknown names fall back to JSON.
    pub fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "pretty" => Self::Pretty,
            "compact" => Self::Compact,
            _ => Self::Json,
        }
    }
}

/// Resolved logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// Level applied to the sinew crates.
    pub level: &'static str,
    /// Output format.
    pub format: LogFormat,
    /// Whether anything asked for logging at all.
    pub enabled: bool,
}

impl LogSettings {
    /// Settings from `SINEW_*` environment variables.
    pub fn from_env() -> Self {
        Self::resolve(
            env::var("SINEW_DEBUG").ok().as_deref(),
            env::var("SINEW_LOG_LEVEL").ok().as_deref(),
            env::var("SINEW_LOG_FORMAT").ok().as_deref(),
        )
    }

    /// Settings from raw variable values.
    pub fn resolve(debug: Option<&str>, level: Option<&str>, format: Option<&str>) -> Self {
        let debug = debug.is_some_and(is_truthy);
        let fallback = if debug { "debug" } else { "warn" };
        let level = level.map_or(fallback, |l| parse_level(l).unwrap_or(fallback));
        Self {
            level,
            format: format.map(LogFormat::parse).unwrap_or_default(),
            enabled: debug || level != "warn",
        }
    }

    /// Raise the level to `debug` when the configuration asks for query logs.
    pub fn with_config(mut self, config: &SinewConfig) -> Self {
        if config.debug.log_queries && matches!(self.level, "warn" | "error" | "info") {
            self.level = "debug";
            self.enabled = true;
        }
        self
    }

    /// Filter directive covering every sinew crate.
    pub fn directive(&self) -> String {
        format!(
            "sinew={level},sinew_query={level},sinew_schema={level}",
            level = self.level
        )
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes")
}

fn parse_level(value: &str) -> Option<&'static str> {
    match value.to_lowercase().as_str() {
        "trace" => Some("trace"),
        "debug" => Some("debug"),
        "info" => Some("info"),
        "warn" => Some("warn"),
        "error" => Some("error"),
        _ => None,
    }
}

/// Check if debug logging is enabled via `SINEW_DEBUG`.
#[inline]
pub fn is_debug_enabled() -> bool {
    env::var("SINEW_DEBUG").is_ok_and(|v| is_truthy(&v))
}

/// Install a subscriber from the environment. Later calls are no-ops.
pub fn init() {
    init_with(LogSettings::from_env());
}

/// Install a subscriber from the environment and `sinew.toml` settings.
pub fn init_with_config(config: &SinewConfig) {
    init_with(LogSettings::from_env().with_config(config));
}

/// Install a subscriber with explicit settings. Later calls are no-ops.
pub fn init_with(settings: LogSettings) {
    INIT.call_once(|| {
        if !settings.enabled {
            return;
        }

        #[cfg(feature = "tracing-subscriber")]
        {
            use tracing_subscriber::{EnvFilter, fmt, prelude::*};

            let filter = EnvFilter::try_new(settings.directive())
                .unwrap_or_else(|_| EnvFilter::new("warn"));
            let registry = tracing_subscriber::registry().with(filter);
            let installed = match settings.format {
                LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
                LogFormat::Compact => registry.with(fmt::layer().compact()).try_init(),
                LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
            };

            if installed.is_ok() {
                tracing::info!(
                    level = settings.level,
                    format = ?settings.format,
                    "Sinew logging initialized"
                );
            }
        }
    });
}
