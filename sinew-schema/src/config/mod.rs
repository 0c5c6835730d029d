//! Configuration file parsing for `sinew.toml`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use crate::error::{SchemaError, SchemaResult};

/// Main configuration structure for `sinew.toml`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SinewConfig {
    /// Preload settings.
    #[serde(default)]
    pub preload: PreloadSettings,

    /// Debug/logging settings.
    #[serde(default)]
    pub debug: DebugConfig,

    /// Environment-specific overrides.
    #[serde(default)]
    pub environments: HashMap<String, EnvironmentOverride>,
}

impl SinewConfig {
    /// Load configuration from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> SchemaResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| SchemaError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> SchemaResult<Self> {
        let expanded = expand_env_vars(content);

        let config: Self =
            toml::from_str(&expanded).map_err(|e| SchemaError::TomlError { source: e })?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment-specific overrides.
    pub fn with_environment(mut self, env: &str) -> Self {
        if let Some(overrides) = self.environments.remove(env) {
            if let Some(preload) = overrides.preload {
                if let Some(warning) = preload.key_set_warning {
                    self.preload.key_set_warning = warning;
                }
                if let Some(timeout) = preload.query_timeout {
                    self.preload.query_timeout = Some(timeout);
                }
            }
            if let Some(debug) = overrides.debug {
                if let Some(log_queries) = debug.log_queries {
                    self.debug.log_queries = log_queries;
                }
                if let Some(threshold) = debug.slow_query_threshold {
                    self.debug.slow_query_threshold = threshold;
                }
            }
        }
        self
    }

    fn validate(&self) -> SchemaResult<()> {
        if self.preload.key_set_warning == 0 {
            return Err(SchemaError::ConfigError {
                message: "preload.key_set_warning must be greater than zero".to_string(),
            });
        }
        if self.preload.query_timeout == Some(0) {
            return Err(SchemaError::ConfigError {
                message: "preload.query_timeout must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Preload settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PreloadSettings {
    /// Warn when a single step collects more keys than this.
    #[serde(default = "default_key_set_warning")]
    pub key_set_warning: usize,

    /// Per-query timeout in milliseconds. Unset means no timeout.
    #[serde(default)]
    pub query_timeout: Option<u64>,
}

impl Default for PreloadSettings {
    fn default() -> Self {
        Self {
            key_set_warning: default_key_set_warning(),
            query_timeout: None,
        }
    }
}

fn default_key_set_warning() -> usize { 1000 }

/// Debug/logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DebugConfig {
    /// Log every secondary query.
    #[serde(default)]
    pub log_queries: bool,

    /// Slow query threshold in milliseconds.
    #[serde(default = "default_slow_query_threshold")]
    pub slow_query_threshold: u64,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_queries: false,
            slow_query_threshold: default_slow_query_threshold(),
        }
    }
}

fn default_slow_query_threshold() -> u64 { 1000 }

/// Environment-specific configuration overrides.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentOverride {
    /// Preload overrides.
    pub preload: Option<PreloadOverride>,

    /// Debug overrides.
    pub debug: Option<DebugOverride>,
}

/// Preload configuration overrides.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PreloadOverride {
    /// Override key_set_warning.
    pub key_set_warning: Option<usize>,

    /// Override query_timeout.
    pub query_timeout: Option<u64>,
}

/// Debug configuration overrides.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DebugOverride {
    /// Override log_queries.
    pub log_queries: Option<bool>,

    /// Override slow_query_threshold.
    pub slow_query_threshold: Option<u64>,
}

static ENV_VAR: LazyLock<Option<regex_lite::Regex>> =
    LazyLock::new(|| regex_lite::Regex::new(r"\$\{([^}]+)\}").ok());

/// Expand environment variables in the format `${VAR_NAME}`.
///
/// Unset variables are left as written.
fn expand_env_vars(content: &str) -> String {
    let Some(re) = ENV_VAR.as_ref() else {
        return content.to_string();
    };

    re.replace_all(content, |caps: &regex_lite::Captures<'_>| {
        std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
    })
    .into_owned()
}
