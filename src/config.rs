// Configuration - ingestion, session and logging settings
// Defaults for everything; a JSON file and LAB_INSIGHTS_* variables override.

use crate::error::ConfigError;
use crate::parser::ParserOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Inputs above this size ask for confirmation before parsing (20 MiB)
pub const DEFAULT_SIZE_WARNING_BYTES: u64 = 20 * 1024 * 1024;

/// Row warnings shown to the user per load
pub const DEFAULT_MAX_DISPLAYED_WARNINGS: usize = 5;

/// Quiet period after the last filter change before recomputing
pub const DEFAULT_DEBOUNCE_MS: u64 = 250;

/// Bars in the top-markers chart
pub const DEFAULT_TOP_MARKERS: usize = 10;

const ENV_SIZE_WARNING_BYTES: &str = "LAB_INSIGHTS_SIZE_WARNING_BYTES";
const ENV_DEBOUNCE_MS: &str = "LAB_INSIGHTS_DEBOUNCE_MS";
const ENV_TOP_MARKERS: &str = "LAB_INSIGHTS_TOP_MARKERS";

/// Ingestion settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Soft size threshold in bytes; not a hard cap
    pub size_warning_bytes: u64,

    /// Cap on row warnings surfaced with a load (all are still logged)
    pub max_displayed_warnings: usize,

    /// Whether the first line carries column names
    pub has_headers: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            size_warning_bytes: DEFAULT_SIZE_WARNING_BYTES,
            max_displayed_warnings: DEFAULT_MAX_DISPLAYED_WARNINGS,
            has_headers: true,
        }
    }
}

impl IngestConfig {
    pub fn parser_options(&self) -> ParserOptions {
        ParserOptions {
            has_headers: self.has_headers,
        }
    }
}

/// Interactive session settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub debounce_ms: u64,
    pub top_markers: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            top_markers: DEFAULT_TOP_MARKERS,
        }
    }
}

impl SessionConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is not set
    pub default_filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default_filter: "info".to_string(),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ingest: IngestConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Parse and validate a JSON document; missing keys take defaults
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        debug!(path = %path.display(), "loaded config file");
        Self::from_json_str(&text)
    }

    /// Apply `LAB_INSIGHTS_*` environment overrides on top of `self`
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup (environment in production,
    /// a map in tests)
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_SIZE_WARNING_BYTES) {
            self.ingest.size_warning_bytes = parse_override(ENV_SIZE_WARNING_BYTES, &raw)?;
        }
        if let Some(raw) = lookup(ENV_DEBOUNCE_MS) {
            self.session.debounce_ms = parse_override(ENV_DEBOUNCE_MS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_TOP_MARKERS) {
            self.session.top_markers = parse_override(ENV_TOP_MARKERS, &raw)?;
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session.debounce_ms == 0 {
            return Err(ConfigError::invalid_value(
                "session.debounce_ms",
                "must be greater than zero",
            ));
        }
        if self.session.top_markers == 0 {
            return Err(ConfigError::invalid_value(
                "session.top_markers",
                "must be greater than zero",
            ));
        }
        if self.ingest.max_displayed_warnings == 0 {
            return Err(ConfigError::invalid_value(
                "ingest.max_displayed_warnings",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

fn parse_override<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::invalid_value(key, format!("'{}' is not a valid number", raw)))
}
