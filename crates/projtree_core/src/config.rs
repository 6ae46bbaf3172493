//! Repository tuning loaded from JSON.
//!
//! # Invariants
//! - Every key is optional; missing keys take the documented defaults.
//! - `validate()` runs on every load path before the config is returned.

use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Default name of the persisted existence filter row.
pub const DEFAULT_BLOOM_FILTER_NAME: &str = "project:ids";

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read config: {err}"),
            Self::Parse(err) => write!(f, "failed to parse config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

/// Settings for `ProjectRepository` and its existence cache.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RepositoryConfig {
    /// Number of ids the Bloom filter is sized for.
    pub bloom_expected_items: usize,
    /// Target false-positive rate, exclusive range (0, 1).
    pub bloom_false_positive_rate: f64,
    pub bloom_filter_name: String,
    /// Upper bound on ancestry hops. `None` bounds by the project count.
    pub max_path_depth: Option<usize>,
    /// Whether id/name lookups return soft-deleted projects by default.
    pub lookups_include_deleted: bool,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            bloom_expected_items: 100_000,
            bloom_false_positive_rate: 0.01,
            bloom_filter_name: DEFAULT_BLOOM_FILTER_NAME.to_string(),
            max_path_depth: None,
            lookups_include_deleted: true,
        }
    }
}

impl RepositoryConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bloom_expected_items == 0 {
            return Err(ConfigError::Invalid(
                "bloom_expected_items must be greater than zero".to_string(),
            ));
        }
        let rate = self.bloom_false_positive_rate;
        if !(rate.is_finite() && rate > 0.0 && rate < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "bloom_false_positive_rate must be in (0, 1), got {rate}"
            )));
        }
        if self.bloom_filter_name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "bloom_filter_name must not be blank".to_string(),
            ));
        }
        if self.max_path_depth == Some(0) {
            return Err(ConfigError::Invalid(
                "max_path_depth must be at least 1 when set".to_string(),
            ));
        }
        Ok(())
    }
}
