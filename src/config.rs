//! Configuration loaded from a TOML file.
//!
//! Every field has a default, so a missing file or an empty table yields the
//! built-in behavior.

use crate::error::ConfigError;
use crate::model::{Catalog, Discipline};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

const DEFAULT_REQUIRED_PARAMETERS: &[&str] = &[
    "Assembly Code",
    "Assembly Description",
    "Manufacturer",
    "Model",
];

/// Denominator used when a category requires no parameters.
pub const DEFAULT_FALLBACK_PARAMETER_COUNT: usize = DEFAULT_REQUIRED_PARAMETERS.len();

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub analysis: AnalysisSettings,
    pub required_parameters: RequiredParameters,
    /// Replaces the built-in catalog when present.
    pub disciplines: Option<Vec<Discipline>>,
}

impl AppConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(&path).map_err(|source| ConfigError::FileRead {
                path: path.as_ref().to_path_buf(),
                source,
            })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        // Surface catalog problems at load time rather than at first use.
        config.catalog()?;
        Ok(config)
    }

    pub fn catalog(&self) -> Result<Catalog, ConfigError> {
        match &self.disciplines {
            Some(disciplines) => Catalog::from_disciplines(disciplines.clone()),
            None => Ok(Catalog::builtin()),
        }
    }
}

/// Pacing and scoring knobs for a discipline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Cooldown between two category queries.
    pub inter_call_delay_ms: u64,
    /// Upper bound for one category query.
    pub category_timeout_ms: u64,
    /// Denominator used when a category has no required parameters.
    pub fallback_parameter_count: usize,
}

impl AnalysisSettings {
    #[must_use]
    pub fn inter_call_delay(&self) -> Duration {
        Duration::from_millis(self.inter_call_delay_ms)
    }

    #[must_use]
    pub fn category_timeout(&self) -> Duration {
        Duration::from_millis(self.category_timeout_ms)
    }
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            inter_call_delay_ms: 100,
            category_timeout_ms: 5_000,
            fallback_parameter_count: DEFAULT_FALLBACK_PARAMETER_COUNT,
        }
    }
}

/// Required parameter names, keyed by category id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequiredParameters {
    pub default: Vec<String>,
    pub overrides: HashMap<String, Vec<String>>,
}

impl RequiredParameters {
    #[must_use]
    pub fn for_category(&self, category_id: &str) -> &[String] {
        self.overrides
            .get(category_id)
            .map_or(self.default.as_slice(), Vec::as_slice)
    }
}

impl Default for RequiredParameters {
    fn default() -> Self {
        Self {
            default: DEFAULT_REQUIRED_PARAMETERS
                .iter()
                .map(|name| (*name).to_string())
                .collect(),
            overrides: HashMap::new(),
        }
    }
}
