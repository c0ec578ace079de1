//! Serializable simulation configuration, loaded from one TOML document.
//!
//! ```toml
//! [ledger]
//! start_contribution = 1000.0
//! periodic_contribution = 5000.0
//!
//! [params]
//! B1 = 0.22
//!
//! [walk_forward]
//! splits = 4
//!
//! [search]
//! trials = 120
//! seed = 42
//!
//! [window]
//! start = "2018-01-01"
//! ```
//!
//! Every section and every field is optional; missing values take the
//! documented defaults.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use sigmalab_core::domain::ParameterSet;
use sigmalab_core::engine::{EngineConfig, LedgerConfig, LedgerConfigError, StrategyConfig};

use crate::search::SearchConfig;
use crate::walk_forward::WalkForwardConfig;

/// Errors from loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid engine config: {0}")]
    Engine(#[from] LedgerConfigError),

    #[error("{field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Inclusive date filter applied after pause flags are computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DateWindow {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateWindow {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// The same window with `start <= end`. A reversed window is swapped.
    pub fn normalized(self) -> Self {
        match (self.start, self.end) {
            (Some(s), Some(e)) if s > e => {
                tracing::warn!(start = %s, end = %e, "window start after end; swapping");
                Self {
                    start: Some(e),
                    end: Some(s),
                }
            }
            _ => self,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

/// Complete configuration for simulate, score and optimize.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    pub ledger: LedgerConfig,
    pub strategy: StrategyConfig,
    pub params: ParameterSet,
    pub walk_forward: WalkForwardConfig,
    pub search: SearchConfig,
    pub window: DateWindow,
}

impl SimulationConfig {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&text)?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine().validate()?;
        self.walk_forward.validate()?;
        self.search.validate()?;
        Ok(())
    }

    /// The engine configuration for the configured parameter set.
    pub fn engine(&self) -> EngineConfig {
        EngineConfig::new(self.params, self.ledger, self.strategy)
    }
}
