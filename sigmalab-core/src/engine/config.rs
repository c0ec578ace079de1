//! Engine configuration: contribution/fee economics and strategy knobs.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{ParamError, ParameterSet};

/// Basis points per unit.
pub const BPS: f64 = 10_000.0;

#[derive(Debug, Error, PartialEq)]
pub enum LedgerConfigError {
    #[error("{field} must be finite and non-negative, got {value}")]
    NegativeAmount { field: &'static str, value: f64 },

    #[error("{field} must be within [0, 10000] bps, got {bps}")]
    FeeOutOfRange { field: &'static str, bps: f64 },

    #[error("momentum_length must be at least 1")]
    ZeroMomentumLength,

    #[error("momentum_threshold must be finite, got {0}")]
    NonFiniteThreshold(f64),

    #[error(transparent)]
    Params(#[from] ParamError),
}

/// Contribution schedule and fee rates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// One-time cash seed credited on the first simulated day.
    pub start_contribution: f64,
    /// Recurring contribution amount.
    pub periodic_contribution: f64,
    /// Contribute only on the first day of each month; otherwise every day.
    pub periodic_only: bool,
    /// Trade fee, charged in asset units.
    pub trade_fee_bps: f64,
    /// Contribution fee, charged in cash.
    pub contribution_fee_bps: f64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            start_contribution: 0.0,
            periodic_contribution: 5_000.0,
            periodic_only: true,
            trade_fee_bps: 8.0,
            contribution_fee_bps: 18.0,
        }
    }
}

impl LedgerConfig {
    /// No fees, a seed amount, and no recurring contributions.
    pub fn seeded(start_contribution: f64) -> Self {
        Self {
            start_contribution,
            periodic_contribution: 0.0,
            periodic_only: true,
            trade_fee_bps: 0.0,
            contribution_fee_bps: 0.0,
        }
    }

    pub fn trade_fee_rate(&self) -> f64 {
        self.trade_fee_bps / BPS
    }

    /// Cash fee charged on a gross contribution.
    pub fn contribution_fee(&self, gross: f64) -> f64 {
        gross * self.contribution_fee_bps / BPS
    }

    pub fn validate(&self) -> Result<(), LedgerConfigError> {
        for (field, value) in [
            ("start_contribution", self.start_contribution),
            ("periodic_contribution", self.periodic_contribution),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(LedgerConfigError::NegativeAmount { field, value });
            }
        }
        for (field, bps) in [
            ("trade_fee_bps", self.trade_fee_bps),
            ("contribution_fee_bps", self.contribution_fee_bps),
        ] {
            if !(bps.is_finite() && (0.0..=BPS).contains(&bps)) {
                return Err(LedgerConfigError::FeeOutOfRange { field, bps });
            }
        }
        Ok(())
    }
}

/// Rule knobs. Defaults give the standard rule set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// Look-back of the rate-of-change feature.
    pub momentum_length: usize,
    /// Mid-tier sells proceed when momentum is strictly above this value.
    pub momentum_threshold: f64,
    /// Track upper-band visits and fire retrace buys.
    pub retrace_enabled: bool,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            momentum_length: 5,
            momentum_threshold: 0.0,
            retrace_enabled: true,
        }
    }
}

impl StrategyConfig {
    pub fn validate(&self) -> Result<(), LedgerConfigError> {
        if self.momentum_length == 0 {
            return Err(LedgerConfigError::ZeroMomentumLength);
        }
        if !self.momentum_threshold.is_finite() {
            return Err(LedgerConfigError::NonFiniteThreshold(self.momentum_threshold));
        }
        Ok(())
    }
}

/// Everything one simulation run needs besides the snapshots.
///
/// Each run owns its copy; nothing here is shared mutably between runs.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    pub params: ParameterSet,
    pub ledger: LedgerConfig,
    pub strategy: StrategyConfig,
}

impl EngineConfig {
    pub fn new(params: ParameterSet, ledger: LedgerConfig, strategy: StrategyConfig) -> Self {
        Self {
            params,
            ledger,
            strategy,
        }
    }

    pub fn with_params(&self, params: ParameterSet) -> Self {
        Self { params, ..*self }
    }

    pub fn validate(&self) -> Result<(), LedgerConfigError> {
        self.params.validate()?;
        self.ledger.validate()?;
        self.strategy.validate()
    }
}
