//! Decision output: action, sizing fraction, rule and note.

use serde::{Deserialize, Serialize, Serializer};

use super::params::Tier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
            Self::Hold => "HOLD",
        }
    }
}

/// Which rule produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Ordinary band tier.
    Base(Tier),
    /// Visited [+1.5σ, +2.0σ), now back in [+0.5σ, +1.0σ).
    RetraceB9ToB7,
    /// Visited [+1.0σ, +1.5σ), now back in [mean, +0.5σ).
    RetraceB8ToB6,
    /// Buying suppressed by the pause regime.
    Pause,
    /// Mid-tier sell blocked by the momentum gate.
    MomentumHold,
}

impl Rule {
    pub fn label(self) -> &'static str {
        match self {
            Self::Base(tier) => tier.label(),
            Self::RetraceB9ToB7 => "Base 3 (retrace B9→B7)",
            Self::RetraceB8ToB6 => "Base 3 (retrace B8→B6)",
            Self::Pause => "Pause",
            Self::MomentumHold => "Hold (momo≤threshold)",
        }
    }

    pub fn is_retrace(self) -> bool {
        matches!(self, Self::RetraceB9ToB7 | Self::RetraceB8ToB6)
    }
}

impl Serialize for Rule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Result of evaluating the trading rules for one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub action: Action,
    /// Fraction of cash (BUY) or asset (SELL) to trade; 0 for HOLD.
    pub fraction: f64,
    pub rule: Rule,
    pub note: String,
}

impl Decision {
    pub fn buy(fraction: f64, rule: Rule, note: impl Into<String>) -> Self {
        Self {
            action: Action::Buy,
            fraction,
            rule,
            note: note.into(),
        }
    }

    pub fn sell(fraction: f64, rule: Rule, note: impl Into<String>) -> Self {
        Self {
            action: Action::Sell,
            fraction,
            rule,
            note: note.into(),
        }
    }

    pub fn hold(rule: Rule, note: impl Into<String>) -> Self {
        Self {
            action: Action::Hold,
            fraction: 0.0,
            rule,
            note: note.into(),
        }
    }
}
