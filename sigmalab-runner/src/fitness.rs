//! Fitness function: configurable objective for the parameter search.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::metrics::RunSummary;

/// Which objective a search maximizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitnessMetric {
    /// Median penalized terminal NAV over walk-forward windows.
    #[default]
    WalkForward,
    TerminalNav,
    Cagr,
    TotalReturn,
    CagrOverDrawdown,
}

impl FitnessMetric {
    pub const ALL: [FitnessMetric; 5] = [
        Self::WalkForward,
        Self::TerminalNav,
        Self::Cagr,
        Self::TotalReturn,
        Self::CagrOverDrawdown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::WalkForward => "walk_forward",
            Self::TerminalNav => "terminal_nav",
            Self::Cagr => "cagr",
            Self::TotalReturn => "total_return",
            Self::CagrOverDrawdown => "cagr_over_drawdown",
        }
    }

    /// Extract the metric from a full-sequence summary.
    ///
    /// `None` for the walk-forward score, which needs the snapshots.
    pub fn extract(&self, summary: &RunSummary) -> Option<f64> {
        match self {
            Self::WalkForward => None,
            Self::TerminalNav => Some(summary.terminal_nav),
            Self::Cagr => Some(summary.cagr),
            Self::TotalReturn => Some(summary.total_return),
            Self::CagrOverDrawdown => Some(summary.cagr_over_drawdown),
        }
    }

    /// Returns true if `a` is strictly better than `b`. NaN ranks below everything.
    pub fn is_better(&self, a: f64, b: f64) -> bool {
        rank_value(a) > rank_value(b)
    }
}

fn rank_value(v: f64) -> f64 {
    if v.is_nan() {
        f64::NEG_INFINITY
    } else {
        v
    }
}

impl fmt::Display for FitnessMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FitnessMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == key)
            .ok_or_else(|| {
                let names: Vec<_> = Self::ALL.iter().map(|m| m.as_str()).collect();
                format!("unknown metric '{s}', expected one of: {}", names.join(", "))
            })
    }
}
