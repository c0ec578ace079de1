//! Summary metrics: pure functions over a finished ledger run.
//!
//! Every metric is a pure function: NAV and/or cash columns in, scalar out.
//! Drawdown and cash drag are fractions in [0, 1].

use serde::{Deserialize, Serialize};
use sigmalab_core::domain::{Action, LedgerRow};
use sigmalab_core::engine::LedgerRun;

/// Aggregate metrics for a single ledger run.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub days: usize,
    pub terminal_nav: f64,
    pub max_drawdown: f64,
    pub cash_drag: f64,
    pub total_return: f64,
    pub cagr: f64,
    pub cagr_over_drawdown: f64,
    pub contributed_gross: f64,
    pub contributed_net: f64,
    pub buys: usize,
    pub sells: usize,
    pub holds: usize,
    /// Trade fees paid, in asset units.
    pub trade_fees_asset: f64,
    /// Contribution fees paid, in cash.
    pub contribution_fees: f64,
}

impl RunSummary {
    pub fn from_run(run: &LedgerRun) -> Self {
        let navs = run.navs();
        let cash: Vec<f64> = run.rows.iter().map(|r| r.cash_balance).collect();
        let dd = max_drawdown(&navs);
        let cagr = run.performance.final_cagr();
        Self {
            days: run.len(),
            terminal_nav: run.terminal_nav(),
            max_drawdown: dd,
            cash_drag: cash_drag(&cash, &navs),
            total_return: run.performance.final_total_return(),
            cagr,
            cagr_over_drawdown: return_over_drawdown(cagr, dd),
            contributed_gross: last(&run.performance.contrib_gross_cum),
            contributed_net: last(&run.performance.contrib_net_cum),
            buys: run.count(Action::Buy),
            sells: run.count(Action::Sell),
            holds: run.count(Action::Hold),
            trade_fees_asset: total_trade_fees(&run.rows),
            contribution_fees: run.rows.iter().map(|r| r.contrib_fee).sum(),
        }
    }
}

fn last(series: &[f64]) -> f64 {
    series.last().copied().unwrap_or(0.0)
}

// ─── Individual metric functions ────────────────────────────────────

/// Replace non-finite values with the last finite one; leading gaps become 0.
pub fn forward_fill(values: &[f64]) -> Vec<f64> {
    let mut carry = 0.0;
    values
        .iter()
        .map(|&v| {
            if v.is_finite() {
                carry = v;
            }
            carry
        })
        .collect()
}

/// Largest peak-to-trough decline of the forward-filled NAV, as a fraction.
///
/// Days before the running peak turns positive contribute nothing.
pub fn max_drawdown(navs: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;
    for nav in forward_fill(navs) {
        peak = peak.max(nav);
        if peak > 0.0 {
            max_dd = max_dd.max((peak - nav) / peak);
        }
    }
    max_dd
}

/// Mean of cash / NAV clipped to [0, 1]. Days with zero NAV are excluded.
///
/// Returns 0.0 when no day is defined.
pub fn cash_drag(cash: &[f64], navs: &[f64]) -> f64 {
    let (sum, n) = cash
        .iter()
        .zip(navs)
        .filter(|(_, &nav)| nav != 0.0)
        .map(|(&c, &nav)| c / nav)
        .filter(|r| !r.is_nan())
        .fold((0.0, 0usize), |(s, n), r| (s + r.clamp(0.0, 1.0), n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

/// Annualized return per unit of drawdown. Zero when there is no drawdown.
pub fn return_over_drawdown(cagr: f64, max_drawdown: f64) -> f64 {
    if max_drawdown <= 0.0 {
        return 0.0;
    }
    cagr / max_drawdown
}

pub fn total_trade_fees(rows: &[LedgerRow]) -> f64 {
    rows.iter().map(|r| r.fee_asset).sum()
}
