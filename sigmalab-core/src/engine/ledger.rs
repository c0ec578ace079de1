//! Ledger engine: one sequential pass over the snapshots.
//!
//! Per day:
//! 1. Contribution credited to cash (net of the contribution fee)
//! 2. Precomputed pause flag synchronised into the strategy state
//! 3. Decision engine evaluated
//! 4. Trade sized and applied through [`Balances`]
//! 5. Ledger row recorded
//!
//! The performance series is derived from the finished rows.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::domain::{Action, BandSnapshot, LedgerRow};
use crate::indicators::rate_of_change;

use super::accounting::{Balances, Fill};
use super::config::{EngineConfig, LedgerConfig};
use super::decision::DecisionEngine;
use super::state::StrategyState;

const DAYS_PER_YEAR: f64 = 365.25;
/// Floor on the NAV/invested ratio before taking the annualising root.
const MIN_GROWTH_RATIO: f64 = 1e-12;

/// Output of one ledger pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerRun {
    pub rows: Vec<LedgerRow>,
    pub performance: PerformanceSeries,
    pub final_balances: FinalBalances,
}

/// End-of-run balances.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct FinalBalances {
    pub cash: f64,
    pub asset: f64,
}

impl From<Balances> for FinalBalances {
    fn from(b: Balances) -> Self {
        Self {
            cash: b.cash,
            asset: b.asset,
        }
    }
}

impl LedgerRun {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn navs(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.nav).collect()
    }

    pub fn terminal_nav(&self) -> f64 {
        self.rows.last().map_or(0.0, |r| r.nav)
    }

    pub fn count(&self, action: Action) -> usize {
        self.rows.iter().filter(|r| r.action == action).count()
    }
}

/// Cumulative contribution and return columns, aligned with the rows.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PerformanceSeries {
    pub contrib_gross_cum: Vec<f64>,
    pub contrib_net_cum: Vec<f64>,
    /// NAV / cumulative gross contributions - 1, zero while nothing is invested.
    pub total_return: Vec<f64>,
    /// Annualised from the first simulated day.
    pub cagr: Vec<f64>,
}

impl PerformanceSeries {
    pub fn from_rows(rows: &[LedgerRow]) -> Self {
        let Some(first) = rows.first().map(|r| r.date) else {
            return Self::default();
        };

        let mut out = Self {
            contrib_gross_cum: Vec::with_capacity(rows.len()),
            contrib_net_cum: Vec::with_capacity(rows.len()),
            total_return: Vec::with_capacity(rows.len()),
            cagr: Vec::with_capacity(rows.len()),
        };
        let mut gross = 0.0;
        let mut net = 0.0;
        for row in rows {
            gross += row.contrib_gross;
            net += row.contrib_net;
            out.contrib_gross_cum.push(gross);
            out.contrib_net_cum.push(net);

            let invested = gross;
            let years = elapsed_years(first, row.date);
            if invested > 0.0 {
                out.total_return.push(row.nav / invested - 1.0);
            } else {
                out.total_return.push(0.0);
            }
            if invested > 0.0 && years > 0.0 {
                let ratio = (row.nav / invested).max(MIN_GROWTH_RATIO);
                out.cagr.push(ratio.powf(1.0 / years) - 1.0);
            } else {
                out.cagr.push(0.0);
            }
        }
        out
    }

    pub fn final_total_return(&self) -> f64 {
        self.total_return.last().copied().unwrap_or(0.0)
    }

    pub fn final_cagr(&self) -> f64 {
        self.cagr.last().copied().unwrap_or(0.0)
    }
}

fn elapsed_years(first: NaiveDate, date: NaiveDate) -> f64 {
    (date - first).num_days() as f64 / DAYS_PER_YEAR
}

/// Gross contribution scheduled for day `index`.
pub fn scheduled_contribution(index: usize, date: NaiveDate, config: &LedgerConfig) -> f64 {
    let mut gross = if index == 0 {
        config.start_contribution
    } else {
        0.0
    };
    if config.periodic_only {
        if date.day() == 1 && (index != 0 || gross == 0.0) {
            gross += config.periodic_contribution;
        }
    } else {
        gross += config.periodic_contribution;
    }
    gross
}

/// Run the ledger over an ordered snapshot sequence with fresh state.
///
/// The config is expected to be validated by the caller.
pub fn run_ledger(snapshots: &[BandSnapshot], config: &EngineConfig) -> LedgerRun {
    let prices: Vec<f64> = snapshots.iter().map(|s| s.price).collect();
    let momentum = rate_of_change(&prices, config.strategy.momentum_length);
    let trade_fee_rate = config.ledger.trade_fee_rate();
    let engine = DecisionEngine::new(&config.params, &config.strategy);

    let mut state = StrategyState::new();
    let mut balances = Balances::default();
    let mut rows = Vec::with_capacity(snapshots.len());

    for (i, snap) in snapshots.iter().enumerate() {
        let price = snap.price;

        let contrib_gross = scheduled_contribution(i, snap.date, &config.ledger);
        let contrib_fee = config.ledger.contribution_fee(contrib_gross);
        let contrib_net = contrib_gross - contrib_fee;
        balances.credit_contribution(contrib_net);

        let was_paused = state.pause;
        if let Some(flag) = snap.pause {
            state.sync_pause(flag);
        }

        let decision = engine.decide(price, snap, momentum[i], &mut state);
        if state.pause != was_paused {
            tracing::debug!(date = %snap.date, paused = state.pause, "pause regime changed");
        }

        let fill = match decision.action {
            Action::Buy => balances.size_buy(decision.fraction, price, trade_fee_rate),
            Action::Sell => balances.size_sell(decision.fraction, price, trade_fee_rate),
            Action::Hold => Fill::None,
        };
        balances.apply(&fill);

        rows.push(LedgerRow {
            date: snap.date,
            price,
            band_bucket: snap.bands.bucket(price),
            momentum: momentum[i],
            paused: state.pause,
            action: decision.action,
            fraction: decision.fraction,
            rule: decision.rule,
            note: decision.note,
            trade_asset: fill.asset_amount(),
            trade_cash: fill.cash_amount(),
            fee_asset: fill.fee_asset(),
            contrib_gross,
            contrib_fee,
            contrib_net,
            cash_balance: balances.cash,
            asset_balance: balances.asset,
            nav: balances.nav(price),
        });
    }

    let performance = PerformanceSeries::from_rows(&rows);
    tracing::debug!(
        days = rows.len(),
        buys = rows.iter().filter(|r| r.action == Action::Buy).count(),
        sells = rows.iter().filter(|r| r.action == Action::Sell).count(),
        terminal_nav = rows.last().map_or(0.0, |r| r.nav),
        "ledger run complete"
    );

    LedgerRun {
        rows,
        performance,
        final_balances: balances.into(),
    }
}
