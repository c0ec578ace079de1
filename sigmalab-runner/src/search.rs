//! Parameter search: seeded random search over monotone tier ladders.
//!
//! Proposals are built from a first tier and per-step ratios, so buy tiers
//! never increase from tier 1 to tier 5 and sell tiers never decrease from
//! tier 6 to tier 10:
//!
//! - B1 in [0.05, 0.30], B(n+1) = B(n) x ratio, ratio in [0.30, 0.95]
//! - B6 in [0.001, 0.03], B(n+1) = B(n) x multiplier, multiplier in [1.10, 3.00]
//! - B11 capped at 0.35, other sell tiers at 1.0 (a full-balance sell)
//!
//! Trials are scored in parallel. Trial `i` draws from its own RNG derived
//! from `(seed, i)`, so the outcome does not depend on thread count.

use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use sigmalab_core::domain::{BandSnapshot, ParameterSet};
use sigmalab_core::engine::{run_ledger, EngineConfig};
use sigmalab_core::rng::RngHierarchy;

use crate::config::ConfigError;
use crate::fitness::FitnessMetric;
use crate::metrics::RunSummary;
use crate::walk_forward::{self, WalkForwardConfig};

const RNG_STREAM: &str = "search";

const BUY_FIRST: (f64, f64) = (0.05, 0.30);
const BUY_RATIO: (f64, f64) = (0.30, 0.95);
const SELL_FIRST: (f64, f64) = (0.001, 0.03);
const SELL_MULTIPLIER: (f64, f64) = (1.10, 3.00);
const TOP_SELL_CAP: f64 = 0.35;

// ─── Configuration ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    pub trials: usize,
    pub seed: u64,
    pub metric: FitnessMetric,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            trials: 120,
            seed: 42,
            metric: FitnessMetric::default(),
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trials == 0 {
            return Err(ConfigError::invalid("search.trials", "must be at least 1"));
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search needs at least one trial")]
    NoTrials,
    #[error("no snapshots to search over")]
    EmptyInput,
}

// ─── Results ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    pub index: usize,
    pub params: ParameterSet,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub metric: FitnessMetric,
    pub seed: u64,
    pub best: Trial,
    /// Every trial, in index order.
    pub trials: Vec<Trial>,
}

// ─── Proposal ────────────────────────────────────────────────────────

/// Draw one monotone parameter set.
pub fn suggest<R: Rng>(rng: &mut R) -> ParameterSet {
    let mut v = [0.0; 11];

    let mut tier = rng.gen_range(BUY_FIRST.0..=BUY_FIRST.1);
    v[0] = tier;
    for slot in v.iter_mut().take(5).skip(1) {
        tier *= rng.gen_range(BUY_RATIO.0..=BUY_RATIO.1);
        *slot = tier;
    }

    // Chained on the uncapped values; the caps apply to the stored tiers only.
    let mut chain = rng.gen_range(SELL_FIRST.0..=SELL_FIRST.1);
    v[5] = chain;
    for slot in v.iter_mut().take(10).skip(6) {
        chain *= rng.gen_range(SELL_MULTIPLIER.0..=SELL_MULTIPLIER.1);
        *slot = chain.min(1.0);
    }
    chain *= rng.gen_range(SELL_MULTIPLIER.0..=SELL_MULTIPLIER.1);
    v[10] = chain.min(TOP_SELL_CAP);

    ParameterSet::from_array(v)
}

/// The parameter set of trial `index` under `seed`.
pub fn trial_params(seed: u64, index: usize) -> ParameterSet {
    let mut rng = RngHierarchy::new(seed).rng_for(RNG_STREAM, index as u64);
    suggest(&mut rng)
}

// ─── Objective ───────────────────────────────────────────────────────

/// Score `engine` against `snapshots` under `metric`.
pub fn objective(
    metric: FitnessMetric,
    snapshots: &[BandSnapshot],
    engine: &EngineConfig,
    walk_forward: &WalkForwardConfig,
) -> f64 {
    match metric {
        FitnessMetric::WalkForward => walk_forward::score(snapshots, engine, walk_forward),
        other => {
            let summary = RunSummary::from_run(&run_ledger(snapshots, engine));
            other.extract(&summary).unwrap_or(f64::NAN)
        }
    }
}

/// Run `search.trials` proposals and keep the best.
///
/// Ledger and strategy settings come from `base`; its parameter set is
/// replaced per trial. Ties go to the lowest trial index.
pub fn run_search(
    snapshots: &[BandSnapshot],
    base: &EngineConfig,
    walk_forward: &WalkForwardConfig,
    search: &SearchConfig,
) -> Result<SearchResult, SearchError> {
    if search.trials == 0 {
        return Err(SearchError::NoTrials);
    }
    if snapshots.is_empty() {
        return Err(SearchError::EmptyInput);
    }
    tracing::info!(
        trials = search.trials,
        seed = search.seed,
        metric = %search.metric,
        days = snapshots.len(),
        "parameter search started"
    );

    let trials: Vec<Trial> = (0..search.trials)
        .into_par_iter()
        .map(|index| {
            let params = trial_params(search.seed, index);
            let engine = base.with_params(params);
            let score = objective(search.metric, snapshots, &engine, walk_forward);
            tracing::debug!(trial = index, score, "trial scored");
            Trial {
                index,
                params,
                score,
            }
        })
        .collect();

    let mut best = trials[0];
    for t in &trials[1..] {
        if search.metric.is_better(t.score, best.score) {
            best = *t;
        }
    }
    tracing::info!(best_trial = best.index, best_score = best.score, "parameter search finished");

    Ok(SearchResult {
        metric: search.metric,
        seed: search.seed,
        best,
        trials,
    })
}
