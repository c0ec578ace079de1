//! Run orchestration: wires together loading, the ledger, scoring and search.
//!
//! Two layers of entry points:
//! - `simulate()`, `score()`, `optimize()`: take pre-loaded snapshots, no I/O.
//! - `run_simulation()`, `run_scoring()`, `run_optimization()`: load a feed
//!   file through the configured window first. Used by the CLI.

use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use sigmalab_core::domain::{BandSnapshot, ParameterSet};
use sigmalab_core::engine::{run_ledger, EngineConfig, LedgerConfigError, LedgerRun};
use sigmalab_core::fingerprint::RunFingerprint;

use crate::config::{ConfigError, SimulationConfig};
use crate::data_loader::{load_bands, LoadError};
use crate::metrics::RunSummary;
use crate::search::{run_search, SearchError, SearchResult};
use crate::walk_forward::{self, WalkForwardResult};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid engine config: {0}")]
    Engine(#[from] LedgerConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("search error: {0}")]
    Search(#[from] SearchError),
    #[error("no snapshots to simulate")]
    NoSnapshots,
}

/// Complete result of one ledger run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationResult {
    pub fingerprint: RunFingerprint,
    pub config: EngineConfig,
    pub summary: RunSummary,
    pub run: LedgerRun,
}

/// Walk-forward score with the identity of what was scored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreResult {
    pub fingerprint: RunFingerprint,
    pub walk_forward: WalkForwardResult,
}

/// Full-sequence metrics of the configured parameter set against the best found.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Comparison {
    pub baseline_params: ParameterSet,
    pub baseline: RunSummary,
    pub best_params: ParameterSet,
    pub best: RunSummary,
}

impl Comparison {
    /// Terminal NAV change in percent. `None` when the baseline NAV is not positive.
    pub fn nav_improvement_pct(&self) -> Option<f64> {
        (self.baseline.terminal_nav > 0.0)
            .then(|| (self.best.terminal_nav / self.baseline.terminal_nav - 1.0) * 100.0)
    }

    pub fn drawdown_delta(&self) -> f64 {
        self.best.max_drawdown - self.baseline.max_drawdown
    }

    pub fn drag_delta(&self) -> f64 {
        self.best.cash_drag - self.baseline.cash_drag
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationResult {
    pub search: SearchResult,
    pub comparison: Comparison,
    /// Full run under the best parameter set.
    pub best_run: SimulationResult,
}

// ─── Pre-loaded entry points ────────────────────────────────────────

/// Validate `config` and run the ledger once over `snapshots`.
pub fn simulate(
    snapshots: &[BandSnapshot],
    config: &EngineConfig,
) -> Result<SimulationResult, RunError> {
    if snapshots.is_empty() {
        return Err(RunError::NoSnapshots);
    }
    config.validate()?;

    let run = run_ledger(snapshots, config);
    let summary = RunSummary::from_run(&run);
    let fingerprint = RunFingerprint::new(config, snapshots);
    tracing::debug!(
        config = %fingerprint.config_hash.short(),
        days = summary.days,
        terminal_nav = summary.terminal_nav,
        "simulation finished"
    );
    Ok(SimulationResult {
        fingerprint,
        config: *config,
        summary,
        run,
    })
}

/// Walk-forward score of the configured parameter set.
pub fn score(snapshots: &[BandSnapshot], config: &SimulationConfig) -> Result<ScoreResult, RunError> {
    if snapshots.is_empty() {
        return Err(RunError::NoSnapshots);
    }
    config.validate()?;
    let engine = config.engine();
    Ok(ScoreResult {
        fingerprint: RunFingerprint::new(&engine, snapshots),
        walk_forward: walk_forward::evaluate(snapshots, &engine, &config.walk_forward),
    })
}

/// Search for a better parameter set and compare it with the configured one.
pub fn optimize(
    snapshots: &[BandSnapshot],
    config: &SimulationConfig,
) -> Result<OptimizationResult, RunError> {
    config.validate()?;
    let engine = config.engine();

    let search = run_search(snapshots, &engine, &config.walk_forward, &config.search)?;
    let baseline = simulate(snapshots, &engine)?;
    let best_run = simulate(snapshots, &engine.with_params(search.best.params))?;

    let comparison = Comparison {
        baseline_params: engine.params,
        baseline: baseline.summary,
        best_params: search.best.params,
        best: best_run.summary,
    };
    Ok(OptimizationResult {
        search,
        comparison,
        best_run,
    })
}

// ─── File entry points ──────────────────────────────────────────────

pub fn run_simulation(input: &Path, config: &SimulationConfig) -> Result<SimulationResult, RunError> {
    config.validate()?;
    let loaded = load_bands(input, config.window)?;
    simulate(&loaded.snapshots, &config.engine())
}

pub fn run_scoring(input: &Path, config: &SimulationConfig) -> Result<ScoreResult, RunError> {
    config.validate()?;
    let loaded = load_bands(input, config.window)?;
    score(&loaded.snapshots, config)
}

pub fn run_optimization(
    input: &Path,
    config: &SimulationConfig,
) -> Result<OptimizationResult, RunError> {
    config.validate()?;
    let loaded = load_bands(input, config.window)?;
    optimize(&loaded.snapshots, config)
}
