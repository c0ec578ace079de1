//! SigmaLab Runner: simulation orchestration, walk-forward scoring, search.
//!
//! This crate builds on `sigmalab-core` to provide:
//! - TOML configuration with documented defaults
//! - Band feed loading (CSV/JSON) with look-back pause flags and date windows
//! - Summary metrics (drawdown, cash drag, returns, fees)
//! - Walk-forward robust scoring
//! - Seeded parallel parameter search
//! - Ledger CSV and summary JSON export

pub mod config;
pub mod data_loader;
pub mod export;
pub mod fitness;
pub mod metrics;
pub mod runner;
pub mod search;
pub mod walk_forward;

pub use config::{ConfigError, DateWindow, SimulationConfig};
pub use data_loader::{load_bands, read_snapshots, LoadError, LoadedBands};
pub use export::{
    export_ledger_csv, export_score_json, export_summary_json, render_comparison,
    render_summary, save_ledger_csv, write_with_fallback,
};
pub use fitness::FitnessMetric;
pub use metrics::RunSummary;
pub use runner::{
    optimize, run_optimization, run_scoring, run_simulation, score, simulate, Comparison,
    OptimizationResult, RunError, ScoreResult, SimulationResult,
};
pub use search::{run_search, SearchConfig, SearchError, SearchResult, Trial};
pub use walk_forward::{time_splits, FoldWindow, WalkForwardConfig, WalkForwardResult};
