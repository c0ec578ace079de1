//! Simulation engine: regime tracking, rule evaluation, and the ledger loop.
//!
//! The ledger loop consumes an ordered snapshot sequence (optionally carrying
//! precomputed pause flags) and, per day:
//!
//! 1. Credits the scheduled contribution
//! 2. Synchronises the pause regime
//! 3. Evaluates the decision rules
//! 4. Sizes and applies the trade

pub mod accounting;
pub mod config;
pub mod decision;
pub mod ledger;
pub mod regime;
pub mod state;

pub use accounting::{replay_balances, Balances, Fill};
pub use config::{EngineConfig, LedgerConfig, LedgerConfigError, StrategyConfig, BPS};
pub use decision::DecisionEngine;
pub use ledger::{run_ledger, scheduled_contribution, FinalBalances, LedgerRun, PerformanceSeries};
pub use regime::{attach_pause_flags, compute_pause_flags, next_pause, PauseLatch};
pub use state::StrategyState;
