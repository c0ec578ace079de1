//! SigmaLab Core: band snapshots, regime tracking, decision rules, ledger simulation.
//!
//! This crate contains the deterministic simulation engine:
//! - Domain types (bands, snapshots, parameter sets, decisions, ledger rows)
//! - Band snapshot normalizer for the two supported feed layouts
//! - Pause latch precomputed over the full history
//! - Per-day decision engine with retrace exceptions and a momentum gate
//! - Ledger loop with contribution scheduling and asset-side trade fees
//! - Content fingerprints and a seeded RNG hierarchy for the search layer

pub mod data;
pub mod domain;
pub mod engine;
pub mod fingerprint;
pub mod fixtures;
pub mod indicators;
pub mod rng;

pub use data::{normalize_payload, normalize_rows, FeedRow, NormalizeError, RawField};
pub use domain::{
    Action, BandBucket, BandLevel, BandSnapshot, Bands, Decision, LedgerRow, ParamError,
    ParameterSet, PauseFlag, Rule, Tier,
};
pub use engine::{
    attach_pause_flags, run_ledger, EngineConfig, LedgerConfig, LedgerConfigError, LedgerRun,
    StrategyConfig,
};
