//! Domain types for SigmaLab

pub mod band;
pub mod decision;
pub mod ledger_row;
pub mod params;
pub mod snapshot;

pub use band::{BandBucket, BandLevel, Bands, OUT_OF_RANGE_LABEL};
pub use decision::{Action, Decision, Rule};
pub use ledger_row::LedgerRow;
pub use params::{ParamError, ParameterSet, Tier};
pub use snapshot::{BandSnapshot, PauseFlag};
