//! Run fingerprinting: deterministic identification of simulation inputs.
//!
//! - `ContentHash`: BLAKE3 digest, displayed as hex.
//! - `config_hash`: parameter set + ledger config + strategy config.
//! - `dataset_hash`: dates, prices and thresholds of a snapshot sequence.
//! - `RunFingerprint`: both hashes plus the date range they cover.
//!
//! Floats are hashed by their little-endian bytes, so `0.1` and
//! `0.1000000000000001` hash differently and NaN payloads are preserved.

use std::fmt;

use chrono::NaiveDate;
use serde::{Serialize, Serializer};

use crate::domain::{BandLevel, BandSnapshot, Tier};
use crate::engine::EngineConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// First 12 hex characters, for log lines and file names.
    pub fn short(&self) -> String {
        self.to_string()[..12].to_string()
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0 {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

impl Serialize for ContentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl From<blake3::Hash> for ContentHash {
    fn from(h: blake3::Hash) -> Self {
        Self(*h.as_bytes())
    }
}

/// Hash of everything that configures a run.
pub fn config_hash(config: &EngineConfig) -> ContentHash {
    let mut h = blake3::Hasher::new();
    h.update(b"params");
    for tier in Tier::ALL {
        h.update(&config.params.fraction(tier).to_le_bytes());
    }
    let l = &config.ledger;
    h.update(b"ledger");
    h.update(&l.start_contribution.to_le_bytes());
    h.update(&l.periodic_contribution.to_le_bytes());
    h.update(&[u8::from(l.periodic_only)]);
    h.update(&l.trade_fee_bps.to_le_bytes());
    h.update(&l.contribution_fee_bps.to_le_bytes());
    let s = &config.strategy;
    h.update(b"strategy");
    h.update(&(s.momentum_length as u64).to_le_bytes());
    h.update(&s.momentum_threshold.to_le_bytes());
    h.update(&[u8::from(s.retrace_enabled)]);
    h.finalize().into()
}

/// Hash of a snapshot sequence's content. Pause flags are not included.
pub fn dataset_hash(snapshots: &[BandSnapshot]) -> ContentHash {
    let mut h = blake3::Hasher::new();
    for s in snapshots {
        h.update(s.date.to_string().as_bytes());
        h.update(&s.price.to_le_bytes());
        for level in BandLevel::ALL {
            h.update(&s.bands.raw(level).to_le_bytes());
        }
    }
    h.finalize().into()
}

/// Identity of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunFingerprint {
    pub config_hash: ContentHash,
    pub dataset_hash: ContentHash,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub days: usize,
}

impl RunFingerprint {
    pub fn new(config: &EngineConfig, snapshots: &[BandSnapshot]) -> Self {
        Self {
            config_hash: config_hash(config),
            dataset_hash: dataset_hash(snapshots),
            start_date: snapshots.first().map(|s| s.date),
            end_date: snapshots.last().map(|s| s.date),
            days: snapshots.len(),
        }
    }
}
