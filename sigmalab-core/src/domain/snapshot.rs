//! BandSnapshot: the canonical per-day input record.

use chrono::NaiveDate;
use serde::Serialize;

use super::band::Bands;

/// Precomputed pause regime for one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PauseFlag {
    pub paused: bool,
    /// Pause became true today having been false yesterday.
    pub entered_today: bool,
}

/// One calendar day: price plus the ten band thresholds.
///
/// `pause` is `None` until the regime tracker has run over the full history;
/// the decision engine derives the regime inline when it is absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandSnapshot {
    pub date: NaiveDate,
    pub price: f64,
    pub bands: Bands,
    pub pause: Option<PauseFlag>,
}

impl BandSnapshot {
    pub fn new(date: NaiveDate, price: f64, bands: Bands) -> Self {
        Self {
            date,
            price,
            bands,
            pause: None,
        }
    }
}
