//! Regime tracker: the sticky bear-market pause latch.
//!
//! Pause is entered when price closes above +2.0σ and left only when price
//! closes below −1.0σ. Between the two thresholds the previous state carries
//! forward. The flags are precomputed once over the full look-back history so
//! that a simulation starting mid-history inherits the correct regime.

use crate::domain::{BandLevel, BandSnapshot, Bands, PauseFlag};

/// Two-state latch with hysteresis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PauseLatch {
    paused: bool,
}

impl PauseLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance one day and report the resulting flag.
    pub fn update(&mut self, price: f64, bands: &Bands) -> PauseFlag {
        let prev = self.paused;
        self.paused = next_pause(prev, price, bands);
        PauseFlag {
            paused: self.paused,
            entered_today: self.paused && !prev,
        }
    }
}

/// One latch step. Entry is checked first and wins if both conditions hold.
pub fn next_pause(paused: bool, price: f64, bands: &Bands) -> bool {
    if is_pause_entry(price, bands) {
        true
    } else if is_pause_exit(price, bands) {
        false
    } else {
        paused
    }
}

/// Price above the +2.0σ threshold.
pub fn is_pause_entry(price: f64, bands: &Bands) -> bool {
    matches!(bands.get(BandLevel::Plus200), Some(th) if price > th)
}

/// Price below the −1.0σ threshold.
pub fn is_pause_exit(price: f64, bands: &Bands) -> bool {
    matches!(bands.get(BandLevel::Minus100), Some(th) if price < th)
}

/// Compute the pause flag for every day of an ordered sequence.
pub fn compute_pause_flags(snapshots: &[BandSnapshot]) -> Vec<PauseFlag> {
    let mut latch = PauseLatch::new();
    snapshots
        .iter()
        .map(|s| latch.update(s.price, &s.bands))
        .collect()
}

/// Compute pause flags and store them on the snapshots.
pub fn attach_pause_flags(snapshots: &mut [BandSnapshot]) {
    let flags = compute_pause_flags(snapshots);
    let mut entries = 0usize;
    for (snapshot, flag) in snapshots.iter_mut().zip(flags) {
        if flag.entered_today {
            entries += 1;
        }
        snapshot.pause = Some(flag);
    }
    tracing::debug!(days = snapshots.len(), entries, "pause flags attached");
}
