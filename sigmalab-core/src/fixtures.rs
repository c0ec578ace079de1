//! Synthetic snapshot builders for tests and benchmarks.

use chrono::{Duration, NaiveDate};

use crate::domain::{BandLevel, BandSnapshot, Bands};

/// First day of every synthetic sequence.
pub fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default()
}

/// Calendar day `index` days after [`base_date`].
pub fn day(index: usize) -> NaiveDate {
    base_date() + Duration::days(index as i64)
}

/// Thresholds at `mean + k * sigma` for every level.
pub fn bands_around(mean: f64, sigma: f64) -> Bands {
    let mut bands = Bands::undefined();
    for level in BandLevel::ALL {
        bands.set(level, mean + sigma * level.sigma());
    }
    bands
}

/// One snapshot on day `index` priced `z` standard deviations from the mean.
pub fn snapshot_at_sigma(index: usize, mean: f64, sigma: f64, z: f64) -> BandSnapshot {
    BandSnapshot::new(day(index), mean + sigma * z, bands_around(mean, sigma))
}

/// Consecutive daily snapshots with constant bands and the given z-scores.
pub fn sequence_from_sigmas(mean: f64, sigma: f64, zs: &[f64]) -> Vec<BandSnapshot> {
    zs.iter()
        .enumerate()
        .map(|(i, &z)| snapshot_at_sigma(i, mean, sigma, z))
        .collect()
}

/// Consecutive daily snapshots from explicit prices under constant bands.
pub fn sequence_from_prices(mean: f64, sigma: f64, prices: &[f64]) -> Vec<BandSnapshot> {
    let bands = bands_around(mean, sigma);
    prices
        .iter()
        .enumerate()
        .map(|(i, &p)| BandSnapshot::new(day(i), p, bands))
        .collect()
}

/// A slowly rising mean with price cycling through the bands.
///
/// `period` days per cycle. Even cycles swing from -1.5σ to +2.7σ and so
/// enter and leave the pause regime; odd cycles top out at +1.7σ and fall
/// back through the retrace target bands.
pub fn synthetic_cycle(days: usize, period: usize) -> Vec<BandSnapshot> {
    let period = period.max(2);
    (0..days)
        .map(|i| {
            let t = i as f64;
            let mean = 100.0 * (1.0 + 0.0005 * t);
            let sigma = 0.15 * mean;
            let phase = ((i % period) as f64 / period as f64) * std::f64::consts::TAU;
            let z = if (i / period) % 2 == 0 {
                0.6 + 2.1 * phase.sin()
            } else {
                0.2 + 1.5 * phase.sin()
            };
            snapshot_at_sigma(i, mean, sigma, z)
        })
        .collect()
}
