//! Walk-forward scorer: robust fitness of one parameter set.
//!
//! The snapshot sequence is cut into up to `splits` contiguous,
//! non-overlapping windows. Each window runs an independent ledger (fresh
//! balances and strategy state) and is scored as
//!
//! ```text
//! terminal_nav / (1 + drawdown_weight * max_drawdown + drag_weight * cash_drag)
//! ```
//!
//! The fitness is the median window score.
//!
//! Pause flags already attached to the snapshots are honoured, so a regime
//! entered before a window starts carries into it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use sigmalab_core::domain::BandSnapshot;
use sigmalab_core::engine::{run_ledger, EngineConfig};

use crate::config::ConfigError;
use crate::metrics::{cash_drag, max_drawdown};

// ─── Configuration ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WalkForwardConfig {
    /// Requested window count (default 4).
    pub splits: usize,
    /// Minimum days per window (default 200).
    pub min_window: usize,
    /// Drawdown penalty weight (default 0.25).
    pub drawdown_weight: f64,
    /// Cash-drag penalty weight (default 0.10).
    pub drag_weight: f64,
}

impl Default for WalkForwardConfig {
    fn default() -> Self {
        Self {
            splits: 4,
            min_window: 200,
            drawdown_weight: 0.25,
            drag_weight: 0.10,
        }
    }
}

impl WalkForwardConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.splits == 0 {
            return Err(ConfigError::invalid("walk_forward.splits", "must be at least 1"));
        }
        for (field, w) in [
            ("walk_forward.drawdown_weight", self.drawdown_weight),
            ("walk_forward.drag_weight", self.drag_weight),
        ] {
            if !(w.is_finite() && w >= 0.0) {
                return Err(ConfigError::invalid(
                    field,
                    format!("must be finite and non-negative, got {w}"),
                ));
            }
        }
        Ok(())
    }

    /// Penalized score of one window.
    pub fn fold_score(&self, terminal_nav: f64, max_drawdown: f64, cash_drag: f64) -> f64 {
        terminal_nav / (1.0 + self.drawdown_weight * max_drawdown + self.drag_weight * cash_drag)
    }
}

// ─── Window creation ─────────────────────────────────────────────────

/// Half-open index range `[start, end)` of one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoldWindow {
    pub start: usize,
    pub end: usize,
}

impl FoldWindow {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

/// Split `n` days into contiguous windows.
///
/// When `n < splits * min_window` the count drops to `n / min_window`.
/// Window edges are `round(i * n / k)` with ties to even. Windows shorter
/// than `min_window` are discarded, and fewer than two survivors collapse
/// to one window over everything. `n == 0` yields no windows.
pub fn time_splits(n: usize, splits: usize, min_window: usize) -> Vec<FoldWindow> {
    if n == 0 {
        return Vec::new();
    }
    let whole = vec![FoldWindow { start: 0, end: n }];

    let mut k = splits.max(1);
    if n < k.saturating_mul(min_window) {
        k = (n / min_window.max(1)).max(1);
    }
    if k <= 1 {
        return whole;
    }

    let mut edges: Vec<usize> = (0..=k).map(|i| div_round_even(i * n, k)).collect();
    edges.dedup();
    let windows: Vec<FoldWindow> = edges
        .windows(2)
        .map(|e| FoldWindow {
            start: e[0],
            end: e[1],
        })
        .filter(|w| w.len() >= min_window)
        .collect();

    if windows.len() < 2 {
        whole
    } else {
        windows
    }
}

/// `num / den` rounded to nearest, ties to even.
fn div_round_even(num: usize, den: usize) -> usize {
    let q = num / den;
    let twice_rem = 2 * (num % den);
    if twice_rem > den || (twice_rem == den && q % 2 == 1) {
        q + 1
    } else {
        q
    }
}

// ─── Evaluation ──────────────────────────────────────────────────────

/// One scored window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoldResult {
    pub window: FoldWindow,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub terminal_nav: f64,
    pub max_drawdown: f64,
    pub cash_drag: f64,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkForwardResult {
    pub folds: Vec<FoldResult>,
    /// Median fold score; 0.0 with no folds.
    pub fitness: f64,
}

/// Score every window of `snapshots` under `engine`.
pub fn evaluate(
    snapshots: &[BandSnapshot],
    engine: &EngineConfig,
    config: &WalkForwardConfig,
) -> WalkForwardResult {
    let windows = time_splits(snapshots.len(), config.splits, config.min_window);
    let folds: Vec<FoldResult> = windows
        .into_iter()
        .map(|w| {
            let slice = &snapshots[w.start..w.end];
            let run = run_ledger(slice, engine);
            let navs = run.navs();
            let cash: Vec<f64> = run.rows.iter().map(|r| r.cash_balance).collect();
            let terminal_nav = run.terminal_nav();
            let dd = max_drawdown(&navs);
            let drag = cash_drag(&cash, &navs);
            FoldResult {
                window: w,
                start_date: slice[0].date,
                end_date: slice[slice.len() - 1].date,
                terminal_nav,
                max_drawdown: dd,
                cash_drag: drag,
                score: config.fold_score(terminal_nav, dd, drag),
            }
        })
        .collect();

    let scores: Vec<f64> = folds.iter().map(|f| f.score).collect();
    let fitness = median(&scores);
    tracing::debug!(folds = folds.len(), fitness, "walk-forward evaluated");
    WalkForwardResult { folds, fitness }
}

/// Scalar fitness only.
pub fn score(snapshots: &[BandSnapshot], engine: &EngineConfig, config: &WalkForwardConfig) -> f64 {
    evaluate(snapshots, engine, config).fitness
}

/// Median, averaging the middle pair for even lengths. 0.0 when empty.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigmalab_core::engine::{attach_pause_flags, LedgerConfig};
    use sigmalab_core::fixtures::synthetic_cycle;

    fn ranges(ws: &[FoldWindow]) -> Vec<(usize, usize)> {
        ws.iter().map(|w| (w.start, w.end)).collect()
    }

    #[test]
    fn splits_evenly() {
        assert_eq!(
            ranges(&time_splits(1000, 4, 200)),
            vec![(0, 250), (250, 500), (500, 750), (750, 1000)]
        );
    }

    #[test]
    fn short_sequence_reduces_window_count() {
        // 650 < 4 * 200, so k = 3.
        let ws = time_splits(650, 4, 200);
        assert_eq!(ranges(&ws), vec![(0, 217), (217, 433), (433, 650)]);
    }

    #[test]
    fn too_short_for_two_windows_collapses() {
        assert_eq!(ranges(&time_splits(399, 4, 200)), vec![(0, 399)]);
        assert_eq!(ranges(&time_splits(50, 4, 200)), vec![(0, 50)]);
        assert_eq!(ranges(&time_splits(1000, 1, 200)), vec![(0, 1000)]);
    }

    #[test]
    fn empty_sequence_has_no_windows() {
        assert!(time_splits(0, 4, 200).is_empty());
    }

    #[test]
    fn windows_cover_sequence_contiguously() {
        for n in [400, 401, 777, 1234, 5000] {
            let ws = time_splits(n, 4, 200);
            assert_eq!(ws[0].start, 0);
            assert_eq!(ws[ws.len() - 1].end, n);
            for pair in ws.windows(2) {
                assert_eq!(pair[0].end, pair[1].start);
            }
        }
    }

    #[test]
    fn rounding_ties_to_even() {
        assert_eq!(div_round_even(5, 2), 2);
        assert_eq!(div_round_even(7, 2), 4);
        assert_eq!(div_round_even(10, 4), 2);
        assert_eq!(div_round_even(11, 4), 3);
    }

    #[test]
    fn median_odd_even_empty() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
        assert_eq!(median(&[]), 0.0);
    }

    #[test]
    fn fold_score_penalises_drawdown_and_drag() {
        let c = WalkForwardConfig::default();
        assert_eq!(c.fold_score(1_000.0, 0.0, 0.0), 1_000.0);
        let s = c.fold_score(1_000.0, 0.4, 0.5);
        assert!((s - 1_000.0 / 1.15).abs() < 1e-9);
    }

    #[test]
    fn evaluate_scores_each_window_independently() {
        let mut seq = synthetic_cycle(1_000, 120);
        attach_pause_flags(&mut seq);
        let engine = EngineConfig::new(
            Default::default(),
            LedgerConfig::seeded(10_000.0),
            Default::default(),
        );
        let result = evaluate(&seq, &engine, &WalkForwardConfig::default());
        assert_eq!(result.folds.len(), 4);
        for fold in &result.folds {
            // Fresh balances: every window starts from its own seed.
            let run = run_ledger(&seq[fold.window.start..fold.window.end], &engine);
            assert_eq!(run.rows[0].contrib_gross, 10_000.0);
            assert_eq!(fold.terminal_nav, run.terminal_nav());
            assert!(fold.score <= fold.terminal_nav);
        }
        let scores: Vec<f64> = result.folds.iter().map(|f| f.score).collect();
        assert_eq!(result.fitness, median(&scores));
        assert_eq!(score(&seq, &engine, &WalkForwardConfig::default()), result.fitness);
    }

    #[test]
    fn empty_input_scores_zero() {
        let r = evaluate(&[], &EngineConfig::default(), &WalkForwardConfig::default());
        assert!(r.folds.is_empty());
        assert_eq!(r.fitness, 0.0);
    }

    #[test]
    fn validate_rejects_bad_weights() {
        let mut c = WalkForwardConfig::default();
        assert!(c.validate().is_ok());
        c.drag_weight = f64::NAN;
        assert!(c.validate().is_err());
        c.drag_weight = 0.1;
        c.splits = 0;
        assert!(c.validate().is_err());
    }
}
