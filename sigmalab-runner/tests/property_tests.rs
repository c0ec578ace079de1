//! Property tests for scoring and search.
//!
//! Uses proptest to verify:
//! 1. Walk-forward windows are contiguous, cover the sequence, and respect the minimum length
//! 2. Drawdown and cash drag stay within [0, 1]
//! 3. Every search proposal is a valid, monotone parameter set
//! 4. The median lies between the smallest and largest fold score

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use sigmalab_runner::metrics::{cash_drag, max_drawdown};
use sigmalab_runner::search::suggest;
use sigmalab_runner::time_splits;
use sigmalab_runner::walk_forward::median;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_series() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(prop_oneof![9 => 0.0..1e6_f64, 1 => Just(f64::NAN)], 0..200)
}

// ── 1. Windows ───────────────────────────────────────────────────────

proptest! {
    #[test]
    fn windows_partition_the_sequence(n in 0usize..5_000, splits in 1usize..8, min_window in 1usize..400) {
        let ws = time_splits(n, splits, min_window);
        if n == 0 {
            prop_assert!(ws.is_empty());
            return Ok(());
        }
        prop_assert!(!ws.is_empty());
        prop_assert!(ws.len() <= splits);
        prop_assert_eq!(ws[0].start, 0);
        prop_assert_eq!(ws[ws.len() - 1].end, n);
        for pair in ws.windows(2) {
            prop_assert_eq!(pair[0].end, pair[1].start);
        }
        if ws.len() > 1 {
            for w in &ws {
                prop_assert!(w.len() >= min_window);
            }
        }
    }
}

// ── 2. Metric ranges ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn drawdown_and_drag_are_fractions(navs in arb_series(), cash in arb_series()) {
        let dd = max_drawdown(&navs);
        prop_assert!((0.0..=1.0).contains(&dd));
        let drag = cash_drag(&cash, &navs);
        prop_assert!((0.0..=1.0).contains(&drag));
    }
}

// ── 3. Proposals ─────────────────────────────────────────────────────

proptest! {
    #[test]
    fn proposals_are_valid_and_monotone(seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let p = suggest(&mut rng);
        prop_assert!(p.validate().is_ok());
        let v = p.to_array();
        for w in v[..5].windows(2) {
            prop_assert!(w[1] <= w[0]);
        }
        for w in v[5..10].windows(2) {
            prop_assert!(w[1] >= w[0]);
        }
        prop_assert!(v[10] <= 0.35);
    }
}

// ── 4. Median ────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn median_is_bounded(values in prop::collection::vec(-1e6..1e6_f64, 1..50)) {
        let m = median(&values);
        let lo = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        prop_assert!(m >= lo && m <= hi);
    }
}
