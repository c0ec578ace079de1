//! Property tests for ledger invariants.
//!
//! Uses proptest to verify:
//! 1. Non-negative balances for any band path and parameter set
//! 2. Conservation: replayed deltas reproduce every stored balance exactly
//! 3. Band bucket sits at or above its threshold and below the next one
//! 4. No buy of any kind while paused and above the -1.0σ exit
//! 5. Pause flags follow the latch: set only above +2.0σ, cleared only below -1.0σ
//!
//! Properties 1, 2, 3 and 5 also run with thresholds randomly left undefined.

use proptest::prelude::*;
use sigmalab_core::domain::{Action, BandBucket, BandLevel, BandSnapshot, ParameterSet};
use sigmalab_core::engine::{
    attach_pause_flags, compute_pause_flags, replay_balances, run_ledger, EngineConfig,
    LedgerConfig, StrategyConfig,
};
use sigmalab_core::fixtures::sequence_from_sigmas;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_path() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-2.0..3.0_f64, 1..120)
}

/// A path plus, per day, which of the ten thresholds are undefined.
fn arb_gapped_path() -> impl Strategy<Value = (Vec<f64>, Vec<[bool; 10]>)> {
    arb_path().prop_flat_map(|path| {
        let n = path.len();
        (
            Just(path),
            prop::collection::vec(prop::array::uniform10(prop::bool::weighted(0.2)), n),
        )
    })
}

fn arb_params() -> impl Strategy<Value = ParameterSet> {
    prop::array::uniform11(0.001..=1.0_f64).prop_map(ParameterSet::from_array)
}

fn arb_ledger() -> impl Strategy<Value = LedgerConfig> {
    (
        0.0..10_000.0_f64,
        0.0..2_000.0_f64,
        any::<bool>(),
        0.0..200.0_f64,
        0.0..200.0_f64,
    )
        .prop_map(|(start, periodic, only, fee, cfee)| LedgerConfig {
            start_contribution: start,
            periodic_contribution: periodic,
            periodic_only: only,
            trade_fee_bps: fee,
            contribution_fee_bps: cfee,
        })
}

fn build(path: &[f64], precompute: bool) -> Vec<BandSnapshot> {
    build_gapped(path, &[], precompute)
}

fn build_gapped(path: &[f64], gaps: &[[bool; 10]], precompute: bool) -> Vec<BandSnapshot> {
    let mut seq = sequence_from_sigmas(100.0, 10.0, path);
    for (snap, mask) in seq.iter_mut().zip(gaps) {
        for (level, &undefined) in BandLevel::ALL.iter().zip(mask) {
            if undefined {
                snap.bands.set(*level, f64::NAN);
            }
        }
    }
    if precompute {
        attach_pause_flags(&mut seq);
    }
    seq
}

// ── 1 & 2. Balances ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn balances_never_negative_and_replay_exactly(
        (path, gaps) in arb_gapped_path(),
        params in arb_params(),
        ledger in arb_ledger(),
        precompute in any::<bool>(),
    ) {
        let seq = build_gapped(&path, &gaps, precompute);
        let cfg = EngineConfig::new(params, ledger, StrategyConfig::default());
        let run = run_ledger(&seq, &cfg);

        for row in &run.rows {
            prop_assert!(row.cash_balance >= 0.0);
            prop_assert!(row.asset_balance >= 0.0);
        }
        let replayed = replay_balances(&run.rows);
        for (row, b) in run.rows.iter().zip(&replayed) {
            prop_assert_eq!(row.cash_balance, b.cash);
            prop_assert_eq!(row.asset_balance, b.asset);
        }
    }
}

// ── 3. Band bucket ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn bucket_brackets_price((path, gaps) in arb_gapped_path()) {
        let seq = build_gapped(&path, &gaps, false);
        let run = run_ledger(&seq, &EngineConfig::default());
        for (row, snap) in run.rows.iter().zip(&seq) {
            match row.band_bucket {
                BandBucket::BelowRange => {
                    for th in BandLevel::ALL.iter().filter_map(|&l| snap.bands.get(l)) {
                        prop_assert!(row.price < th);
                    }
                }
                BandBucket::Level(level) => {
                    let th = snap.bands.get(level);
                    prop_assert!(th.is_some());
                    prop_assert!(th.is_some_and(|th| row.price >= th));
                    let next = BandLevel::ALL
                        .iter()
                        .filter(|&&l| l > level)
                        .find_map(|&l| snap.bands.get(l));
                    if let Some(next) = next {
                        prop_assert!(row.price < next);
                    }
                }
            }
        }
    }
}

// ── 4. Pause suppresses buys ─────────────────────────────────────────

proptest! {
    #[test]
    fn no_buys_while_paused(path in arb_path(), params in arb_params(), precompute in any::<bool>()) {
        let seq = build(&path, precompute);
        let cfg = EngineConfig::new(params, LedgerConfig::seeded(1_000.0), StrategyConfig::default());
        let run = run_ledger(&seq, &cfg);
        for (i, row) in run.rows.iter().enumerate() {
            if i > 0 && run.rows[i - 1].paused && row.paused {
                prop_assert_ne!(row.action, Action::Buy);
            }
        }
    }
}

// ── 5. Latch transitions ─────────────────────────────────────────────

proptest! {
    #[test]
    fn pause_transitions_only_at_thresholds((path, gaps) in arb_gapped_path()) {
        let seq = build_gapped(&path, &gaps, false);
        let flags = compute_pause_flags(&seq);
        let mut prev = false;
        for (flag, snap) in flags.iter().zip(&seq) {
            if flag.paused && !prev {
                let entry = snap.bands.get(BandLevel::Plus200);
                prop_assert!(entry.is_some_and(|th| snap.price > th));
                prop_assert!(flag.entered_today);
            }
            if !flag.paused && prev {
                let exit = snap.bands.get(BandLevel::Minus100);
                prop_assert!(exit.is_some_and(|th| snap.price < th));
            }
            if flag.paused == prev {
                prop_assert!(!flag.entered_today);
            }
            prev = flag.paused;
        }
    }
}
