//! Integration tests for the ledger loop.
//!
//! Tests:
//! 1. Conservation: replaying recorded deltas reproduces every balance exactly
//! 2. Idempotence: two runs over identical input serialize identically
//! 3. Balances never go negative, even with punitive fees
//! 4. Band bucket classification matches the recorded price
//! 5. Normalized feed input flows through the whole pipeline
//! 6. A non-finite price trades nothing and is recorded as given

use serde_json::json;
use sigmalab_core::data::normalize_payload;
use sigmalab_core::domain::{Action, BandBucket, ParameterSet};
use sigmalab_core::engine::{
    attach_pause_flags, replay_balances, run_ledger, EngineConfig, LedgerConfig, StrategyConfig,
};
use sigmalab_core::fixtures::{sequence_from_prices, synthetic_cycle};

fn cycle_config() -> EngineConfig {
    EngineConfig::new(
        ParameterSet::default(),
        LedgerConfig {
            start_contribution: 10_000.0,
            periodic_contribution: 1_000.0,
            periodic_only: true,
            trade_fee_bps: 8.0,
            contribution_fee_bps: 18.0,
        },
        StrategyConfig::default(),
    )
}

#[test]
fn replay_reproduces_every_balance() {
    let mut seq = synthetic_cycle(900, 120);
    attach_pause_flags(&mut seq);
    let run = run_ledger(&seq, &cycle_config());

    let replayed = replay_balances(&run.rows);
    assert_eq!(replayed.len(), run.rows.len());
    for (row, b) in run.rows.iter().zip(&replayed) {
        assert_eq!(row.cash_balance, b.cash, "cash on {}", row.date);
        assert_eq!(row.asset_balance, b.asset, "asset on {}", row.date);
    }
    let last = replayed.last().unwrap();
    assert_eq!(run.final_balances.cash, last.cash);
    assert_eq!(run.final_balances.asset, last.asset);
}

#[test]
fn cycle_exercises_every_action() {
    let mut seq = synthetic_cycle(900, 120);
    attach_pause_flags(&mut seq);
    let run = run_ledger(&seq, &cycle_config());
    assert!(run.count(Action::Buy) > 0);
    assert!(run.count(Action::Sell) > 0);
    assert!(run.count(Action::Hold) > 0);
    assert!(run.rows.iter().any(|r| r.paused));
    assert!(run.rows.iter().any(|r| r.rule.is_retrace()));
}

#[test]
fn identical_runs_are_byte_identical() {
    let mut seq = synthetic_cycle(500, 90);
    attach_pause_flags(&mut seq);
    let cfg = cycle_config();
    let a = run_ledger(&seq, &cfg);
    let b = run_ledger(&seq, &cfg);
    assert_eq!(a, b);
    assert_eq!(
        serde_json::to_string(&a.rows).unwrap(),
        serde_json::to_string(&b.rows).unwrap()
    );
}

#[test]
fn balances_stay_non_negative_with_full_sells_and_max_fees() {
    let seq = synthetic_cycle(400, 60);
    let cfg = EngineConfig::new(
        ParameterSet::uniform(1.0),
        LedgerConfig {
            start_contribution: 1_000.0,
            periodic_contribution: 100.0,
            periodic_only: false,
            trade_fee_bps: 10_000.0,
            contribution_fee_bps: 500.0,
        },
        StrategyConfig::default(),
    );
    let run = run_ledger(&seq, &cfg);
    for row in &run.rows {
        assert!(row.cash_balance >= 0.0, "cash {} on {}", row.cash_balance, row.date);
        assert!(row.asset_balance >= 0.0, "asset {} on {}", row.asset_balance, row.date);
    }
}

#[test]
fn band_bucket_matches_price() {
    let seq = synthetic_cycle(300, 75);
    let run = run_ledger(&seq, &cycle_config());
    for (row, snap) in run.rows.iter().zip(&seq) {
        match row.band_bucket {
            BandBucket::BelowRange => assert!(row.price < snap.bands.m100),
            BandBucket::Level(level) => {
                let th = snap.bands.get(level).unwrap();
                assert!(row.price >= th);
                let higher = sigmalab_core::domain::BandLevel::ALL
                    .iter()
                    .filter(|&&l| l > level)
                    .find_map(|&l| snap.bands.get(l));
                if let Some(next) = higher {
                    assert!(row.price < next);
                }
            }
        }
    }
}

#[test]
fn normalized_feed_runs_end_to_end() {
    let rows: Vec<_> = (1..=12)
        .map(|d| {
            json!({
                "date": format!("2024-03-{d:02}"),
                "close": 95.0 + d as f64,
                "price_at_m100": 90.0,
                "price_at_m075": 92.5,
                "price_at_m050": 95.0,
                "price_at_m025": 97.5,
                "price_at_mean": 100.0,
                "price_at_p050": 105.0,
                "price_at_p100": 110.0,
                "price_at_p150": 115.0,
                "price_at_p200": 120.0,
                "price_at_p250": "",
            })
        })
        .collect();
    let mut seq = normalize_payload(&json!({ "data": rows })).unwrap();
    attach_pause_flags(&mut seq);
    let run = run_ledger(&seq, &cycle_config());
    assert_eq!(run.len(), 12);
    // 2024-03-01 is a month start with a non-zero seed: seed only.
    assert_eq!(run.rows[0].contrib_gross, 10_000.0);
    assert_eq!(run.rows[0].action, Action::Buy);
    assert!(run.terminal_nav() > 0.0);
}

#[test]
fn non_finite_price_day_trades_nothing() {
    let mut seq = sequence_from_prices(100.0, 10.0, &[92.0, 92.0, 92.0, 92.0, 85.0]);
    seq[3].price = f64::INFINITY;
    let cfg = EngineConfig::new(
        ParameterSet::default(),
        LedgerConfig::seeded(1_000.0),
        StrategyConfig::default(),
    );
    let run = run_ledger(&seq, &cfg);

    let before = &run.rows[2];
    assert!(before.asset_balance > 0.0);
    assert_eq!(before.action, Action::Buy);

    let day = &run.rows[3];
    assert!(day.price.is_infinite(), "price recorded as {}", day.price);
    assert_eq!(day.trade_asset, 0.0);
    assert_eq!(day.trade_cash, 0.0);
    assert_eq!(day.fee_asset, 0.0);
    assert_eq!(day.cash_balance, before.cash_balance);
    assert_eq!(day.asset_balance, before.asset_balance);

    let replayed = replay_balances(&run.rows);
    assert_eq!(replayed[4].asset, run.rows[4].asset_balance);
}
