//! Decision engine: per-day rule evaluation.
//!
//! Order of evaluation each day:
//! 1. Inline pause latch when the snapshot carries no precomputed flag
//! 2. Retrace tracking reset while paused or on a pause-exit print
//! 3. Upper-band visit tracking and re-arming (unpaused only)
//! 4. Retrace exceptions, B before A
//! 5. Buy tiers below the mean, suppressed while paused
//! 6. Sell tiers at or above the mean, mid tiers gated by momentum

use crate::domain::{BandLevel, BandSnapshot, Bands, Decision, ParameterSet, Rule, Tier};

use super::config::StrategyConfig;
use super::regime::{is_pause_exit, next_pause};
use super::state::StrategyState;

/// Buy thresholds below the mean, furthest first.
const BUY_LADDER: [(BandLevel, Tier, &str); 4] = [
    (BandLevel::Minus100, Tier::Base1, "< -1.0σ"),
    (BandLevel::Minus075, Tier::Base2, "-1.0σ…-0.75σ"),
    (BandLevel::Minus050, Tier::Base3, "-0.75σ…-0.5σ"),
    (BandLevel::Minus025, Tier::Base4, "-0.5σ…-0.25σ"),
];

/// Sell thresholds from the mean upward. The flag marks momentum-gated tiers.
const SELL_LADDER: [(BandLevel, Tier, bool, &str); 5] = [
    (BandLevel::Plus050, Tier::Base6, false, "mean…+0.5σ"),
    (BandLevel::Plus100, Tier::Base7, true, "+0.5σ…+1.0σ"),
    (BandLevel::Plus150, Tier::Base8, true, "+1.0σ…+1.5σ"),
    (BandLevel::Plus200, Tier::Base9, true, "+1.5σ…+2.0σ"),
    (BandLevel::Plus250, Tier::Base10, false, "+2.0σ…+2.5σ"),
];

/// Evaluates the trading rules under one immutable parameter set.
#[derive(Debug, Clone, Copy)]
pub struct DecisionEngine<'a> {
    params: &'a ParameterSet,
    strategy: &'a StrategyConfig,
}

impl<'a> DecisionEngine<'a> {
    pub fn new(params: &'a ParameterSet, strategy: &'a StrategyConfig) -> Self {
        Self { params, strategy }
    }

    /// Decide today's action and update `state` in place.
    ///
    /// `momentum` is the rate-of-change feature for the same day.
    pub fn decide(
        &self,
        price: f64,
        snapshot: &BandSnapshot,
        momentum: f64,
        state: &mut StrategyState,
    ) -> Decision {
        let bands = &snapshot.bands;

        if snapshot.pause.is_none() {
            state.pause = next_pause(state.pause, price, bands);
        }

        let exiting = is_pause_exit(price, bands);
        if state.pause || exiting {
            state.clear_retrace_tracking();
        }

        if !state.pause && self.strategy.retrace_enabled {
            self.track_upper_bands(price, bands, state);
        }

        let suppressed = state.pause && !exiting;

        if let Some(decision) = self.retrace_exception(price, bands, state, suppressed) {
            return decision;
        }

        if let Some(mean) = bands.get(BandLevel::Mean) {
            if price < mean {
                return self.buy_zone(price, bands, suppressed);
            }
        }

        self.sell_zone(price, bands, momentum, state.pause)
    }

    fn track_upper_bands(&self, price: f64, bands: &Bands, state: &mut StrategyState) {
        if in_range(price, bands, BandLevel::Plus100, BandLevel::Plus150) {
            state.crossed_upper_band_a = true;
        }
        if in_range(price, bands, BandLevel::Plus150, BandLevel::Plus200) {
            state.crossed_upper_band_b = true;
        }
        if state.crossed_upper_band_a && at_or_above(price, bands, BandLevel::Plus050) {
            state.retrace_a_armed = true;
        }
        if state.crossed_upper_band_b && at_or_above(price, bands, BandLevel::Plus100) {
            state.retrace_b_armed = true;
        }
    }

    fn retrace_exception(
        &self,
        price: f64,
        bands: &Bands,
        state: &StrategyState,
        suppressed: bool,
    ) -> Option<Decision> {
        if suppressed || !self.strategy.retrace_enabled {
            return None;
        }
        let b3 = self.params.fraction(Tier::Base3);
        if state.crossed_upper_band_b && in_range(price, bands, BandLevel::Plus050, BandLevel::Plus100)
        {
            return Some(Decision::buy(
                b3,
                Rule::RetraceB9ToB7,
                "Retrace: touched +1.5σ…+2.0σ; now in +0.5σ…+1.0σ",
            ));
        }
        if state.crossed_upper_band_a && in_range(price, bands, BandLevel::Mean, BandLevel::Plus050) {
            return Some(Decision::buy(
                b3,
                Rule::RetraceB8ToB6,
                "Retrace: touched +1.0σ…+1.5σ; now in mean…+0.5σ",
            ));
        }
        None
    }

    fn buy_zone(&self, price: f64, bands: &Bands, suppressed: bool) -> Decision {
        if suppressed {
            return Decision::hold(
                Rule::Pause,
                "Bear market pause active: buying disabled until < -1σ",
            );
        }

        let mut any_defined = false;
        for (level, tier, note) in BUY_LADDER {
            if let Some(th) = bands.get(level) {
                any_defined = true;
                if price < th {
                    return self.buy(tier, note);
                }
            }
        }
        if any_defined {
            self.buy(Tier::Base5, "-0.25σ…mean")
        } else {
            self.buy(Tier::Base1, "below mean, no lower bands")
        }
    }

    fn sell_zone(&self, price: f64, bands: &Bands, momentum: f64, paused: bool) -> Decision {
        let momentum_ok = paused || momentum > self.strategy.momentum_threshold;

        for (level, tier, gated, note) in SELL_LADDER {
            let Some(th) = bands.get(level) else {
                continue;
            };
            if price < th {
                if gated && !momentum_ok {
                    return Decision::hold(
                        Rule::MomentumHold,
                        format!(
                            "Momentum filter blocks sell in {note} (ROC={:.2}%)",
                            momentum * 100.0
                        ),
                    );
                }
                return Decision::sell(self.params.fraction(tier), Rule::Base(tier), note);
            }
        }
        Decision::sell(
            self.params.fraction(Tier::Base11),
            Rule::Base(Tier::Base11),
            "+2.5σ or above",
        )
    }

    fn buy(&self, tier: Tier, note: &str) -> Decision {
        Decision::buy(self.params.fraction(tier), Rule::Base(tier), note)
    }
}

/// `lo <= price < hi`; false when either bound is undefined.
fn in_range(price: f64, bands: &Bands, lo: BandLevel, hi: BandLevel) -> bool {
    match (bands.get(lo), bands.get(hi)) {
        (Some(lo), Some(hi)) => price >= lo && price < hi,
        _ => false,
    }
}

fn at_or_above(price: f64, bands: &Bands, level: BandLevel) -> bool {
    matches!(bands.get(level), Some(th) if price >= th)
}
