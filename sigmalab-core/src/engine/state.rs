//! Strategy state carried across one simulation run.

use crate::domain::PauseFlag;

/// Mutable per-run state owned by the ledger loop and handed to the decision
/// engine by exclusive reference each day.
///
/// The armed flags are maintained but no rule reads them; retrace eligibility
/// is driven by the cross flags alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrategyState {
    pub pause: bool,
    /// Price has closed in [+1.0σ, +1.5σ) since the last reset.
    pub crossed_upper_band_a: bool,
    /// Price has closed in [+1.5σ, +2.0σ) since the last reset.
    pub crossed_upper_band_b: bool,
    pub retrace_a_armed: bool,
    pub retrace_b_armed: bool,
}

impl Default for StrategyState {
    fn default() -> Self {
        Self::new()
    }
}

impl StrategyState {
    pub fn new() -> Self {
        Self {
            pause: false,
            crossed_upper_band_a: false,
            crossed_upper_band_b: false,
            retrace_a_armed: true,
            retrace_b_armed: true,
        }
    }

    /// Reset both cross flags and both armed flags.
    pub fn clear_retrace_tracking(&mut self) {
        self.crossed_upper_band_a = false;
        self.crossed_upper_band_b = false;
        self.retrace_a_armed = false;
        self.retrace_b_armed = false;
    }

    /// Adopt a precomputed pause flag. Entering pause clears retrace tracking.
    pub fn sync_pause(&mut self, flag: PauseFlag) {
        if flag.paused && !self.pause {
            self.clear_retrace_tracking();
        }
        self.pause = flag.paused;
    }
}
