//! Price-derived features consumed by the decision engine.
//!
//! Features are computed once over the whole sequence before the day loop and
//! looked up per day.

pub mod roc;

pub use roc::rate_of_change;
