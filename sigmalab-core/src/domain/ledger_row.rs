//! LedgerRow: one immutable output record per simulated day.

use chrono::NaiveDate;
use serde::Serialize;

use super::band::BandBucket;
use super::decision::{Action, Rule};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerRow {
    pub date: NaiveDate,
    pub price: f64,
    pub band_bucket: BandBucket,
    /// Price rate-of-change feature fed to the momentum gate.
    pub momentum: f64,
    /// Pause regime in effect after today's update.
    pub paused: bool,

    pub action: Action,
    pub fraction: f64,
    pub rule: Rule,
    pub note: String,

    /// Net asset quantity bought, or asset quantity sold (fee excluded).
    pub trade_asset: f64,
    /// Cash spent on a buy, or cash proceeds of a sell.
    pub trade_cash: f64,
    /// Trade fee, always charged in asset units.
    pub fee_asset: f64,

    pub contrib_gross: f64,
    pub contrib_fee: f64,
    pub contrib_net: f64,

    pub cash_balance: f64,
    pub asset_balance: f64,
    pub nav: f64,
}

impl LedgerRow {
    pub fn is_trade(&self) -> bool {
        self.action != Action::Hold && (self.trade_asset > 0.0 || self.trade_cash > 0.0)
    }
}
