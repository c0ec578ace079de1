//! Balance bookkeeping: the only code that mutates cash and asset balances.
//!
//! The ledger loop and the replay check both go through [`Balances`], so a
//! replay of recorded rows performs the same floating-point operations in the
//! same order as the original run.

use crate::domain::{Action, LedgerRow};

/// Cash (quote currency) and asset (base units) held.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Balances {
    pub cash: f64,
    pub asset: f64,
}

/// Executed trade amounts for one day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fill {
    None,
    Buy {
        cash_spent: f64,
        /// Net of the asset-denominated fee.
        asset_received: f64,
        fee_asset: f64,
    },
    Sell {
        asset_sold: f64,
        fee_asset: f64,
        cash_received: f64,
    },
}

impl Fill {
    pub fn asset_amount(&self) -> f64 {
        match *self {
            Fill::None => 0.0,
            Fill::Buy { asset_received, .. } => asset_received,
            Fill::Sell { asset_sold, .. } => asset_sold,
        }
    }

    pub fn cash_amount(&self) -> f64 {
        match *self {
            Fill::None => 0.0,
            Fill::Buy { cash_spent, .. } => cash_spent,
            Fill::Sell { cash_received, .. } => cash_received,
        }
    }

    pub fn fee_asset(&self) -> f64 {
        match *self {
            Fill::None => 0.0,
            Fill::Buy { fee_asset, .. } | Fill::Sell { fee_asset, .. } => fee_asset,
        }
    }

    /// Reconstruct the fill recorded on a ledger row.
    pub fn from_row(row: &LedgerRow) -> Self {
        match row.action {
            Action::Buy if row.trade_cash > 0.0 => Fill::Buy {
                cash_spent: row.trade_cash,
                asset_received: row.trade_asset,
                fee_asset: row.fee_asset,
            },
            Action::Sell if row.trade_asset > 0.0 || row.fee_asset > 0.0 => Fill::Sell {
                asset_sold: row.trade_asset,
                fee_asset: row.fee_asset,
                cash_received: row.trade_cash,
            },
            _ => Fill::None,
        }
    }
}

impl Balances {
    pub fn nav(&self, price: f64) -> f64 {
        self.cash + self.asset * price
    }

    pub fn credit_contribution(&mut self, net: f64) {
        self.cash += net;
    }

    /// Size a buy of `fraction` of cash at `price`, fee taken in asset units.
    pub fn size_buy(&self, fraction: f64, price: f64, fee_rate: f64) -> Fill {
        if !(fraction > 0.0 && price.is_finite() && price > 0.0) {
            return Fill::None;
        }
        let notional = fraction * self.cash;
        if notional <= 0.0 {
            return Fill::None;
        }
        let gross = notional / price;
        let fee = gross * fee_rate;
        Fill::Buy {
            cash_spent: notional,
            asset_received: (gross - fee).max(0.0),
            fee_asset: fee,
        }
    }

    /// Size a sell of `fraction` of the asset balance at `price`.
    ///
    /// When quantity plus fee would exceed the holding, both are scaled down so
    /// the total deduction equals the holding.
    pub fn size_sell(&self, fraction: f64, price: f64, fee_rate: f64) -> Fill {
        if !(fraction > 0.0 && price.is_finite() && price > 0.0 && self.asset > 0.0) {
            return Fill::None;
        }
        let mut qty = fraction * self.asset;
        let mut fee = qty * fee_rate;
        let total = qty + fee;
        if total > self.asset {
            let scale = self.asset / total;
            qty = (qty * scale).min(self.asset);
            fee = self.asset - qty;
        }
        Fill::Sell {
            asset_sold: qty,
            fee_asset: fee,
            cash_received: qty * price,
        }
    }

    /// Apply an executed fill. Balances never go below zero.
    pub fn apply(&mut self, fill: &Fill) {
        match *fill {
            Fill::None => {}
            Fill::Buy {
                cash_spent,
                asset_received,
                ..
            } => {
                self.cash = (self.cash - cash_spent).max(0.0);
                self.asset += asset_received;
            }
            Fill::Sell {
                asset_sold,
                fee_asset,
                cash_received,
            } => {
                self.asset = (self.asset - (asset_sold + fee_asset)).max(0.0);
                self.cash += cash_received;
            }
        }
    }
}

/// Replay recorded contributions and fills from zero balances.
///
/// Returns the balances after each row, in order.
pub fn replay_balances(rows: &[LedgerRow]) -> Vec<Balances> {
    let mut balances = Balances::default();
    rows.iter()
        .map(|row| {
            balances.credit_contribution(row.contrib_net);
            balances.apply(&Fill::from_row(row));
            balances
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buy_takes_fee_in_asset() {
        let b = Balances {
            cash: 1_000.0,
            asset: 0.0,
        };
        let fill = b.size_buy(0.5, 100.0, 0.001);
        match fill {
            Fill::Buy {
                cash_spent,
                asset_received,
                fee_asset,
            } => {
                assert_eq!(cash_spent, 500.0);
                assert!((fee_asset - 0.005).abs() < 1e-15);
                assert!((asset_received - 4.995).abs() < 1e-12);
            }
            other => panic!("expected buy, got {other:?}"),
        }
    }

    #[test]
    fn buy_with_no_cash_is_noop() {
        let b = Balances::default();
        assert_eq!(b.size_buy(0.5, 100.0, 0.0), Fill::None);
        assert_eq!(
            Balances {
                cash: 10.0,
                asset: 0.0
            }
            .size_buy(0.5, 0.0, 0.0),
            Fill::None
        );
    }

    #[test]
    fn full_sell_with_fee_never_oversells() {
        let mut b = Balances {
            cash: 0.0,
            asset: 3.0,
        };
        let fill = b.size_sell(1.0, 50.0, 0.0008);
        let Fill::Sell {
            asset_sold,
            fee_asset,
            ..
        } = fill
        else {
            panic!("expected sell");
        };
        assert!(asset_sold + fee_asset <= 3.0);
        assert!(asset_sold < 3.0);
        b.apply(&fill);
        assert_eq!(b.asset, 0.0);
        assert!((b.cash - asset_sold * 50.0).abs() < 1e-12);
    }

    #[test]
    fn partial_sell_fits_without_scaling() {
        let b = Balances {
            cash: 0.0,
            asset: 10.0,
        };
        let fill = b.size_sell(0.1, 20.0, 0.001);
        assert_eq!(fill.asset_amount(), 1.0);
        assert!((fill.fee_asset() - 0.001).abs() < 1e-15);
        assert_eq!(fill.cash_amount(), 20.0);
    }

    #[test]
    fn sell_with_empty_holding_is_noop() {
        assert_eq!(Balances::default().size_sell(0.5, 10.0, 0.0), Fill::None);
    }

    #[test]
    fn degenerate_prices_never_fill() {
        let b = Balances {
            cash: 100.0,
            asset: 1.0,
        };
        for px in [f64::INFINITY, f64::NAN, -5.0] {
            assert_eq!(b.size_buy(0.5, px, 0.0), Fill::None, "buy at {px}");
            assert_eq!(b.size_sell(0.5, px, 0.0), Fill::None, "sell at {px}");
        }
    }
}
