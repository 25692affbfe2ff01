use crate::error::LedgerError;
use crate::models::{round_cents, PRICE_EPSILON};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Holding {
    shares: u64,
    cost_basis: f64,
}

/// Cash and share bookkeeping for a single strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    cash: f64,
    holdings: BTreeMap<String, Holding>,
    realized_gain_loss: f64,
}

impl Ledger {
    pub fn new(initial_cash: f64) -> Self {
        Self {
            cash: initial_cash.max(0.0),
            holdings: BTreeMap::new(),
            realized_gain_loss: 0.0,
        }
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn realized_gain_loss(&self) -> f64 {
        self.realized_gain_loss
    }

    pub fn shares(&self, instrument: &str) -> u64 {
        self.holdings.get(instrument).map(|h| h.shares).unwrap_or(0)
    }

    /// Open positions as instrument -> share count. Closed positions are absent.
    pub fn positions(&self) -> BTreeMap<String, u64> {
        self.holdings
            .iter()
            .map(|(instrument, holding)| (instrument.clone(), holding.shares))
            .collect()
    }

    /// Largest share count whose rounded cost at `price` fits in cash.
    pub fn max_affordable_shares(&self, price: f64) -> u64 {
        if !(price.is_finite() && price > 0.0) {
            return 0;
        }
        let mut shares = (self.cash / price).floor() as u64;
        while shares > 0 && round_cents(price * shares as f64) > self.cash + PRICE_EPSILON {
            shares -= 1;
        }
        shares
    }

    pub fn purchase(&mut self, instrument: &str, price: f64, shares: u64) -> Result<(), LedgerError> {
        let cost = round_cents(price * shares as f64);
        if !cost.is_finite() || cost > self.cash + PRICE_EPSILON {
            return Err(LedgerError::InsufficientFunds {
                instrument: instrument.to_string(),
                price,
                shares,
                required: cost,
                available: self.cash,
            });
        }
        if shares == 0 {
            return Ok(());
        }

        let holding = self.holdings.entry(instrument.to_string()).or_default();
        holding.shares += shares;
        holding.cost_basis += cost;
        self.cash -= cost;
        Ok(())
    }

    pub fn sell(&mut self, instrument: &str, price: f64, shares: u64) -> Result<(), LedgerError> {
        let held = self.shares(instrument);
        if shares > held {
            return Err(LedgerError::InsufficientShares {
                instrument: instrument.to_string(),
                requested: shares,
                held,
            });
        }
        let Some(holding) = self.holdings.get_mut(instrument) else {
            return Ok(());
        };
        if shares == 0 {
            return Ok(());
        }

        let proceeds = round_cents(price * shares as f64);
        let released_basis = holding.cost_basis * shares as f64 / held as f64;
        holding.shares -= shares;
        holding.cost_basis -= released_basis;
        if holding.shares == 0 {
            self.holdings.remove(instrument);
        }

        self.cash += proceeds;
        self.realized_gain_loss += proceeds - released_basis;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn purchase_allows_exact_cash_and_rounds_cost() {
        let mut ledger = Ledger::new(50.0);
        ledger.purchase("AAA", 12.5, 4).expect("exact purchase");
        assert_eq!(ledger.cash(), 0.0);
        assert_eq!(ledger.shares("AAA"), 4);

        let mut ledger = Ledger::new(50.0);
        ledger.purchase("BBB", 3.333, 3).expect("purchase");
        assert!((ledger.cash() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn sub_cent_cash_cannot_cover_rounded_cost() {
        // 2 x 5.003 = 10.006 fits, but the rounded cost of 10.01 does not
        let mut ledger = Ledger::new(10.006);
        let err = ledger.purchase("AAA", 5.003, 2).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientFunds { shares: 2, .. }));
        assert_eq!(ledger.cash(), 10.006);
        assert_eq!(ledger.max_affordable_shares(5.003), 1);

        ledger.purchase("AAA", 5.003, 1).expect("purchase");
        ledger.sell("AAA", 5.003, 1).expect("sale");
        assert!((ledger.cash() - 10.006).abs() < 1e-9);
        assert!(ledger.positions().is_empty());
    }

    #[test]
    fn zero_share_purchase_opens_no_position() {
        let mut ledger = Ledger::new(10.0);
        ledger.purchase("AAA", 12.0, 0).expect("empty purchase");
        assert!(ledger.positions().is_empty());
        assert_eq!(ledger.cash(), 10.0);
    }

    #[test]
    fn purchase_over_cash_is_rejected_without_side_effects() {
        let mut ledger = Ledger::new(50.0);
        let err = ledger.purchase("AAA", 10.01, 5).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientFunds { shares: 5, .. }));
        assert_eq!(ledger.cash(), 50.0);
        assert!(ledger.positions().is_empty());
    }

    #[test]
    fn purchases_accumulate_and_sales_remove_empty_positions() {
        let mut ledger = Ledger::new(100.0);
        ledger.purchase("AAA", 10.0, 2).expect("first");
        ledger.purchase("AAA", 10.0, 3).expect("second");
        assert_eq!(ledger.shares("AAA"), 5);

        ledger.sell("AAA", 12.0, 2).expect("partial sale");
        assert_eq!(ledger.positions().get("AAA"), Some(&3));

        ledger.sell("AAA", 12.0, 3).expect("closing sale");
        assert!(!ledger.positions().contains_key("AAA"));
        assert!((ledger.cash() - 110.0).abs() < 1e-9);
        assert!((ledger.realized_gain_loss() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn selling_more_than_held_fails() {
        let mut ledger = Ledger::new(100.0);
        let err = ledger.sell("AAA", 10.0, 1).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientShares {
                instrument: "AAA".to_string(),
                requested: 1,
                held: 0
            }
        );

        ledger.purchase("AAA", 10.0, 2).expect("purchase");
        assert!(ledger.sell("AAA", 10.0, 3).is_err());
        assert_eq!(ledger.shares("AAA"), 2);
    }

    #[test]
    fn round_trip_tracks_loss() {
        let mut ledger = Ledger::new(50.0);
        ledger.purchase("AAA", 9.0, 5).expect("purchase");
        ledger.sell("AAA", 8.1, 5).expect("sale");
        assert!((ledger.cash() - 45.5).abs() < 1e-9);
        assert!((ledger.realized_gain_loss() + 4.5).abs() < 1e-9);
        assert!(ledger.positions().is_empty());
    }
}
