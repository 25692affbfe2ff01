use crate::error::{Result, SimulationError};
use crate::ledger::Ledger;
use crate::models::TradeRecord;
use crate::price_matrix::{DayPrices, HistoryWindow};
use crate::strategy::Strategy;
use log::debug;

/// A strategy together with the ledger it alone trades against.
pub struct StrategyAccount {
    strategy: Box<dyn Strategy + Send>,
    ledger: Ledger,
    initial_cash: f64,
    trades: Vec<TradeRecord>,
}

impl StrategyAccount {
    pub fn new(strategy: Box<dyn Strategy + Send>, initial_cash: f64) -> Self {
        Self {
            strategy,
            ledger: Ledger::new(initial_cash),
            initial_cash,
            trades: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        self.strategy.name()
    }

    pub fn strategy(&self) -> &dyn Strategy {
        self.strategy.as_ref()
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn initial_cash(&self) -> f64 {
        self.initial_cash
    }

    pub fn trades(&self) -> &[TradeRecord] {
        &self.trades
    }

    /// Lets the strategy pick today's instrument and trades it open to close.
    pub fn choose(&mut self, history: &HistoryWindow<'_>, today: &DayPrices<'_>) -> Result<()> {
        let cash = self.ledger.cash();
        let choice = self
            .strategy
            .select(history, today, cash)
            .filter(|&instrument| today.is_affordable(instrument, cash));
        let Some(choice) = choice else {
            return Err(SimulationError::InfeasibleTrade {
                strategy: self.strategy.name().to_string(),
                day: today.day(),
                cash,
            });
        };

        self.invest(choice, today)
    }

    /// Buys as many shares of `instrument` as cash allows at the open and
    /// sells all of them at the close.
    pub fn invest(&mut self, instrument: usize, today: &DayPrices<'_>) -> Result<()> {
        let day = today.day();
        let cash_before = self.ledger.cash();
        let Some(price) = today.price(instrument) else {
            return Err(SimulationError::InfeasibleTrade {
                strategy: self.strategy.name().to_string(),
                day,
                cash: cash_before,
            });
        };
        let symbol = today.symbol(instrument);
        let shares = self.ledger.max_affordable_shares(price.open);

        self.ledger
            .purchase(symbol, price.open, shares)
            .map_err(|err| SimulationError::from_ledger(err, self.strategy.name(), day))?;
        self.ledger
            .sell(symbol, price.close, shares)
            .map_err(|err| SimulationError::from_ledger(err, self.strategy.name(), day))?;

        let record = TradeRecord {
            day,
            instrument: symbol.to_string(),
            shares,
            open: price.open,
            close: price.close,
            cash_before,
            cash_after: self.ledger.cash(),
        };
        debug!(
            "{} day {}: {} x {} @ {:.2} -> {:.2}, cash {:.2} -> {:.2}",
            self.strategy.name(),
            day,
            record.shares,
            record.instrument,
            record.open,
            record.close,
            record.cash_before,
            record.cash_after
        );
        self.trades.push(record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{round_cents, DailyQuote, InstrumentHistory};
    use crate::price_matrix::PriceMatrix;
    use crate::strategy::{BuyTheDipStrategy, MomentumStrategy};
    use std::collections::HashMap;

    fn matrix() -> PriceMatrix {
        let instruments = vec!["AAA".to_string(), "BBB".to_string()];
        let histories = vec![
            InstrumentHistory {
                symbol: "AAA".to_string(),
                quotes: vec![DailyQuote::new(9.0, 9.45), DailyQuote::new(10.0, 9.0)],
            },
            InstrumentHistory {
                symbol: "BBB".to_string(),
                quotes: vec![DailyQuote::new(7.0, 6.3), DailyQuote::new(20.0, 21.0)],
            },
        ];
        PriceMatrix::from_histories(&instruments, &histories).expect("matrix")
    }

    #[test]
    fn round_trip_conserves_cash_and_closes_position() {
        let m = matrix();
        let today = m.day(0).expect("today");
        let mut account =
            StrategyAccount::new(Box::new(BuyTheDipStrategy::new(&HashMap::new())), 50.0);
        account.choose(&m.history_before(0), &today).expect("trade");

        // BuyTheDip picks AAA (-10%): 5 shares at 9.00, sold at 9.45
        let trade = &account.trades()[0];
        assert_eq!(trade.instrument, "AAA");
        assert_eq!(trade.shares, 5);
        let expected = 50.0 - round_cents(9.0 * 5.0) + round_cents(9.45 * 5.0);
        assert!((account.ledger().cash() - expected).abs() < 1e-9);
        assert!(account.ledger().positions().is_empty());
        assert!((trade.pnl() - 2.25).abs() < 1e-9);
    }

    #[test]
    fn unaffordable_universe_is_infeasible() {
        let m = matrix();
        let today = m.day(0).expect("today");
        let mut account =
            StrategyAccount::new(Box::new(MomentumStrategy::new(&HashMap::new())), 5.0);
        let err = account.choose(&m.history_before(0), &today).unwrap_err();
        assert!(matches!(
            err,
            SimulationError::InfeasibleTrade { day: 0, ref strategy, .. } if strategy == "Momentum-0"
        ));
        assert!(account.trades().is_empty());
        assert_eq!(account.ledger().cash(), 5.0);
    }
}
