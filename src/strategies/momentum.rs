use crate::price_matrix::{DayPrices, HistoryWindow};
use crate::strategy_utils::{PerformanceRanking, RankOrder};
use std::collections::HashMap;

/// Buys the instrument that rose the most over the lookback window.
pub struct MomentumStrategy {
    template_id: String,
    name: String,
    ranking: PerformanceRanking,
}

impl MomentumStrategy {
    pub fn new(parameters: &HashMap<String, f64>) -> Self {
        let ranking =
            PerformanceRanking::from_params(parameters, &["lookback", "mo_len"], RankOrder::Descending);
        Self {
            template_id: "momentum".to_string(),
            name: format!("Momentum-{}", ranking.lookback),
            ranking,
        }
    }

    pub fn lookback(&self) -> usize {
        self.ranking.lookback
    }
}

impl super::Strategy for MomentumStrategy {
    fn get_template_id(&self) -> &str {
        &self.template_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn select(
        &mut self,
        history: &HistoryWindow<'_>,
        today: &DayPrices<'_>,
        cash: f64,
    ) -> Option<usize> {
        self.ranking.select(history, today, cash)
    }

    fn get_min_history_days(&self) -> usize {
        self.ranking.min_history_days()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DailyQuote, InstrumentHistory};
    use crate::price_matrix::PriceMatrix;
    use crate::strategy::Strategy;

    fn two_day_matrix(today: [(f64, f64); 3], yesterday: [Option<(f64, f64)>; 3]) -> PriceMatrix {
        let instruments: Vec<String> = ["AAA", "BBB", "CCC"].iter().map(|s| s.to_string()).collect();
        let histories: Vec<InstrumentHistory> = instruments
            .iter()
            .enumerate()
            .map(|(idx, symbol)| {
                let older = match yesterday[idx] {
                    Some((open, close)) => DailyQuote::new(open, close),
                    None => DailyQuote {
                        begins_at: None,
                        open_price: None,
                        close_price: None,
                    },
                };
                InstrumentHistory {
                    symbol: symbol.clone(),
                    quotes: vec![DailyQuote::new(today[idx].0, today[idx].1), older],
                }
            })
            .collect();
        PriceMatrix::from_histories(&instruments, &histories).expect("matrix")
    }

    #[test]
    fn picks_best_performer_and_skips_unaffordable() {
        let m = two_day_matrix(
            [(70.0, 70.0), (20.0, 21.0), (30.0, 29.0)],
            [Some((10.0, 13.0)), Some((10.0, 11.0)), Some((10.0, 9.0))],
        );
        let mut strategy = MomentumStrategy::new(&HashMap::new());
        let today = m.day(0).expect("today");
        assert_eq!(strategy.select(&m.history_before(0), &today, 100.0), Some(0));
        assert_eq!(strategy.select(&m.history_before(0), &today, 50.0), Some(1));
    }

    #[test]
    fn missing_history_ranks_after_every_scored_instrument() {
        let m = two_day_matrix(
            [(5.0, 5.0), (5.0, 5.0), (5.0, 5.0)],
            [None, Some((10.0, 9.0)), Some((10.0, 9.5))],
        );
        let mut strategy = MomentumStrategy::new(&HashMap::new());
        let today = m.day(0).expect("today");
        assert_eq!(strategy.select(&m.history_before(0), &today, 50.0), Some(2));

        // only the instrument with the gap opens below cash
        let m = two_day_matrix(
            [(5.0, 5.0), (60.0, 60.0), (70.0, 70.0)],
            [None, Some((10.0, 9.0)), Some((10.0, 9.5))],
        );
        let today = m.day(0).expect("today");
        assert_eq!(strategy.select(&m.history_before(0), &today, 50.0), Some(0));
    }

    #[test]
    fn ties_prefer_lower_index() {
        let m = two_day_matrix(
            [(5.0, 5.0), (5.0, 5.0), (5.0, 5.0)],
            [Some((10.0, 9.0)), Some((10.0, 11.0)), Some((10.0, 11.0))],
        );
        let mut params = HashMap::new();
        params.insert("mo_len".to_string(), 0.0);
        let mut strategy = MomentumStrategy::new(&params);
        let today = m.day(0).expect("today");
        assert_eq!(strategy.select(&m.history_before(0), &today, 50.0), Some(1));
    }
}
