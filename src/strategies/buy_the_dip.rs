use crate::price_matrix::{DayPrices, HistoryWindow};
use crate::strategy_utils::{PerformanceRanking, RankOrder};
use std::collections::HashMap;

/// Buys the instrument that fell the most over the lookback window.
pub struct BuyTheDipStrategy {
    template_id: String,
    name: String,
    ranking: PerformanceRanking,
}

impl BuyTheDipStrategy {
    pub fn new(parameters: &HashMap<String, f64>) -> Self {
        let ranking =
            PerformanceRanking::from_params(parameters, &["lookback", "dip_len"], RankOrder::Ascending);
        Self {
            template_id: "buy_the_dip".to_string(),
            name: format!("BuyTheDip-{}", ranking.lookback),
            ranking,
        }
    }

    pub fn lookback(&self) -> usize {
        self.ranking.lookback
    }
}

impl super::Strategy for BuyTheDipStrategy {
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
