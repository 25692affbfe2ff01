use crate::param_utils::get_param_usize_any;
use crate::price_matrix::{DayPrices, HistoryWindow};
use std::cmp::Ordering;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankOrder {
    /// Worst performers first
    Ascending,
    /// Best performers first
    Descending,
}

/// Lookback performance ranking shared by the ranked templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerformanceRanking {
    pub lookback: usize,
    pub order: RankOrder,
}

impl PerformanceRanking {
    /// Reads the lookback from the first of `lookback_keys` present in
    /// `parameters`, defaulting to 0 (yesterday's own move).
    pub fn from_params(
        parameters: &HashMap<String, f64>,
        lookback_keys: &[&str],
        order: RankOrder,
    ) -> Self {
        Self {
            lookback: get_param_usize_any(parameters, lookback_keys, 0),
            order,
        }
    }

    /// Walks the ranking until an instrument opens below `cash`.
    pub fn select(
        &self,
        history: &HistoryWindow<'_>,
        today: &DayPrices<'_>,
        cash: f64,
    ) -> Option<usize> {
        let ranking = rank_by_performance(history, today.len(), self.lookback, self.order);
        first_affordable(&ranking, today, cash)
    }

    pub fn min_history_days(&self) -> usize {
        self.lookback + 1
    }
}

/// Rank instruments by `(history[0].close - history[lookback].open) / history[lookback].open`.
///
/// Ties keep the lower instrument index first. Instruments whose change cannot
/// be computed follow the ranked ones in index order, so they are still
/// candidates once every ranked instrument turns out unaffordable.
pub fn rank_by_performance(
    history: &HistoryWindow<'_>,
    instrument_count: usize,
    lookback: usize,
    order: RankOrder,
) -> Vec<usize> {
    let mut scored: Vec<(usize, f64)> = Vec::with_capacity(instrument_count);
    let mut unranked = Vec::new();
    for instrument in 0..instrument_count {
        match history.performance(instrument, lookback) {
            Some(change) => scored.push((instrument, change)),
            None => unranked.push(instrument),
        }
    }

    scored.sort_by(|a, b| {
        let ordering = a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal);
        match order {
            RankOrder::Ascending => ordering,
            RankOrder::Descending => ordering.reverse(),
        }
    });

    scored
        .into_iter()
        .map(|(instrument, _)| instrument)
        .chain(unranked)
        .collect()
}

/// First instrument in `ranking` with an opening price strictly below `cash`
pub fn first_affordable(ranking: &[usize], today: &DayPrices<'_>, cash: f64) -> Option<usize> {
    ranking
        .iter()
        .copied()
        .find(|&instrument| today.is_affordable(instrument, cash))
}

/// All instruments with an opening price strictly below `cash`, in index order
pub fn affordable_instruments(today: &DayPrices<'_>, cash: f64) -> Vec<usize> {
    (0..today.len())
        .filter(|&instrument| today.is_affordable(instrument, cash))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DailyQuote, InstrumentHistory};
    use crate::price_matrix::PriceMatrix;

    fn gap_matrix() -> PriceMatrix {
        // day 0 today, day 1 yesterday; BBB has no quote yesterday
        let mut histories = vec![
            InstrumentHistory {
                symbol: "AAA".to_string(),
                quotes: vec![DailyQuote::new(10.0, 10.0), DailyQuote::new(10.0, 9.0)],
            },
            InstrumentHistory {
                symbol: "BBB".to_string(),
                quotes: vec![DailyQuote::new(5.0, 5.0), DailyQuote::new(10.0, 10.0)],
            },
            InstrumentHistory {
                symbol: "CCC".to_string(),
                quotes: vec![DailyQuote::new(30.0, 30.0), DailyQuote::new(10.0, 12.0)],
            },
        ];
        histories[1].quotes[1].open_price = None;
        let instruments: Vec<String> = histories.iter().map(|h| h.symbol.clone()).collect();
        PriceMatrix::from_histories(&instruments, &histories).expect("matrix")
    }

    #[test]
    fn unrankable_instruments_trail_the_ranking() {
        let m = gap_matrix();
        let history = m.history_before(0);
        assert_eq!(
            rank_by_performance(&history, 3, 0, RankOrder::Ascending),
            vec![0, 2, 1]
        );
        assert_eq!(
            rank_by_performance(&history, 3, 0, RankOrder::Descending),
            vec![2, 0, 1]
        );
    }

    #[test]
    fn walk_falls_through_to_unrankable_affordable_instrument() {
        let m = gap_matrix();
        let today = m.day(0).expect("today");
        let dip = PerformanceRanking {
            lookback: 0,
            order: RankOrder::Ascending,
        };
        assert_eq!(dip.select(&m.history_before(0), &today, 20.0), Some(0));
        // AAA and CCC open at or above 8, BBB at 5 only has a gap yesterday
        assert_eq!(dip.select(&m.history_before(0), &today, 8.0), Some(1));
        assert_eq!(dip.select(&m.history_before(0), &today, 5.0), None);
    }

    #[test]
    fn lookback_comes_from_first_present_alias() {
        let mut params = HashMap::new();
        params.insert("mo_len".to_string(), 3.0);
        let ranking = PerformanceRanking::from_params(&params, &["lookback", "mo_len"], RankOrder::Descending);
        assert_eq!(ranking.lookback, 3);
        assert_eq!(ranking.min_history_days(), 4);
    }
}
