use crate::price_matrix::{DayPrices, HistoryWindow};
use crate::strategy_utils::affordable_instruments;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

const MAX_DRAWS: usize = 10_000;

/// Picks uniformly among instruments that open below the available cash.
pub struct RandomStrategy {
    template_id: String,
    name: String,
    rng: StdRng,
}

impl RandomStrategy {
    /// A `seed` parameter, when present, overrides the seed supplied by the
    /// simulation.
    pub fn new(parameters: &HashMap<String, f64>, seed: u64) -> Self {
        let seed = crate::param_utils::get_param_seed(parameters, "seed").unwrap_or(seed);
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            template_id: "random".to_string(),
            name: "Random".to_string(),
            rng,
        }
    }
}

impl super::Strategy for RandomStrategy {
    fn get_template_id(&self) -> &str {
        &self.template_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn select(
        &mut self,
        _history: &HistoryWindow<'_>,
        today: &DayPrices<'_>,
        cash: f64,
    ) -> Option<usize> {
        let affordable = affordable_instruments(today, cash);
        if affordable.is_empty() {
            return None;
        }

        // Draw from the whole universe until an affordable one comes up
        for _ in 0..MAX_DRAWS {
            let candidate = self.rng.gen_range(0..today.len());
            if today.is_affordable(candidate, cash) {
                return Some(candidate);
            }
        }

        affordable.choose(&mut self.rng).copied()
    }
}
