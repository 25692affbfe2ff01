use crate::error::SimulationError;
use crate::price_matrix::{DayPrices, HistoryWindow};
use std::collections::HashMap;

/// A daily decision rule. Each simulated day the strategy picks exactly one
/// instrument to buy at the open and sell at the close.
pub trait Strategy {
    fn get_template_id(&self) -> &str;

    /// Display name including any parameter suffix, e.g. `BuyTheDip-5`.
    fn name(&self) -> &str;

    /// Picks an instrument whose opening price is strictly below `cash`.
    /// Returns `None` when no candidate is affordable.
    fn select(
        &mut self,
        history: &HistoryWindow<'_>,
        today: &DayPrices<'_>,
        cash: f64,
    ) -> Option<usize>;

    /// Days of history the strategy reads, counting yesterday as one.
    fn get_min_history_days(&self) -> usize {
        1
    }
}

#[path = "strategies/random.rs"]
pub mod random;

pub use random::RandomStrategy;

#[path = "strategies/buy_the_dip.rs"]
pub mod buy_the_dip;

pub use buy_the_dip::BuyTheDipStrategy;

#[path = "strategies/momentum.rs"]
pub mod momentum;

pub use momentum::MomentumStrategy;

pub fn create_strategy(
    template_id: &str,
    parameters: &HashMap<String, f64>,
    seed: u64,
) -> Result<Box<dyn Strategy + Send>, SimulationError> {
    match template_id {
        "random" => Ok(Box::new(RandomStrategy::new(parameters, seed))),
        "buy_the_dip" | "btfd" => Ok(Box::new(BuyTheDipStrategy::new(parameters))),
        "momentum" => Ok(Box::new(MomentumStrategy::new(parameters))),
        _ => Err(SimulationError::InvalidConfiguration(format!(
            "Unknown strategy template: {}",
            template_id
        ))),
    }
}
