use crate::account::StrategyAccount;
use crate::config::SimulationConfig;
use crate::error::{Result, SimulationError};
use crate::price_matrix::PriceMatrix;
use crate::quotes::HistoricalQuoteProvider;
use crate::report::SimulationReport;
use crate::strategy::{create_strategy, Strategy};
use log::info;
use std::sync::Arc;

/// Replays `sim_length` days of a shared [`PriceMatrix`], oldest first, and
/// lets every configured strategy trade once per day.
pub struct Simulation {
    sim_length: usize,
    date_offset: usize,
    initial_cash: f64,
    matrix: Arc<PriceMatrix>,
    accounts: Vec<StrategyAccount>,
}

impl Simulation {
    /// Fetches market data for `instruments` and sets up the configured
    /// strategies.
    pub fn new(
        config: &SimulationConfig,
        instruments: &[String],
        provider: &dyn HistoricalQuoteProvider,
    ) -> Result<Self> {
        let matrix = PriceMatrix::build(instruments, provider)?;
        Self::from_matrix(config, Arc::new(matrix))
    }

    pub fn from_matrix(config: &SimulationConfig, matrix: Arc<PriceMatrix>) -> Result<Self> {
        let base_seed = config.seed.unwrap_or_else(rand::random);
        let strategies = config
            .strategies
            .iter()
            .enumerate()
            .map(|(idx, spec)| {
                create_strategy(
                    &spec.template_id,
                    &spec.parameters,
                    base_seed.wrapping_add(idx as u64),
                )
            })
            .collect::<Result<Vec<_>>>()?;
        Self::with_strategies(config, matrix, strategies)
    }

    /// Like [`Simulation::from_matrix`] but with caller-built strategies,
    /// which run in the given order.
    pub fn with_strategies(
        config: &SimulationConfig,
        matrix: Arc<PriceMatrix>,
        strategies: Vec<Box<dyn Strategy + Send>>,
    ) -> Result<Self> {
        if config.sim_length == 0 {
            return Err(SimulationError::InvalidConfiguration(
                "sim_length must be at least 1".to_string(),
            ));
        }
        if !(config.initial_cash.is_finite() && config.initial_cash > 0.0) {
            return Err(SimulationError::InvalidConfiguration(format!(
                "initial cash must be positive (value: {})",
                config.initial_cash
            )));
        }

        let span = config.date_offset + config.sim_length;
        let available = matrix.day_count();
        if span >= available {
            return Err(SimulationError::InvalidConfiguration(format!(
                "sim_length + date_offset must be < {} (got {})",
                available, span
            )));
        }

        // the oldest simulated day sees the shortest history
        let oldest_history = available - span;
        for strategy in &strategies {
            let needed = strategy.get_min_history_days();
            if needed > oldest_history {
                return Err(SimulationError::InvalidConfiguration(format!(
                    "{} needs {} days of history, only {} precede the first simulated day",
                    strategy.name(),
                    needed,
                    oldest_history
                )));
            }
        }

        let accounts = strategies
            .into_iter()
            .map(|strategy| StrategyAccount::new(strategy, config.initial_cash))
            .collect();

        Ok(Self {
            sim_length: config.sim_length,
            date_offset: config.date_offset,
            initial_cash: config.initial_cash,
            matrix,
            accounts,
        })
    }

    /// Largest date offset `config` can run at against `day_count` days of
    /// history, or `None` if it cannot run at all.
    pub fn max_date_offset(config: &SimulationConfig, day_count: usize) -> Result<Option<usize>> {
        let mut needed = 1;
        for spec in &config.strategies {
            let strategy = create_strategy(&spec.template_id, &spec.parameters, 0)?;
            needed = needed.max(strategy.get_min_history_days());
        }
        Ok(day_count
            .checked_sub(config.sim_length)
            .and_then(|remaining| remaining.checked_sub(needed)))
    }

    pub fn matrix(&self) -> &PriceMatrix {
        &self.matrix
    }

    pub fn accounts(&self) -> &[StrategyAccount] {
        &self.accounts
    }

    /// Matrix day indices in replay order, oldest first.
    pub fn simulated_days(&self) -> impl Iterator<Item = usize> {
        let newest = self.date_offset;
        (newest..newest + self.sim_length).rev()
    }

    /// Replays every simulated day. Stops at the first failing strategy.
    pub fn run(&mut self) -> Result<()> {
        info!(
            "Simulating {} days (offset {}) for {} strategies with {:.2} each",
            self.sim_length,
            self.date_offset,
            self.accounts.len(),
            self.initial_cash
        );

        let days: Vec<usize> = self.simulated_days().collect();
        for day in days {
            let history = self.matrix.history_before(day);
            let Some(today) = self.matrix.day(day) else {
                return Err(SimulationError::DataUnavailable(format!(
                    "day {} is outside the price matrix",
                    day
                )));
            };
            for account in self.accounts.iter_mut() {
                account.choose(&history, &today)?;
            }
        }

        for account in &self.accounts {
            info!(
                "{} finished with {:.2} cash",
                account.name(),
                account.ledger().cash()
            );
        }
        Ok(())
    }

    pub fn report(&self) -> SimulationReport {
        SimulationReport::from_accounts(&self.accounts)
    }
}
