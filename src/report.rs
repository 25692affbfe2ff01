use crate::account::StrategyAccount;
use crate::models::round_cents;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyResult {
    pub name: String,
    pub template_id: String,
    pub initial_cash: f64,
    pub cash: f64,
    pub realized_gain_loss: f64,
    pub return_ratio: f64,
    pub trades: usize,
    pub winning_trades: usize,
}

/// Final state of every strategy after a run, in configuration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub results: Vec<StrategyResult>,
}

impl SimulationReport {
    pub fn from_accounts(accounts: &[StrategyAccount]) -> Self {
        let mut seen: HashMap<String, usize> = HashMap::new();
        let results = accounts
            .iter()
            .map(|account| {
                let count = seen.entry(account.name().to_string()).or_insert(0);
                *count += 1;
                let name = if *count == 1 {
                    account.name().to_string()
                } else {
                    format!("{}#{}", account.name(), count)
                };

                let cash = round_cents(account.ledger().cash());
                let initial_cash = account.initial_cash();
                StrategyResult {
                    name,
                    template_id: account.strategy().get_template_id().to_string(),
                    initial_cash,
                    cash,
                    realized_gain_loss: round_cents(account.ledger().realized_gain_loss()),
                    return_ratio: if initial_cash > 0.0 {
                        cash / initial_cash - 1.0
                    } else {
                        0.0
                    },
                    trades: account.trades().len(),
                    winning_trades: account.trades().iter().filter(|t| t.pnl() > 0.0).count(),
                }
            })
            .collect();
        Self { results }
    }

    /// Strategy name -> final cash rounded to cents.
    pub fn cash_by_strategy(&self) -> BTreeMap<String, f64> {
        self.results
            .iter()
            .map(|result| (result.name.clone(), result.cash))
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&StrategyResult> {
        self.results.iter().find(|result| result.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::{MomentumStrategy, RandomStrategy};

    #[test]
    fn repeated_names_are_disambiguated() {
        let accounts = vec![
            StrategyAccount::new(Box::new(RandomStrategy::new(&HashMap::new(), 1)), 50.0),
            StrategyAccount::new(Box::new(RandomStrategy::new(&HashMap::new(), 2)), 50.0),
            StrategyAccount::new(Box::new(MomentumStrategy::new(&HashMap::new())), 50.0),
        ];
        let report = SimulationReport::from_accounts(&accounts);
        let names: Vec<&str> = report.results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Random", "Random#2", "Momentum-0"]);

        let cash = report.cash_by_strategy();
        assert_eq!(cash.len(), 3);
        assert_eq!(cash.get("Momentum-0"), Some(&50.0));
        assert_eq!(report.get("Random#2").map(|r| r.trades), Some(0));
        assert_eq!(report.get("Random").map(|r| r.return_ratio), Some(0.0));
    }
}
