//! Error types for the simulation core.

use thiserror::Error;

/// Violations of a ledger invariant. Raised by [`crate::ledger::Ledger`] and
/// lifted into [`SimulationError`] by the owning account.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("purchase of {shares} {instrument} @ {price} costs {required:.2}, only {available:.2} cash held")]
    InsufficientFunds {
        instrument: String,
        price: f64,
        shares: u64,
        required: f64,
        available: f64,
    },

    #[error("cannot sell {requested} {instrument}, only {held} held")]
    InsufficientShares {
        instrument: String,
        requested: u64,
        held: u64,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    #[error("historical data unavailable: {0}")]
    DataUnavailable(String),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("{strategy} on day {day}: {source}")]
    InsufficientFunds {
        strategy: String,
        day: usize,
        #[source]
        source: LedgerError,
    },

    #[error("{strategy} on day {day}: {source}")]
    InsufficientShares {
        strategy: String,
        day: usize,
        #[source]
        source: LedgerError,
    },

    #[error("{strategy} on day {day}: no instrument opens below available cash {cash:.2}")]
    InfeasibleTrade {
        strategy: String,
        day: usize,
        cash: f64,
    },
}

impl SimulationError {
    pub fn from_ledger(source: LedgerError, strategy: &str, day: usize) -> Self {
        let strategy = strategy.to_string();
        match source {
            LedgerError::InsufficientFunds { .. } => Self::InsufficientFunds {
                strategy,
                day,
                source,
            },
            LedgerError::InsufficientShares { .. } => Self::InsufficientShares {
                strategy,
                day,
                source,
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, SimulationError>;
