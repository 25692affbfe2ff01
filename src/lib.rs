pub mod account;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod ledger;
pub mod market_data;
pub mod models;
pub mod param_utils;
pub mod price_matrix;
pub mod quotes;
pub mod report;
pub mod robinhood;
pub mod simulation;
pub mod strategy;
pub mod strategy_utils;
pub mod sweep;
pub mod universe;
