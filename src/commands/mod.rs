pub mod export_market_data;
pub mod market_data_snapshot;
pub mod simulate;
pub mod sweep;
