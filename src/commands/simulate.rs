use crate::commands::market_data_snapshot::ensure_market_data_file;
use crate::config::SimulationConfig;
use crate::context::AppContext;
use crate::price_matrix::PriceMatrix;
use crate::simulation::Simulation;
use crate::universe::InstrumentUniverse;
use anyhow::{Context, Result};
use log::info;
use std::path::Path;
use std::sync::Arc;

pub fn run(
    app: &AppContext,
    config: &SimulationConfig,
    universe: Option<&InstrumentUniverse>,
    data_file: Option<&Path>,
    detailed: bool,
) -> Result<()> {
    if let Some(path) = data_file {
        ensure_market_data_file(path)?;
    }
    let market_data = app.market_data(data_file, universe)?;
    let instruments = match universe {
        Some(universe) => universe.symbols().to_vec(),
        None => market_data.instruments().to_vec(),
    };

    let matrix = PriceMatrix::build(&instruments, &market_data)
        .context("Failed to build price matrix")?;
    let mut simulation = Simulation::from_matrix(config, Arc::new(matrix))?;
    simulation.run().context("Simulation aborted")?;

    let report = simulation.report();
    for result in &report.results {
        info!(
            "{:<14} cash {:>10.2}  return {:>7.2}%  trades {}",
            result.name,
            result.cash,
            result.return_ratio * 100.0,
            result.trades
        );
    }

    let output = if detailed {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string_pretty(&report.cash_by_strategy())?
    };
    println!("{}", output);
    Ok(())
}
