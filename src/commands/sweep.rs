use crate::commands::market_data_snapshot::ensure_market_data_file;
use crate::config::SimulationConfig;
use crate::context::AppContext;
use crate::price_matrix::PriceMatrix;
use crate::simulation::Simulation;
use crate::sweep::run_offset_sweep;
use anyhow::{anyhow, Context, Result};
use log::info;
use std::path::Path;
use std::sync::Arc;

pub fn run(
    app: &AppContext,
    config: &SimulationConfig,
    data_file: &Path,
    max_offset: Option<usize>,
) -> Result<()> {
    ensure_market_data_file(data_file)?;
    let market_data = app.market_data(Some(data_file), None)?;
    let matrix = PriceMatrix::build(market_data.instruments(), &market_data)
        .context("Failed to build price matrix")?;

    let limit = Simulation::max_date_offset(config, matrix.day_count())?.ok_or_else(|| {
        anyhow!(
            "sim_length {} with the configured lookbacks needs more than {} days of history",
            config.sim_length,
            matrix.day_count()
        )
    })?;
    let last_offset = max_offset.map(|value| value.min(limit)).unwrap_or(limit);

    let sweep = run_offset_sweep(Arc::new(matrix), config, 0..last_offset + 1, true)?;
    for summary in &sweep.summary {
        info!(
            "{:<14} mean {:>10.2}  min {:>10.2}  max {:>10.2}  over {} runs",
            summary.name, summary.mean_cash, summary.min_cash, summary.max_cash, summary.runs
        );
    }
    println!("{}", serde_json::to_string_pretty(&sweep.summary)?);
    Ok(())
}
