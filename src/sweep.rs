use crate::config::SimulationConfig;
use crate::error::{Result, SimulationError};
use crate::price_matrix::PriceMatrix;
use crate::report::SimulationReport;
use crate::simulation::Simulation;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OffsetRun {
    pub date_offset: usize,
    pub report: SimulationReport,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategySweepSummary {
    pub name: String,
    pub runs: usize,
    pub mean_cash: f64,
    pub min_cash: f64,
    pub max_cash: f64,
    pub mean_return_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepReport {
    pub runs: Vec<OffsetRun>,
    pub summary: Vec<StrategySweepSummary>,
}

/// Runs the same configuration once per date offset in `offsets`, in
/// parallel over one shared matrix. Any failing run fails the sweep.
pub fn run_offset_sweep(
    matrix: Arc<PriceMatrix>,
    config: &SimulationConfig,
    offsets: Range<usize>,
    show_progress: bool,
) -> Result<SweepReport> {
    if offsets.is_empty() {
        return Err(SimulationError::InvalidConfiguration(
            "offset range is empty".to_string(),
        ));
    }
    let base_seed = config.seed.unwrap_or_else(rand::random);
    info!(
        "Sweeping date offsets {}..{} over {} days of history",
        offsets.start,
        offsets.end,
        matrix.day_count()
    );

    let pb = if show_progress {
        let pb = ProgressBar::new(offsets.len() as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    } else {
        ProgressBar::hidden()
    };

    let runs = offsets
        .into_par_iter()
        .map(|date_offset| -> Result<OffsetRun> {
            let run_config = SimulationConfig {
                date_offset,
                seed: Some(base_seed.wrapping_add((date_offset as u64) << 16)),
                ..config.clone()
            };
            let mut simulation = Simulation::from_matrix(&run_config, Arc::clone(&matrix))?;
            simulation.run()?;
            pb.inc(1);
            Ok(OffsetRun {
                date_offset,
                report: simulation.report(),
            })
        })
        .collect::<Result<Vec<_>>>();

    match &runs {
        Ok(_) => pb.finish_with_message("Sweep completed"),
        Err(_) => pb.abandon_with_message("Sweep failed"),
    }
    let runs = runs?;
    let summary = summarize(&runs);
    Ok(SweepReport { runs, summary })
}

fn summarize(runs: &[OffsetRun]) -> Vec<StrategySweepSummary> {
    let Some(first) = runs.first() else {
        return Vec::new();
    };

    first
        .report
        .results
        .iter()
        .map(|result| {
            let outcomes: Vec<(f64, f64)> = runs
                .iter()
                .filter_map(|run| run.report.get(&result.name))
                .map(|r| (r.cash, r.return_ratio))
                .collect();
            let count = outcomes.len().max(1) as f64;
            StrategySweepSummary {
                name: result.name.clone(),
                runs: outcomes.len(),
                mean_cash: outcomes.iter().map(|o| o.0).sum::<f64>() / count,
                min_cash: outcomes.iter().map(|o| o.0).fold(f64::INFINITY, f64::min),
                max_cash: outcomes.iter().map(|o| o.0).fold(f64::NEG_INFINITY, f64::max),
                mean_return_ratio: outcomes.iter().map(|o| o.1).sum::<f64>() / count,
            }
        })
        .collect()
}
