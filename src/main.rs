use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use daysim::{
    commands::{export_market_data, simulate, sweep},
    config::{SimulationConfig, StrategySpec},
    context::AppContext,
    universe::InstrumentUniverse,
};
use log::info;
use std::path::PathBuf;

const DEFAULT_MARKET_DATA_FILE: &str = "data/market-data.bin";

#[derive(Parser)]
#[command(name = "daysim")]
#[command(about = "Replays daily open-to-close trading strategies against historical quotes")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Default)]
struct UniverseArgs {
    /// Comma or space separated ticker symbols
    #[arg(long, value_delimiter = ',', num_args = 1..)]
    tickers: Vec<String>,
    /// File with ticker symbols (one or more per line, # starts a comment)
    #[arg(long = "universe-file", value_name = "PATH")]
    universe_file: Option<PathBuf>,
}

impl UniverseArgs {
    fn resolve(&self) -> Result<Option<InstrumentUniverse>> {
        match (&self.universe_file, self.tickers.is_empty()) {
            (Some(path), _) => Ok(Some(InstrumentUniverse::from_file(path)?)),
            (None, false) => Ok(Some(InstrumentUniverse::from_symbols(&self.tickers)?)),
            (None, true) => Ok(None),
        }
    }
}

#[derive(Args, Clone, Default)]
struct SimulationArgs {
    /// Number of trading days to replay (defaults to SIM_LENGTH or 10)
    #[arg(long)]
    sim_length: Option<usize>,
    /// Starting cash per strategy (defaults to INITIAL_CASH or 50)
    #[arg(long)]
    cash: Option<f64>,
    /// Seed for randomised strategies (defaults to RANDOM_SEED, else random)
    #[arg(long)]
    seed: Option<u64>,
    /// Strategy to run, e.g. `random`, `buy_the_dip:lookback=5`, `momentum:5`.
    /// Repeat for several; defaults to the standard lineup
    #[arg(long = "strategy", value_name = "SPEC")]
    strategies: Vec<StrategySpec>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one simulation and print final cash per strategy
    Simulate {
        #[command(flatten)]
        universe: UniverseArgs,
        #[command(flatten)]
        simulation: SimulationArgs,
        /// Most recent days to skip before the simulated window
        #[arg(long)]
        date_offset: Option<usize>,
        /// Replay a market data snapshot instead of fetching quotes
        #[arg(long = "data-file", value_name = "PATH")]
        data_file: Option<PathBuf>,
        /// Print the full report instead of the cash mapping
        #[arg(long)]
        detailed: bool,
    },
    /// Fetch a year of daily quotes and store them as a snapshot
    ExportMarketData {
        #[command(flatten)]
        universe: UniverseArgs,
        /// Destination file for the snapshot
        #[arg(short, long = "output", value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Repeat a simulation for every date offset a snapshot allows
    Sweep {
        #[command(flatten)]
        simulation: SimulationArgs,
        /// Path to the market data snapshot file
        #[arg(long = "data-file", value_name = "PATH")]
        data_file: Option<PathBuf>,
        /// Largest date offset to include
        #[arg(long)]
        max_offset: Option<usize>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let app_context = AppContext::initialize()?;
    info!("Starting daysim. Not financial advice.");

    match cli.command {
        Commands::Simulate {
            universe,
            simulation,
            date_offset,
            data_file,
            detailed,
        } => {
            let mut config = build_config(&app_context, simulation);
            if let Some(offset) = date_offset {
                config.date_offset = offset;
            }
            let universe = universe.resolve()?;
            simulate::run(
                &app_context,
                &config,
                universe.as_ref(),
                data_file.as_deref(),
                detailed,
            )?;
        }
        Commands::ExportMarketData { universe, output } => {
            let universe = universe
                .resolve()?
                .ok_or_else(|| anyhow!("Pass --tickers or --universe-file to export"))?;
            let output_path = resolve_market_data_path(output);
            export_market_data::run(&app_context, &universe, &output_path)?;
        }
        Commands::Sweep {
            simulation,
            data_file,
            max_offset,
        } => {
            let config = build_config(&app_context, simulation);
            let market_data_path = resolve_market_data_path(data_file);
            sweep::run(&app_context, &config, &market_data_path, max_offset)?;
        }
    }

    Ok(())
}

fn build_config(app_context: &AppContext, args: SimulationArgs) -> SimulationConfig {
    let strategies = if args.strategies.is_empty() {
        StrategySpec::default_lineup()
    } else {
        args.strategies
    };
    let mut config = app_context.settings().simulation_config(strategies);
    if let Some(sim_length) = args.sim_length {
        config.sim_length = sim_length;
    }
    if let Some(cash) = args.cash {
        config.initial_cash = cash;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    config
}

fn resolve_market_data_path(cli_value: Option<PathBuf>) -> PathBuf {
    if let Some(path) = cli_value {
        return path;
    }

    PathBuf::from(DEFAULT_MARKET_DATA_FILE)
}
