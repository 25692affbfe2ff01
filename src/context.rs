use crate::config::{settings_from_env, SimulationSettings};
use crate::market_data::MarketData;
use crate::robinhood::RobinhoodQuoteClient;
use crate::universe::InstrumentUniverse;
use anyhow::{anyhow, Result};
use log::info;
use std::collections::HashMap;
use std::path::Path;

#[derive(Clone)]
pub struct AppContext {
    settings: SimulationSettings,
}

impl AppContext {
    pub fn initialize() -> Result<Self> {
        Self::from_settings_map(&settings_from_env())
    }

    pub fn from_settings_map(settings: &HashMap<String, String>) -> Result<Self> {
        Ok(Self {
            settings: SimulationSettings::from_settings_map(settings)?,
        })
    }

    pub fn settings(&self) -> &SimulationSettings {
        &self.settings
    }

    pub fn quote_client(&self) -> Result<RobinhoodQuoteClient> {
        Ok(RobinhoodQuoteClient::new(&self.settings.quotes_api_url)?
            .with_max_symbols(self.settings.quote_batch_size))
    }

    /// Loads market data from a snapshot when one is given, otherwise fetches
    /// it live for `universe`.
    pub fn market_data(
        &self,
        data_file: Option<&Path>,
        universe: Option<&InstrumentUniverse>,
    ) -> Result<MarketData> {
        if let Some(path) = data_file {
            return MarketData::load_from_file(path);
        }

        let universe = universe.ok_or_else(|| {
            anyhow!("Pass --tickers or --universe-file, or replay a snapshot with --data-file")
        })?;
        info!(
            "Fetching daily quotes for {} instruments from {}",
            universe.len(),
            self.settings.quotes_api_url
        );
        let client = self.quote_client()?;
        MarketData::fetch(&client, universe.symbols())
    }
}
