use crate::models::{HistorySpan, InstrumentHistory, QuoteInterval};
use crate::quotes::{fetch_in_batches, HistoricalQuoteProvider, StaticQuoteProvider};
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

const MARKET_DATA_SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct MarketDataSnapshot {
    version: u32,
    generated_at: DateTime<Utc>,
    span: HistorySpan,
    interval: QuoteInterval,
    instruments: Vec<String>,
    histories: Vec<InstrumentHistory>,
}

/// Raw quote histories captured once from a live provider so simulations can
/// be replayed offline.
pub struct MarketData {
    generated_at: DateTime<Utc>,
    instruments: Vec<String>,
    provider: StaticQuoteProvider,
    histories: Vec<InstrumentHistory>,
}

impl MarketData {
    /// Downloads a year of daily quotes for `instruments`.
    pub fn fetch(provider: &dyn HistoricalQuoteProvider, instruments: &[String]) -> Result<Self> {
        let histories =
            fetch_in_batches(provider, instruments, HistorySpan::Year, QuoteInterval::Day)?;
        Self::from_components(Utc::now(), instruments.to_vec(), histories)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| {
            format!("Failed to open market data snapshot at {}", path.display())
        })?;
        let reader = BufReader::new(file);
        let snapshot: MarketDataSnapshot =
            bincode::deserialize_from(reader).context("Snapshot decode failed")?;

        if snapshot.version != MARKET_DATA_SNAPSHOT_VERSION {
            return Err(anyhow!(
                "Market data snapshot version mismatch (found {}, expected {})",
                snapshot.version,
                MARKET_DATA_SNAPSHOT_VERSION
            ));
        }

        info!(
            "Loaded market data snapshot from {} ({} instruments, generated {})",
            path.display(),
            snapshot.instruments.len(),
            snapshot.generated_at.format("%Y-%m-%d %H:%M")
        );
        Self::from_components(
            snapshot.generated_at,
            snapshot.instruments,
            snapshot.histories,
        )
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create snapshot directory {}", parent.display())
                })?;
            }
        }

        let file = File::create(path).with_context(|| {
            format!(
                "Unable to create market data snapshot at {}",
                path.display()
            )
        })?;
        let mut writer = BufWriter::new(file);
        let snapshot = MarketDataSnapshot {
            version: MARKET_DATA_SNAPSHOT_VERSION,
            generated_at: self.generated_at,
            span: HistorySpan::Year,
            interval: QuoteInterval::Day,
            instruments: self.instruments.clone(),
            histories: self.histories.clone(),
        };
        bincode::serialize_into(&mut writer, &snapshot)
            .context("Failed to serialize market data snapshot")?;
        writer
            .flush()
            .context("Failed to flush market data snapshot to disk")?;
        Ok(())
    }

    fn from_components(
        generated_at: DateTime<Utc>,
        instruments: Vec<String>,
        histories: Vec<InstrumentHistory>,
    ) -> Result<Self> {
        if instruments.is_empty() {
            return Err(anyhow!("Market data snapshot has no instruments"));
        }
        if histories.len() != instruments.len() {
            return Err(anyhow!(
                "Market data snapshot has {} histories for {} instruments",
                histories.len(),
                instruments.len()
            ));
        }

        Ok(Self {
            generated_at,
            provider: StaticQuoteProvider::new(histories.clone()),
            instruments,
            histories,
        })
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    pub fn instruments(&self) -> &[String] {
        &self.instruments
    }

    pub fn histories(&self) -> &[InstrumentHistory] {
        &self.histories
    }
}

impl HistoricalQuoteProvider for MarketData {
    fn fetch_history(
        &self,
        instruments: &[String],
        span: HistorySpan,
        interval: QuoteInterval,
    ) -> Result<Vec<InstrumentHistory>> {
        self.provider.fetch_history(instruments, span, interval)
    }

    fn max_instruments_per_request(&self) -> usize {
        usize::MAX
    }
}
