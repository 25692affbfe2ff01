use crate::error::{Result, SimulationError};
use crate::models::{HistorySpan, InstrumentHistory, PricePoint, QuoteInterval};
use crate::quotes::{fetch_in_batches, HistoricalQuoteProvider};
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Immutable table of daily open/close prices indexed `[day][instrument]`.
///
/// Day 0 is the most recent day in the dataset and larger indices move back
/// in time. A cell is `None` when the instrument has no usable quote for that
/// day; missing cells are never treated as a price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceMatrix {
    instruments: Vec<String>,
    day_count: usize,
    cells: Vec<Option<PricePoint>>,
}

impl PriceMatrix {
    /// Fetches a year of daily quotes for `instruments` and lays them out on
    /// a shared day grid.
    pub fn build(
        instruments: &[String],
        provider: &dyn HistoricalQuoteProvider,
    ) -> Result<Self> {
        if instruments.is_empty() {
            return Err(SimulationError::DataUnavailable(
                "no instruments requested".to_string(),
            ));
        }
        let histories =
            fetch_in_batches(provider, instruments, HistorySpan::Year, QuoteInterval::Day)
                .map_err(|err| SimulationError::DataUnavailable(format!("{:#}", err)))?;
        Self::from_histories(instruments, &histories)
    }

    /// Builds the matrix from per-instrument histories (most recent first),
    /// one per entry of `instruments` in the same order.
    pub fn from_histories(instruments: &[String], histories: &[InstrumentHistory]) -> Result<Self> {
        if instruments.is_empty() {
            return Err(SimulationError::DataUnavailable(
                "no instruments requested".to_string(),
            ));
        }
        if histories.len() != instruments.len() {
            return Err(SimulationError::DataUnavailable(format!(
                "received {} histories for {} instruments",
                histories.len(),
                instruments.len()
            )));
        }

        let mut day_count: Option<usize> = None;
        for (symbol, history) in instruments.iter().zip(histories) {
            if history.symbol != *symbol {
                return Err(SimulationError::DataUnavailable(format!(
                    "history for {} arrived in the slot for {}",
                    history.symbol, symbol
                )));
            }
            if history.quotes.is_empty() {
                warn!("No historical quotes for {}; treating every day as missing", symbol);
                continue;
            }
            match day_count {
                None => day_count = Some(history.quotes.len()),
                Some(expected) if expected != history.quotes.len() => {
                    return Err(SimulationError::DataUnavailable(format!(
                        "{} has {} days of history, expected {}",
                        symbol,
                        history.quotes.len(),
                        expected
                    )));
                }
                Some(_) => {}
            }
        }

        let Some(day_count) = day_count else {
            return Err(SimulationError::DataUnavailable(
                "provider returned zero historical days".to_string(),
            ));
        };

        let instrument_count = instruments.len();
        let mut cells = vec![None; day_count * instrument_count];
        for (instrument, history) in histories.iter().enumerate() {
            for (day, quote) in history.quotes.iter().enumerate() {
                cells[day * instrument_count + instrument] = quote.price_point();
            }
        }

        info!(
            "Built price matrix: {} days x {} instruments",
            day_count, instrument_count
        );

        Ok(Self {
            instruments: instruments.to_vec(),
            day_count,
            cells,
        })
    }

    pub fn instruments(&self) -> &[String] {
        &self.instruments
    }

    pub fn instrument_count(&self) -> usize {
        self.instruments.len()
    }

    pub fn day_count(&self) -> usize {
        self.day_count
    }

    pub fn instrument_index(&self, symbol: &str) -> Option<usize> {
        self.instruments.iter().position(|s| s == symbol)
    }

    pub fn price(&self, day: usize, instrument: usize) -> Option<PricePoint> {
        if day >= self.day_count || instrument >= self.instruments.len() {
            return None;
        }
        self.cells[day * self.instruments.len() + instrument]
    }

    /// Prices of every instrument on `day`.
    pub fn day(&self, day: usize) -> Option<DayPrices<'_>> {
        if day >= self.day_count {
            return None;
        }
        let width = self.instruments.len();
        Some(DayPrices {
            day,
            instruments: &self.instruments,
            cells: &self.cells[day * width..(day + 1) * width],
        })
    }

    /// Every day strictly older than `day`, most recent first.
    pub fn history_before(&self, day: usize) -> HistoryWindow<'_> {
        HistoryWindow {
            matrix: self,
            first_day: (day + 1).min(self.day_count),
        }
    }
}

/// One day's prices across the instrument universe.
#[derive(Debug, Clone, Copy)]
pub struct DayPrices<'a> {
    day: usize,
    instruments: &'a [String],
    cells: &'a [Option<PricePoint>],
}

impl<'a> DayPrices<'a> {
    /// Matrix day index this slice was taken from.
    pub fn day(&self) -> usize {
        self.day
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn symbol(&self, instrument: usize) -> &'a str {
        &self.instruments[instrument]
    }

    pub fn price(&self, instrument: usize) -> Option<PricePoint> {
        self.cells.get(instrument).copied().flatten()
    }

    pub fn open(&self, instrument: usize) -> Option<f64> {
        self.price(instrument).map(|p| p.open)
    }

    pub fn close(&self, instrument: usize) -> Option<f64> {
        self.price(instrument).map(|p| p.close)
    }

    /// Whether at least one share of `instrument` opens strictly below `cash`.
    pub fn is_affordable(&self, instrument: usize, cash: f64) -> bool {
        matches!(self.open(instrument), Some(open) if open > 0.0 && open < cash)
    }
}

/// Rolling history ending the day before the simulated day. Index 0 is
/// "yesterday".
#[derive(Debug, Clone, Copy)]
pub struct HistoryWindow<'a> {
    matrix: &'a PriceMatrix,
    first_day: usize,
}

impl<'a> HistoryWindow<'a> {
    pub fn len(&self) -> usize {
        self.matrix.day_count - self.first_day
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Matrix day index of `history[0]`.
    pub fn first_day(&self) -> usize {
        self.first_day
    }

    pub fn day(&self, offset: usize) -> Option<DayPrices<'a>> {
        if offset >= self.len() {
            return None;
        }
        self.matrix.day(self.first_day + offset)
    }

    /// `(history[0].close - history[lookback].open) / history[lookback].open`,
    /// or `None` if either price is missing or the base is not positive.
    pub fn performance(&self, instrument: usize, lookback: usize) -> Option<f64> {
        let latest_close = self.day(0)?.close(instrument)?;
        let base_open = self.day(lookback)?.open(instrument)?;
        if base_open <= 0.0 {
            return None;
        }
        let change = (latest_close - base_open) / base_open;
        change.is_finite().then_some(change)
    }
}
