use crate::models::{HistorySpan, InstrumentHistory, QuoteInterval};
use anyhow::{anyhow, Result};
use log::{debug, warn};
use std::collections::HashMap;

pub const DEFAULT_MAX_INSTRUMENTS_PER_REQUEST: usize = 75;

/// Source of historical daily quotes.
///
/// Implementations return one [`InstrumentHistory`] per requested symbol, in
/// request order, each with its quotes ordered most recent day first. An
/// instrument without any records is returned with an empty quote list.
pub trait HistoricalQuoteProvider {
    fn fetch_history(
        &self,
        instruments: &[String],
        span: HistorySpan,
        interval: QuoteInterval,
    ) -> Result<Vec<InstrumentHistory>>;

    fn max_instruments_per_request(&self) -> usize {
        DEFAULT_MAX_INSTRUMENTS_PER_REQUEST
    }
}

/// Fetches the full universe in provider-sized batches and concatenates the
/// results in the original instrument order.
pub fn fetch_in_batches(
    provider: &dyn HistoricalQuoteProvider,
    instruments: &[String],
    span: HistorySpan,
    interval: QuoteInterval,
) -> Result<Vec<InstrumentHistory>> {
    let batch_size = provider.max_instruments_per_request().max(1);
    let mut histories = Vec::with_capacity(instruments.len());

    for (batch_index, batch) in instruments.chunks(batch_size).enumerate() {
        debug!(
            "Fetching {} history for batch {} ({} instruments)",
            span.as_str(),
            batch_index + 1,
            batch.len()
        );
        let fetched = provider.fetch_history(batch, span, interval)?;
        if fetched.len() != batch.len() {
            return Err(anyhow!(
                "Quote provider returned {} histories for a batch of {} instruments",
                fetched.len(),
                batch.len()
            ));
        }
        histories.extend(fetched);
    }

    Ok(histories)
}

/// In-memory provider over pre-loaded histories keyed by symbol.
#[derive(Debug, Clone, Default)]
pub struct StaticQuoteProvider {
    histories: HashMap<String, InstrumentHistory>,
    max_per_request: Option<usize>,
}

impl StaticQuoteProvider {
    pub fn new(histories: Vec<InstrumentHistory>) -> Self {
        Self {
            histories: histories
                .into_iter()
                .map(|history| (history.symbol.clone(), history))
                .collect(),
            max_per_request: None,
        }
    }

    pub fn with_max_per_request(mut self, limit: usize) -> Self {
        self.max_per_request = Some(limit);
        self
    }
}

impl HistoricalQuoteProvider for StaticQuoteProvider {
    fn fetch_history(
        &self,
        instruments: &[String],
        _span: HistorySpan,
        _interval: QuoteInterval,
    ) -> Result<Vec<InstrumentHistory>> {
        if let Some(limit) = self.max_per_request {
            if instruments.len() > limit {
                return Err(anyhow!(
                    "Requested {} instruments, provider accepts at most {}",
                    instruments.len(),
                    limit
                ));
            }
        }

        Ok(instruments
            .iter()
            .map(|symbol| match self.histories.get(symbol) {
                Some(history) => history.clone(),
                None => {
                    warn!("No quote history stored for {}", symbol);
                    InstrumentHistory::empty(symbol)
                }
            })
            .collect())
    }

    fn max_instruments_per_request(&self) -> usize {
        self.max_per_request
            .unwrap_or(DEFAULT_MAX_INSTRUMENTS_PER_REQUEST)
    }
}
