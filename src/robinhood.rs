use crate::models::{DailyQuote, HistorySpan, InstrumentHistory, QuoteInterval};
use crate::quotes::HistoricalQuoteProvider;
use crate::universe::normalize_ticker_symbol;
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use reqwest::blocking::Client;
use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::thread::sleep;
use std::time::Duration;

const HISTORICALS_PATH: &str = "/quotes/historicals/";
const MAX_SYMBOLS_PER_REQUEST: usize = 75;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const REQUEST_DELAY: Duration = Duration::from_millis(350);

/// Blocking client for the brokerage's historical quotes endpoint.
pub struct RobinhoodQuoteClient {
    http: Client,
    base_url: String,
    max_symbols: usize,
}

impl RobinhoodQuoteClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_symbols: MAX_SYMBOLS_PER_REQUEST,
        })
    }

    /// Lowers the per-request symbol limit; the endpoint's own cap still applies.
    pub fn with_max_symbols(mut self, max_symbols: usize) -> Self {
        self.max_symbols = max_symbols.clamp(1, MAX_SYMBOLS_PER_REQUEST);
        self
    }

    fn get_historicals(
        &self,
        symbols: &[String],
        span: HistorySpan,
        interval: QuoteInterval,
    ) -> Result<HistoricalsResponse> {
        let url = format!("{}{}", self.base_url, HISTORICALS_PATH);
        let joined = symbols.join(",");
        let response = self
            .http
            .get(&url)
            .query(&[
                ("symbols", joined.as_str()),
                ("interval", interval.as_str()),
                ("span", span.as_str()),
            ])
            .send()
            .with_context(|| format!("GET {} failed", url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(anyhow!(
                "Historical quotes request failed with status {}: {}",
                status,
                body
            ));
        }

        response
            .json::<HistoricalsResponse>()
            .context("Failed to decode historical quotes response")
    }
}

impl HistoricalQuoteProvider for RobinhoodQuoteClient {
    fn fetch_history(
        &self,
        instruments: &[String],
        span: HistorySpan,
        interval: QuoteInterval,
    ) -> Result<Vec<InstrumentHistory>> {
        if instruments.is_empty() {
            return Ok(Vec::new());
        }
        debug!("Requesting historicals for {}", instruments.join(","));
        let response = self.get_historicals(instruments, span, interval)?;
        let histories = histories_in_request_order(instruments, response);
        sleep(REQUEST_DELAY);
        Ok(histories)
    }

    fn max_instruments_per_request(&self) -> usize {
        self.max_symbols
    }
}

#[derive(Debug, Deserialize)]
struct HistoricalsResponse {
    #[serde(default)]
    results: Vec<Option<HistoricalsResult>>,
}

#[derive(Debug, Deserialize)]
struct HistoricalsResult {
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default)]
    historicals: Vec<HistoricalBar>,
}

#[derive(Debug, Deserialize)]
struct HistoricalBar {
    #[serde(default)]
    begins_at: Option<String>,
    #[serde(default, deserialize_with = "deserialize_f64_opt")]
    open_price: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_f64_opt")]
    close_price: Option<f64>,
}

/// Matches results to the requested symbols and flips each history to most
/// recent day first. Symbols the endpoint omitted come back empty.
fn histories_in_request_order(
    instruments: &[String],
    response: HistoricalsResponse,
) -> Vec<InstrumentHistory> {
    let mut by_symbol: HashMap<String, Vec<DailyQuote>> = HashMap::new();
    for result in response.results.into_iter().flatten() {
        let Some(symbol) = result.symbol.as_deref().and_then(normalize_ticker_symbol) else {
            continue;
        };
        let quotes = result
            .historicals
            .into_iter()
            .rev()
            .map(|bar| DailyQuote {
                begins_at: parse_timestamp(bar.begins_at.as_deref()),
                open_price: bar.open_price,
                close_price: bar.close_price,
            })
            .collect();
        by_symbol.insert(symbol, quotes);
    }

    instruments
        .iter()
        .map(|symbol| {
            let key = normalize_ticker_symbol(symbol).unwrap_or_default();
            match by_symbol.remove(&key) {
                Some(quotes) => InstrumentHistory {
                    symbol: symbol.clone(),
                    quotes,
                },
                None => {
                    warn!("No historicals returned for {}", symbol);
                    InstrumentHistory::empty(symbol)
                }
            }
        })
        .collect()
}

fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|value| {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    })
}

fn deserialize_f64_opt<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    struct F64OptVisitor;

    impl<'de> Visitor<'de> for F64OptVisitor {
        type Value = Option<f64>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a price as number or string")
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value as f64))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value as f64))
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value.trim().parse::<f64>().ok())
        }
    }

    deserializer.deserialize_any(F64OptVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_string_prices_and_reverses_to_most_recent_first() {
        let body = r#"{
            "results": [
                {
                    "symbol": "GPRO",
                    "historicals": [
                        {"begins_at": "2018-01-02T00:00:00Z", "open_price": "7.5600", "close_price": "7.9100"},
                        {"begins_at": "2018-01-03T00:00:00Z", "open_price": 7.95, "close_price": null}
                    ]
                },
                null
            ]
        }"#;
        let response: HistoricalsResponse = serde_json::from_str(body).expect("decode");
        let instruments = vec!["TWTR".to_string(), "GPRO".to_string()];
        let histories = histories_in_request_order(&instruments, response);

        assert_eq!(histories.len(), 2);
        assert_eq!(histories[0].symbol, "TWTR");
        assert!(histories[0].quotes.is_empty());

        let gpro = &histories[1].quotes;
        assert_eq!(gpro.len(), 2);
        assert_eq!(gpro[0].open_price, Some(7.95));
        assert_eq!(gpro[0].close_price, None);
        assert!(gpro[0].price_point().is_none());
        assert_eq!(gpro[1].open_price, Some(7.56));
        assert_eq!(gpro[1].close_price, Some(7.91));
        assert!(gpro[1].begins_at.is_some());
    }

    #[test]
    fn symbol_limit_is_capped() {
        let client = RobinhoodQuoteClient::new("http://localhost")
            .expect("client")
            .with_max_symbols(500);
        assert_eq!(client.max_instruments_per_request(), 75);
    }
}
