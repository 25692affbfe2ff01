use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const PRICE_EPSILON: f64 = 1e-6;

/// One day of raw quote data as delivered by a history provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyQuote {
    pub begins_at: Option<DateTime<Utc>>,
    pub open_price: Option<f64>,
    pub close_price: Option<f64>,
}

impl DailyQuote {
    pub fn new(open_price: f64, close_price: f64) -> Self {
        Self {
            begins_at: None,
            open_price: Some(open_price),
            close_price: Some(close_price),
        }
    }

    /// Both prices, if both are present and finite.
    pub fn price_point(&self) -> Option<PricePoint> {
        match (self.open_price, self.close_price) {
            (Some(open), Some(close)) if open.is_finite() && close.is_finite() => {
                Some(PricePoint { open, close })
            }
            _ => None,
        }
    }
}

/// Quote history of one instrument, most recent day first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentHistory {
    pub symbol: String,
    pub quotes: Vec<DailyQuote>,
}

impl InstrumentHistory {
    pub fn empty(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            quotes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub open: f64,
    pub close: f64,
}

/// A same-day open-to-close round trip executed by one strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub day: usize,
    pub instrument: String,
    pub shares: u64,
    pub open: f64,
    pub close: f64,
    pub cash_before: f64,
    pub cash_after: f64,
}

impl TradeRecord {
    pub fn pnl(&self) -> f64 {
        round_cents(self.cash_after - self.cash_before)
    }
}

/// Round a monetary amount to cents, half away from zero.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistorySpan {
    Week,
    Year,
    FiveYear,
}

impl HistorySpan {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistorySpan::Week => "week",
            HistorySpan::Year => "year",
            HistorySpan::FiveYear => "5year",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuoteInterval {
    Day,
    Week,
}

impl QuoteInterval {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteInterval::Day => "day",
            QuoteInterval::Week => "week",
        }
    }
}
