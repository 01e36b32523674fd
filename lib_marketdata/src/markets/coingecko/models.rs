//! # Market Data Models
//!
//! Strongly typed representations of the provider's JSON. Decoding is strict:
//! a required field that is missing, `null` or of the wrong type fails the
//! whole response instead of being replaced by a default.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// # Asset Listing
///
/// One row of the `coins/markets` endpoint.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AssetListing {
    /// Provider-assigned identifier, unique within a snapshot (e.g. "bitcoin").
    pub id: String,
    /// Ticker symbol (e.g. "btc").
    pub symbol: String,
    /// Display name (e.g. "Bitcoin").
    pub name: String,
    /// Price in the requested quote currency.
    pub current_price: f64,
    /// Market capitalization in the requested quote currency.
    pub market_cap: f64,
    /// Rank by market capitalization at fetch time.
    pub market_cap_rank: u32,
    /// Logo URL.
    pub image: Option<String>,
    /// Trading volume over the last 24 hours.
    pub total_volume: Option<f64>,
    /// Highest price over the last 24 hours.
    pub high_24h: Option<f64>,
    /// Lowest price over the last 24 hours.
    pub low_24h: Option<f64>,
    /// Relative price change over the last 24 hours, in percent.
    pub price_change_percentage_24h: Option<f64>,
    /// Units currently in circulation.
    pub circulating_supply: Option<f64>,
    /// When the provider last refreshed this row.
    pub last_updated: Option<DateTime<Utc>>,
}

/// # Price Point
///
/// A `(timestamp, value)` pair. On the wire it is a two element array
/// `[timestampMillis, value]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "(f64, f64)", into = "(i64, f64)")]
pub struct PricePoint {
    /// The UTC instant of the sample.
    pub timestamp: DateTime<Utc>,
    /// The sampled value.
    pub value: f64,
}

impl TryFrom<(f64, f64)> for PricePoint {
    type Error = String;

    /// Providers send integral milliseconds, sometimes encoded as floats.
    fn try_from((ms, value): (f64, f64)) -> Result<Self, Self::Error> {
        if !ms.is_finite() {
            return Err(format!("invalid timestamp: {}", ms));
        }
        let timestamp = Utc
            .timestamp_millis_opt(ms as i64)
            .single()
            .ok_or_else(|| format!("invalid timestamp: {}", ms))?;
        Ok(Self { timestamp, value })
    }
}

impl From<PricePoint> for (i64, f64) {
    fn from(point: PricePoint) -> Self {
        (point.timestamp.timestamp_millis(), point.value)
    }
}

/// # Asset History
///
/// The `coins/{id}/market_chart` response: three parallel, time-ordered series
/// over the requested window.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AssetHistory {
    /// Price samples.
    pub prices: Vec<PricePoint>,
    /// Market capitalization samples.
    pub market_caps: Vec<PricePoint>,
    /// Trading volume samples.
    pub total_volumes: Vec<PricePoint>,
}

impl AssetHistory {
    /// The most recent price sample, if the window holds any.
    pub fn latest_price(&self) -> Option<&PricePoint> {
        self.prices.last()
    }

    /// First and last timestamp of the price series.
    pub fn time_span(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        match (self.prices.first(), self.prices.last()) {
            (Some(first), Some(last)) => Some((first.timestamp, last.timestamp)),
            _ => None,
        }
    }

    /// True when the three series have the same length and the same
    /// timestamps point for point.
    ///
    /// Informational only; fetches do not reject misaligned series.
    pub fn is_aligned(&self) -> bool {
        self.prices.len() == self.market_caps.len()
            && self.prices.len() == self.total_volumes.len()
            && self
                .prices
                .iter()
                .zip(&self.market_caps)
                .zip(&self.total_volumes)
                .all(|((p, m), v)| p.timestamp == m.timestamp && p.timestamp == v.timestamp)
    }
}

/// # History Window
///
/// How far back `market_chart` should reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HistoryWindow {
    /// A fixed number of days ending now. Must be at least 1.
    Days(u32),
    /// Everything the provider retains.
    Max,
}

impl HistoryWindow {
    /// The value sent as the `days` query parameter.
    pub fn as_query_value(&self) -> String {
        self.to_string()
    }
}

impl From<u32> for HistoryWindow {
    fn from(days: u32) -> Self {
        Self::Days(days)
    }
}

impl fmt::Display for HistoryWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Days(days) => write!(f, "{}", days),
            Self::Max => f.write_str("max"),
        }
    }
}

impl FromStr for HistoryWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("max") {
            return Ok(Self::Max);
        }
        match s.parse::<u32>() {
            Ok(0) => Err("days must be at least 1".to_string()),
            Ok(days) => Ok(Self::Days(days)),
            Err(_) => Err(format!("expected a positive number of days or `max`, got `{}`", s)),
        }
    }
}
