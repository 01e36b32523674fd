//! # CoinGecko Market Data Module
//!
//! Typed access to the two read-only queries of a CoinGecko-compatible
//! provider:
//!
//! - `GET {base}/coins/markets`: a page of assets ordered by market cap.
//! - `GET {base}/coins/{id}/market_chart`: price, market cap and volume series
//!   for one asset over a window of days.
//!
//! ## Contained Modules:
//!
//! - **`models`**: `AssetListing`, `PricePoint`, `AssetHistory` and
//!   `HistoryWindow`, decoded strictly from the provider JSON.
//! - **`marketdata`**: `MarketDataClient` and its `MarketDataConfig`.

/// Client for the listing and history endpoints.
pub mod marketdata;
/// Response models for the listing and history endpoints.
pub mod models;

pub use marketdata::{MarketDataClient, MarketDataConfig, DEFAULT_BASE_URL, DEFAULT_QUOTE_CURRENCY, MAX_PAGE_SIZE};
pub use models::{AssetHistory, AssetListing, HistoryWindow, PricePoint};
