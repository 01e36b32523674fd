//! # lib_marketdata
//!
//! A typed client for a CoinGecko-style market data provider. Each folder is a
//! module gated behind a cargo feature of the same name:
//!
//! - **`retrieve`**: the generic HTTP layer (`ApiClient`) with timeouts and an
//!   optional retry budget.
//! - **`markets`**: `MarketDataClient`, the asset listing and price history
//!   queries, and their response models.
//! - **`configs`**: layered JSON + environment loading of `MarketDataConfig`.
//! - **`loggers`**: `tracing` subscriber setup for binaries.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Classified failures shared by the HTTP layer and the provider client.
#[cfg(feature = "retrieve")]
pub mod error;

/// Generic HTTP client with timeout and retry middleware.
#[cfg(feature = "retrieve")]
pub mod retrieve;

/// Market data provider clients and models.
#[cfg(feature = "markets")]
pub mod markets;

/// Configuration loading for the market data client.
#[cfg(feature = "configs")]
pub mod configs;

/// Logging setup for binaries built on this crate.
#[cfg(feature = "loggers")]
pub mod loggers;

#[cfg(feature = "retrieve")]
pub use error::{MarketDataError, Result};
#[cfg(feature = "markets")]
pub use markets::coingecko::{
    AssetHistory, AssetListing, HistoryWindow, MarketDataClient, MarketDataConfig, PricePoint,
};
