//! # Configuration Modules
//!
//! Builds a [`crate::MarketDataConfig`] from layered JSON files and
//! `MARKETDATA_*` environment variables.

/// Layered file + environment loading of the market data client settings.
pub mod config_market;

pub use config_market::{load_market_config, MarketConfigError};
