//! # Financial Market APIs Module
//!
//! This module groups the client implementations for specific market data
//! providers. Each provider module knows its endpoint paths, query parameters
//! and response shapes, and delegates the network work to
//! [`crate::retrieve::ky_http::ApiClient`].
//!
//! ## Contained Modules:
//!
//! - **`coingecko`**: asset listings ranked by market capitalization and
//!   per-asset price / market cap / volume history from a CoinGecko-style API.

/// Client and models for the CoinGecko-style crypto market data API.
pub mod coingecko;
