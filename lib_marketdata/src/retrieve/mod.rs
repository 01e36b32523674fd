//! # Data Retrieval Module
//!
//! This module holds the generic HTTP plumbing that provider clients sit on.
//! It owns request building, timeouts, the optional retry budget and the
//! classification of responses into typed results or [`crate::MarketDataError`].
//!
//! ## Contained Modules:
//!
//! - **`ky_http`**: `ApiClient`, a thin wrapper over `reqwest` and
//!   `reqwest-middleware` with exponential backoff retries, plus the
//!   `HttpClientConfig` used to build it.
//!
//! Provider modules (see `markets`) only describe paths, query parameters and
//! response shapes; everything about the wire lives here.

/// Generic HTTP API client with timeout and retry middleware.
pub mod ky_http;
