//! # Market Data Client
//!
//! Translates the two logical queries of the provider into HTTP requests and
//! returns typed results:
//!
//! - **Listings**: one page of assets ordered by descending market cap. The
//!   provider's order and ranks are kept as received.
//! - **History**: price, market cap and volume series for one asset.
//!
//! Inputs are validated before anything goes on the wire. Every failure comes
//! back as a classified [`MarketDataError`]; nothing is cached between calls.

use tracing::{debug, error};

use super::models::{AssetHistory, AssetListing, HistoryWindow};
use crate::error::{MarketDataError, Result};
use crate::retrieve::ky_http::{ApiClient, HttpClientConfig};

/// Public CoinGecko v3 endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// Quote currency used when the caller does not name one.
pub const DEFAULT_QUOTE_CURRENCY: &str = "usd";

/// Largest page the provider serves.
pub const MAX_PAGE_SIZE: u32 = 250;

/// Ordering directive sent with every listing request.
const ORDER_MARKET_CAP_DESC: &str = "market_cap_desc";

/// Settings for a [`MarketDataClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketDataConfig {
    /// Provider root, e.g. `https://api.coingecko.com/api/v3`.
    pub base_url: String,
    /// Currency used by the `fetch_default_*` helpers.
    pub quote_currency: String,
    /// Timeout, retry and header settings for the HTTP layer.
    pub http: HttpClientConfig,
}

impl Default for MarketDataConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            quote_currency: DEFAULT_QUOTE_CURRENCY.to_string(),
            http: HttpClientConfig::default(),
        }
    }
}

impl MarketDataConfig {
    /// Default settings pointed at another provider root (a mirror or a test server).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

/// # Market Data Client
///
/// Stateless and cheap to clone. Concurrent calls share nothing but the
/// underlying HTTP client.
#[derive(Debug, Clone)]
pub struct MarketDataClient {
    /// The HTTP layer, bound to the provider root.
    client: ApiClient,
    /// Currency for the `fetch_default_*` helpers, already normalized.
    quote_currency: String,
}

impl MarketDataClient {
    /// Builds a client from `config`.
    ///
    /// # Errors
    /// [`MarketDataError::Config`] for a malformed base URL or a blank default currency.
    pub fn new(config: MarketDataConfig) -> Result<Self> {
        let quote_currency = normalize_currency(&config.quote_currency).map_err(|e| match e {
            MarketDataError::InvalidParameter { reason, .. } => {
                MarketDataError::config(format!("default quote currency: {}", reason))
            }
            other => other,
        })?;
        let client = ApiClient::new(&config.base_url, &config.http)?;
        Ok(Self {
            client,
            quote_currency,
        })
    }

    /// The configured default quote currency.
    pub fn quote_currency(&self) -> &str {
        &self.quote_currency
    }

    /// # Fetch Asset Listings
    ///
    /// Fetches page `page` (1-based) of up to `page_size` assets ranked by
    /// market capitalization, priced in `quote_currency`.
    ///
    /// A short page means the end of the set. A page longer than `page_size`
    /// breaks the provider contract and is reported as a parse error.
    ///
    /// # Errors
    /// - `InvalidParameter` if `page` is 0, `page_size` is outside 1..=250 or
    ///   the currency is blank. No request is sent.
    /// - `Transport`, `HttpStatus` or `Parse` as classified by the HTTP layer.
    pub async fn fetch_asset_listings(
        &self,
        page: u32,
        page_size: u32,
        quote_currency: &str,
    ) -> Result<Vec<AssetListing>> {
        if page < 1 {
            return Err(MarketDataError::invalid_parameter("page", "must be at least 1"));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(MarketDataError::invalid_parameter(
                "page_size",
                format!("must be between 1 and {}, got {}", MAX_PAGE_SIZE, page_size),
            ));
        }
        let currency = normalize_currency(quote_currency)?;

        let query = [
            ("vs_currency", currency),
            ("order", ORDER_MARKET_CAP_DESC.to_string()),
            ("per_page", page_size.to_string()),
            ("page", page.to_string()),
        ];
        let url = self.client.endpoint(&["coins", "markets"], &query)?;

        let listings = self
            .client
            .request(reqwest::Method::GET, url.clone())
            .await?
            .into_json::<Vec<AssetListing>>()
            .map_err(log_parse_failure)?;

        if listings.len() > page_size as usize {
            error!(%url, received = listings.len(), page_size, "provider returned an oversized page");
            return Err(MarketDataError::contract_violation(
                url.as_str(),
                format!("expected at most {} listings, received {}", page_size, listings.len()),
            ));
        }

        debug!(page, page_size, received = listings.len(), "asset listings fetched");
        Ok(listings)
    }

    /// # Fetch Asset History
    ///
    /// Fetches the price, market cap and volume series of `asset_id` over
    /// `days`, priced in `quote_currency`.
    ///
    /// Only the presence and shape of the three series are checked. Their
    /// lengths are whatever the provider sent; see [`AssetHistory::is_aligned`].
    /// Windows longer than the provider retains are passed through unchanged.
    ///
    /// # Errors
    /// - `InvalidParameter` for a blank asset id or currency, or `Days(0)`.
    /// - `HttpStatus` with status 404 for an unknown asset
    ///   ([`MarketDataError::is_not_found`]).
    /// - `Transport` or `Parse` as classified by the HTTP layer.
    pub async fn fetch_asset_history(
        &self,
        asset_id: &str,
        quote_currency: &str,
        days: HistoryWindow,
    ) -> Result<AssetHistory> {
        let asset_id = asset_id.trim();
        if asset_id.is_empty() {
            return Err(MarketDataError::invalid_parameter("asset_id", "must not be empty"));
        }
        if days == HistoryWindow::Days(0) {
            return Err(MarketDataError::invalid_parameter("days", "must be at least 1"));
        }
        let currency = normalize_currency(quote_currency)?;

        let query = [("vs_currency", currency), ("days", days.as_query_value())];
        let history = self
            .client
            .get_json::<AssetHistory>(&["coins", asset_id, "market_chart"], &query)
            .await
            .map_err(log_parse_failure)?;

        debug!(
            asset_id,
            %days,
            prices = history.prices.len(),
            market_caps = history.market_caps.len(),
            total_volumes = history.total_volumes.len(),
            "asset history fetched"
        );
        Ok(history)
    }

    /// [`Self::fetch_asset_listings`] in the configured quote currency.
    pub async fn fetch_default_listings(&self, page: u32, page_size: u32) -> Result<Vec<AssetListing>> {
        self.fetch_asset_listings(page, page_size, &self.quote_currency).await
    }

    /// [`Self::fetch_asset_history`] in the configured quote currency.
    pub async fn fetch_default_history(
        &self,
        asset_id: &str,
        days: HistoryWindow,
    ) -> Result<AssetHistory> {
        self.fetch_asset_history(asset_id, &self.quote_currency, days).await
    }
}

/// Trims and lowercases a currency code; blank or whitespace-bearing codes are rejected.
fn normalize_currency(code: &str) -> Result<String> {
    let code = code.trim();
    if code.is_empty() {
        return Err(MarketDataError::invalid_parameter("quote_currency", "must not be empty"));
    }
    if code.chars().any(char::is_whitespace) {
        return Err(MarketDataError::invalid_parameter(
            "quote_currency",
            format!("`{}` is not a currency code", code),
        ));
    }
    Ok(code.to_ascii_lowercase())
}

/// A schema mismatch usually means the provider changed its payload.
fn log_parse_failure(err: MarketDataError) -> MarketDataError {
    if let MarketDataError::Parse { url, source } = &err {
        error!(%url, %source, "response did not match the expected schema");
    }
    err
}
