//! # HTTP Retrieval Utilities
//!
//! This module provides an asynchronous API client wrapper around `reqwest`.
//! It applies an explicit timeout to every request, optionally retries
//! transient failures with exponential backoff, and turns every response into
//! either a decoded value or a classified [`MarketDataError`].

use std::fmt;
use std::time::{Duration, Instant};

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, RETRY_AFTER};
use reqwest::{Method, StatusCode, Url};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{MarketDataError, Result};

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default connection timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default retry budget. Zero keeps every failure visible to the caller.
pub const DEFAULT_MAX_RETRIES: u32 = 0;

/// Default lower bound for the backoff between retries, in milliseconds.
pub const DEFAULT_RETRY_MIN_BACKOFF_MS: u64 = 500;

/// Default upper bound for the backoff between retries, in milliseconds.
pub const DEFAULT_RETRY_MAX_BACKOFF_MS: u64 = 10_000;

/// Settings used to build the underlying HTTP client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpClientConfig {
    /// Total time allowed for a request, body included.
    pub timeout: Duration,
    /// Time allowed to establish the connection.
    pub connect_timeout: Duration,
    /// Retries for transient failures (transport errors, 408, 429, 5xx).
    pub max_retries: u32,
    /// Shortest wait between two attempts.
    pub retry_min_backoff: Duration,
    /// Longest wait between two attempts.
    pub retry_max_backoff: Duration,
    /// Value of the `User-Agent` header.
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_min_backoff: Duration::from_millis(DEFAULT_RETRY_MIN_BACKOFF_MS),
            retry_max_backoff: Duration::from_millis(DEFAULT_RETRY_MAX_BACKOFF_MS),
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpClientConfig {
    /// Sets the retry budget for transient failures.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the total request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the connection timeout.
    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    /// Sets the bounds of the exponential backoff between retries.
    pub fn with_retry_backoff(mut self, min: Duration, max: Duration) -> Self {
        self.retry_min_backoff = min;
        self.retry_max_backoff = max;
        self
    }

    /// Sets the `User-Agent` header.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Builds a `reqwest` client wrapped in the retry middleware.
    pub fn build(&self) -> std::result::Result<ClientWithMiddleware, reqwest::Error> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .user_agent(self.user_agent.as_str())
            .default_headers(default_headers)
            .build()?;

        // backoff bounds must be ordered or the policy panics
        let max_backoff = self.retry_max_backoff.max(self.retry_min_backoff);
        let retry_policy = ExponentialBackoff::builder()
            .retry_bounds(self.retry_min_backoff, max_backoff)
            .build_with_max_retries(self.max_retries);

        Ok(ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build())
    }
}

/// A raw HTTP response, read to completion.
///
/// The status is kept next to the body so the caller can classify the
/// outcome before anything is decoded.
#[derive(Debug)]
pub struct ApiResponse {
    /// The URL that was requested.
    pub url: Url,
    /// The numeric HTTP status code.
    pub status: u16,
    /// Indicates if the status code was in the 2xx range.
    pub success: bool,
    /// The headers returned by the server.
    pub headers: HeaderMap,
    /// The complete response body.
    pub body: Bytes,
}

impl ApiResponse {
    /// The `Retry-After` delay, when the provider sent it as whole seconds.
    pub fn retry_after(&self) -> Option<Duration> {
        self.headers
            .get(RETRY_AFTER)?
            .to_str()
            .ok()?
            .trim()
            .parse::<u64>()
            .ok()
            .map(Duration::from_secs)
    }

    /// Decodes the body into `T`.
    ///
    /// # Errors
    /// - [`MarketDataError::HttpStatus`] for any non-2xx status, whatever the body holds.
    /// - [`MarketDataError::Parse`] when a 2xx body is not JSON of the expected shape.
    pub fn into_json<T: DeserializeOwned>(self) -> Result<T> {
        if !self.success {
            let body = if self.body.is_empty() {
                None
            } else {
                Some(String::from_utf8_lossy(&self.body).into_owned())
            };
            return Err(MarketDataError::HttpStatus {
                url: self.url.to_string(),
                status: self.status,
                body,
            });
        }

        serde_json::from_slice::<T>(&self.body).map_err(|source| MarketDataError::Parse {
            url: self.url.to_string(),
            source,
        })
    }
}

/// An asynchronous HTTP client bound to one provider base URL.
///
/// Cloning is cheap; clones share the underlying connection handling.
#[derive(Clone)]
pub struct ApiClient {
    /// The underlying middleware-enabled client.
    inner: ClientWithMiddleware,
    /// The base URL that endpoint paths are appended to.
    base_url: Url,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Creates a new `ApiClient` for `base_url`.
    ///
    /// # Errors
    /// Returns [`MarketDataError::Config`] if `base_url` is not an absolute
    /// http(s) URL or the HTTP client cannot be built.
    pub fn new(base_url: &str, config: &HttpClientConfig) -> Result<Self> {
        let url = Url::parse(base_url)
            .map_err(|e| MarketDataError::config(format!("invalid base URL `{}`: {}", base_url, e)))?;

        if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
            return Err(MarketDataError::config(format!(
                "base URL `{}` must be an absolute http(s) URL",
                base_url
            )));
        }

        let inner = config
            .build()
            .map_err(|e| MarketDataError::config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            inner,
            base_url: url,
        })
    }

    /// The base URL all endpoints are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Builds an endpoint URL from path segments and query pairs.
    ///
    /// Segments are appended to the base path and percent-encoded one by one,
    /// so a segment can never introduce extra path components.
    pub fn endpoint(&self, segments: &[&str], query: &[(&str, String)]) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| MarketDataError::config("base URL cannot carry a path"))?;
            path.pop_if_empty();
            path.extend(segments);
        }

        url.set_query(None);
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }

        Ok(url)
    }

    /// Sends a request and reads the whole response.
    ///
    /// Non-2xx statuses are not errors at this level; they come back in
    /// [`ApiResponse::success`].
    ///
    /// # Errors
    /// Returns [`MarketDataError::Transport`] when no complete response arrives.
    pub async fn request(&self, method: Method, url: Url) -> Result<ApiResponse> {
        let started = Instant::now();
        debug!(%method, %url, "sending request");

        let response = self
            .inner
            .request(method, url.clone())
            .send()
            .await
            .map_err(|source| MarketDataError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| MarketDataError::Transport {
                url: url.to_string(),
                source: reqwest_middleware::Error::Reqwest(e),
            })?;

        let response = ApiResponse {
            url,
            status: status.as_u16(),
            success: status.is_success(),
            headers,
            body,
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        let url = &response.url;
        if response.success {
            debug!(%url, status = response.status, bytes = response.body.len(), elapsed_ms, "response received");
        } else if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response.retry_after().map(|d| d.as_secs());
            warn!(%url, status = response.status, ?retry_after_secs, elapsed_ms, "provider rate limit reached");
        } else {
            warn!(%url, status = response.status, elapsed_ms, "provider returned non-success status");
        }

        Ok(response)
    }

    /// Performs a GET on the endpoint and decodes the JSON body into `T`.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = self.endpoint(segments, query)?;
        self.request(Method::GET, url).await?.into_json::<T>()
    }
}
