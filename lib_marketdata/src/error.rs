//! Error types for market data retrieval.
//!
//! Every failure a fetch can produce is one of these variants. Nothing is
//! defaulted or swallowed at this level. Unless the HTTP config opts into
//! retries, callers get the classification and pick their own backoff.

/// The error type returned by [`crate::retrieve::ky_http::ApiClient`] and
/// [`crate::markets::coingecko::MarketDataClient`].
#[derive(Debug, thiserror::Error)]
pub enum MarketDataError {
    /// The request could not be sent or no complete response was received
    /// (DNS failure, refused connection, timeout, interrupted body).
    #[error("transport failure for {url}: {source}")]
    Transport {
        /// The request URL.
        url: String,
        /// The underlying client or middleware error.
        #[source]
        source: reqwest_middleware::Error,
    },

    /// The provider answered with a non-2xx status.
    #[error("HTTP status {status} for {url}")]
    HttpStatus {
        /// The request URL.
        url: String,
        /// The numeric HTTP status code.
        status: u16,
        /// The provider's error body, when it could be read.
        body: Option<String>,
    },

    /// A 2xx body did not match the expected JSON shape.
    #[error("unexpected response body from {url}: {source}")]
    Parse {
        /// The request URL.
        url: String,
        /// What the decoder rejected.
        #[source]
        source: serde_json::Error,
    },

    /// Caller input was rejected before any request was sent.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        /// The offending parameter.
        name: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// The client could not be built from its configuration.
    #[error("invalid client configuration: {0}")]
    Config(String),
}

/// A specialized Result type for market data operations.
pub type Result<T> = std::result::Result<T, MarketDataError>;

impl MarketDataError {
    /// Creates a new invalid parameter error.
    pub fn invalid_parameter<S: Into<String>>(name: &'static str, reason: S) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    /// Creates a new configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a parse error for a body that decoded but broke the response contract.
    pub fn contract_violation<S: std::fmt::Display>(url: impl Into<String>, msg: S) -> Self {
        Self::Parse {
            url: url.into(),
            source: <serde_json::Error as serde::de::Error>::custom(msg),
        }
    }

    /// The HTTP status code, if the provider answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the provider reported the requested resource as missing.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// True when the provider is throttling this caller.
    pub fn is_rate_limited(&self) -> bool {
        self.status() == Some(429)
    }

    /// True for failures a caller may reasonably retry with backoff.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::HttpStatus { status, .. } => {
                matches!(*status, 408 | 429) || (500..600).contains(status)
            }
            _ => false,
        }
    }

    /// A short stable name for the error class, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "transport",
            Self::HttpStatus { .. } => "http_status",
            Self::Parse { .. } => "parse",
            Self::InvalidParameter { .. } => "invalid_parameter",
            Self::Config(_) => "config",
        }
    }
}
