// @file: market_relay/src/core/error.rs
// @description: Error taxonomy surfaced to REST callers plus the internal upstream/socket failures.
// @author: LAS.

use serde_json::Value;
use thiserror::Error;


//
// CALLER-FACING ERRORS
//

#[derive(Debug, Clone, Error, PartialEq)]
pub enum RelayError {
    #[error("{0}")]
    Validation(String),

    #[error("Rate limit exceeded. Please try again later.")]
    RateLimitExceeded,

    #[error("{0}")]
    UpstreamException(String),

    #[error("{0}")]
    Maintenance(String),

    #[error("{0}")]
    NotImplemented(String),
}

impl RelayError {
    /// Stable tag written into the error envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::Validation(_) => "validate",
            RelayError::RateLimitExceeded => "rateLimit",
            RelayError::UpstreamException(_) => "exception",
            RelayError::Maintenance(_) => "maintenance",
            RelayError::NotImplemented(_) => "notImplemented",
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            RelayError::Validation(_) => 400,
            RelayError::RateLimitExceeded => 429,
            RelayError::UpstreamException(_) => 500,
            RelayError::Maintenance(_) => 503,
            RelayError::NotImplemented(_) => 404,
        }
    }
}


//
// UPSTREAM CALL FAILURE
//

/// One failed upstream HTTP call, before RetryPolicy decides what to do with it.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct UpstreamError {
    pub status: Option<u16>,
    pub body: Option<Value>,
    pub message: String,
    pub rate_limited: bool,
}

impl UpstreamError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { status: None, body: None, message: message.into(), rate_limited: false }
    }

    pub fn from_status(status: u16, body: Option<Value>) -> Self {
        Self {
            status: Some(status),
            body,
            message: format!("Request failed with status code {}", status),
            rate_limited: status == 429,
        }
    }

    pub fn rate_limited(mut self) -> Self {
        self.rate_limited = true;
        self
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        let status = err.status().map(|s| s.as_u16());
        Self {
            status,
            body: None,
            message: err.to_string(),
            rate_limited: status == Some(429),
        }
    }
}


//
// SOCKET FAILURE
//

#[derive(Debug, Clone, Error)]
pub enum FeedError {
    #[error("connect failed: {0}")]
    Connect(String),

    #[error("transport error: {0}")]
    Transport(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for FeedError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        FeedError::Transport(err.to_string())
    }
}
