//! Error types for explorer, price and chain reads.

use alloy::transports::{RpcError, TransportError};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while talking to remote data sources.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("HTTP status {0}")]
    HttpStatus(u16),

    /// API-level error such as "Max rate limit reached".
    #[error("API error: {0}")]
    Api(String),

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("JSON-RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("ABI decode failed: {0}")]
    AbiDecode(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FeedError::Timeout(err.to_string())
        } else if err.is_builder() {
            FeedError::InvalidRequest(err.to_string())
        } else if err.is_decode() {
            FeedError::ParseError(err.to_string())
        } else if let Some(status) = err.status() {
            FeedError::HttpStatus(status.as_u16())
        } else {
            FeedError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FeedError {
    fn from(err: serde_json::Error) -> Self {
        FeedError::ParseError(err.to_string())
    }
}

impl From<TransportError> for FeedError {
    fn from(err: TransportError) -> Self {
        match &err {
            RpcError::ErrorResp(payload) => FeedError::Rpc {
                code: payload.code,
                message: payload.message.to_string(),
            },
            RpcError::NullResp | RpcError::DeserError { .. } => FeedError::ParseError(err.to_string()),
            _ => FeedError::Network(err.to_string()),
        }
    }
}

impl From<alloy::contract::Error> for FeedError {
    fn from(err: alloy::contract::Error) -> Self {
        match err {
            alloy::contract::Error::TransportError(e) => e.into(),
            other => FeedError::AbiDecode(other.to_string()),
        }
    }
}

impl FeedError {
    /// Returns true if this error is transient and likely to succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FeedError::Network(_)
                | FeedError::Timeout(_)
                | FeedError::HttpStatus(_)
                | FeedError::Api(_)
                | FeedError::ParseError(_)
        )
    }

    /// Delay before retrying, given the configured fixed backoff.
    /// Returns None for errors that should not be retried.
    pub fn retry_delay(&self, backoff: Duration) -> Option<Duration> {
        if self.is_transient() {
            Some(backoff)
        } else {
            None
        }
    }
}

/// Result type for feed operations.
pub type FeedResult<T> = Result<T, FeedError>;
