//! Error types for core domain values.

use thiserror::Error;

/// Errors raised while constructing domain values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid address {0:?}: expected 0x followed by 40 hex characters")]
    InvalidAddress(String),

    #[error("Invalid raw amount {0:?}")]
    InvalidAmount(String),
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
