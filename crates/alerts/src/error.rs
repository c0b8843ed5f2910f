//! Posting error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PostError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Request signing failed: {0}")]
    Signing(String),
}

/// Result type for posting operations.
pub type PostResult<T> = Result<T, PostError>;
