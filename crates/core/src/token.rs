//! Token metadata and best-effort lookup results.

use crate::amount::DEFAULT_DECIMALS;
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Symbol and precision of the watched token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub symbol: CompactString,
    pub decimals: u8,
}

impl TokenMetadata {
    pub fn new(symbol: &str, decimals: u8) -> Self {
        Self {
            symbol: CompactString::new(symbol),
            decimals,
        }
    }

    /// Metadata used when the contract cannot be queried.
    pub fn fallback(symbol: &str) -> Self {
        Self::new(symbol, DEFAULT_DECIMALS)
    }
}

/// Outcome of a lookup that falls back to a default instead of failing.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    /// Value came from the remote source.
    Fetched(T),
    /// Remote source was unavailable; `value` is the default.
    Defaulted { value: T, reason: String },
}

impl<T> Lookup<T> {
    pub fn defaulted(value: T, reason: impl Into<String>) -> Self {
        Lookup::Defaulted {
            value,
            reason: reason.into(),
        }
    }

    /// The fetched value or the default.
    pub fn value(&self) -> &T {
        match self {
            Lookup::Fetched(v) => v,
            Lookup::Defaulted { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Lookup::Fetched(v) => v,
            Lookup::Defaulted { value, .. } => value,
        }
    }

    #[inline]
    pub fn is_fetched(&self) -> bool {
        matches!(self, Lookup::Fetched(_))
    }

    /// Why the default was used, if it was.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Lookup::Fetched(_) => None,
            Lookup::Defaulted { reason, .. } => Some(reason),
        }
    }
}

impl<T, E: std::fmt::Display> From<(Result<T, E>, T)> for Lookup<T> {
    /// Build from a fallible fetch and the default to use on error.
    fn from((result, default): (Result<T, E>, T)) -> Self {
        match result {
            Ok(v) => Lookup::Fetched(v),
            Err(e) => Lookup::defaulted(default, e.to_string()),
        }
    }
}
