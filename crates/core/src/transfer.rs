//! Token transfer records.

use crate::address::{address_matches, Address};
use crate::amount;
use chrono::{DateTime, Local, TimeZone};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Display format for transfer timestamps.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One token-movement event reported by the explorer.
/// Identity is the transaction hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    /// Transaction hash
    pub hash: String,
    /// Sender address as reported by the explorer
    pub from: String,
    /// Recipient address as reported by the explorer
    pub to: String,
    /// Raw integer amount (decimal string, unscaled)
    pub value: String,
    /// Token decimal precision
    pub decimals: u8,
    /// Token symbol
    pub symbol: CompactString,
    /// Block the transfer was included in
    pub block_number: u64,
    /// Unix timestamp in seconds, if the explorer provided one
    pub timestamp: Option<i64>,
}

impl TransferRecord {
    /// Whether this transfer was sent to `watched`.
    #[inline]
    pub fn is_incoming_to(&self, watched: &Address) -> bool {
        address_matches(watched, &self.to)
    }

    /// Transferred amount scaled by the record's decimals.
    pub fn amount(&self) -> f64 {
        amount::human_amount(&self.value, self.decimals)
    }

    /// Timestamp rendered in the local timezone.
    pub fn local_time(&self) -> String {
        self.time_in(&Local)
    }

    /// Timestamp rendered in the given timezone.
    pub fn time_in<Tz: TimeZone>(&self, tz: &Tz) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        match self.timestamp.and_then(|ts| DateTime::from_timestamp(ts, 0)) {
            Some(utc) => utc.with_timezone(tz).format(TIME_FORMAT).to_string(),
            None => match self.timestamp {
                Some(ts) => ts.to_string(),
                None => "unknown".to_string(),
            },
        }
    }

    /// Link to this transaction on a block explorer front-end.
    pub fn explorer_link(&self, explorer_url: &str) -> String {
        format!("{}/tx/{}", explorer_url.trim_end_matches('/'), self.hash)
    }
}
