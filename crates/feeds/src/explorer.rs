//! Etherscan-compatible transfer history fetcher.
//!
//! Queries the `account/tokentx` endpoint (Etherscan v2 multichain API) for
//! the latest page of token transfers touching the watched wallet. Transient
//! failures, including API-level rate-limit responses, are retried forever
//! with a fixed backoff.

use crate::error::{FeedError, FeedResult};
use crate::source::TransferSource;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};
use transfer_watch_core::{amount, Address, TransferRecord};

/// Default Etherscan v2 endpoint.
pub const DEFAULT_API_BASE: &str = "https://api.etherscan.io/v2/api";

/// Explorer query settings.
#[derive(Clone)]
pub struct ExplorerConfig {
    pub api_base: String,
    pub api_key: String,
    pub chain_id: u64,
    pub contract: Address,
    pub wallet: Address,
    pub page_size: u32,
    pub retry_backoff: Duration,
    pub request_timeout: Duration,
    /// Symbol used when a transfer entry has no `tokenSymbol`
    pub fallback_symbol: String,
}

impl std::fmt::Debug for ExplorerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExplorerConfig")
            .field("api_base", &self.api_base)
            .field("api_key", &"<redacted>")
            .field("chain_id", &self.chain_id)
            .field("contract", &self.contract)
            .field("wallet", &self.wallet)
            .field("page_size", &self.page_size)
            .field("retry_backoff", &self.retry_backoff)
            .finish()
    }
}

/// Top-level explorer response envelope.
#[derive(Debug, Deserialize)]
pub struct ExplorerResponse {
    /// "1" on success, "0" on error or empty result. Some deployments send a number.
    #[serde(default)]
    pub status: serde_json::Value,
    #[serde(default)]
    pub message: String,
    /// Transfer list, or an error string when `status` is "0"
    #[serde(default)]
    pub result: serde_json::Value,
}

impl ExplorerResponse {
    fn status_str(&self) -> String {
        match &self.status {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Number(n) => n.to_string(),
            _ => String::new(),
        }
    }
}

/// One entry of the `tokentx` result list.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerTransfer {
    #[serde(default)]
    pub block_number: String,
    #[serde(default)]
    pub time_stamp: String,
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub token_symbol: String,
    #[serde(default)]
    pub token_decimal: String,
}

impl ExplorerTransfer {
    /// Convert into a domain record, filling gaps with defaults.
    pub fn into_record(self, fallback_symbol: &str) -> TransferRecord {
        let symbol = if self.token_symbol.trim().is_empty() {
            fallback_symbol
        } else {
            self.token_symbol.trim()
        };

        TransferRecord {
            decimals: amount::parse_decimals(&self.token_decimal),
            symbol: symbol.into(),
            block_number: self.block_number.trim().parse().unwrap_or(0),
            timestamp: self.time_stamp.trim().parse().ok(),
            hash: self.hash,
            from: self.from,
            to: self.to,
            value: self.value,
        }
    }
}

/// Interpret a response envelope.
///
/// A list result is returned as-is (entries that fail to decode are skipped).
/// `status == "0"` with a string result is an API error such as a rate limit.
/// Anything else is treated as an empty page.
pub fn parse_response(
    response: ExplorerResponse,
    fallback_symbol: &str,
) -> FeedResult<Vec<TransferRecord>> {
    let status = response.status_str();

    match response.result {
        serde_json::Value::Array(entries) => {
            let mut records = Vec::with_capacity(entries.len());
            for entry in entries {
                match serde_json::from_value::<ExplorerTransfer>(entry) {
                    Ok(tx) => records.push(tx.into_record(fallback_symbol)),
                    Err(e) => warn!("Skipping malformed transfer entry: {}", e),
                }
            }
            Ok(records)
        }
        serde_json::Value::String(msg) if status == "0" => Err(FeedError::Api(msg)),
        other => {
            debug!(
                status = %status,
                message = %response.message,
                "Explorer returned no transfer list: {}",
                other
            );
            Ok(Vec::new())
        }
    }
}

/// Client for the explorer `tokentx` endpoint.
pub struct EtherscanClient {
    config: ExplorerConfig,
    http: Client,
}

impl EtherscanClient {
    /// Create a client with the configured request timeout.
    pub fn new(config: ExplorerConfig) -> FeedResult<Self> {
        let http = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    fn query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("apikey", self.config.api_key.clone()),
            ("chainid", self.config.chain_id.to_string()),
            ("module", "account".to_string()),
            ("action", "tokentx".to_string()),
            ("contractaddress", format!("{:#x}", self.config.contract)),
            ("address", format!("{:#x}", self.config.wallet)),
            ("page", "1".to_string()),
            ("offset", self.config.page_size.to_string()),
            ("sort", "desc".to_string()),
        ]
    }

    /// Single attempt at fetching the latest page.
    pub async fn fetch_page(&self) -> FeedResult<Vec<TransferRecord>> {
        let response = self
            .http
            .get(&self.config.api_base)
            .query(&self.query())
            .send()
            .await?
            .error_for_status()?;

        let body: ExplorerResponse = response.json().await?;
        parse_response(body, &self.config.fallback_symbol)
    }

    /// Fetch the latest page, retrying transient failures indefinitely.
    ///
    /// Only non-transient errors (e.g. a malformed request) are returned.
    pub async fn fetch_with_retry(&self) -> FeedResult<Vec<TransferRecord>> {
        loop {
            match self.fetch_page().await {
                Ok(records) => return Ok(records),
                Err(e) => match e.retry_delay(self.config.retry_backoff) {
                    Some(delay) => {
                        warn!("Explorer fetch failed: {}. Retrying in {:?}...", e, delay);
                        tokio::time::sleep(delay).await;
                    }
                    None => return Err(e),
                },
            }
        }
    }
}

#[async_trait]
impl TransferSource for EtherscanClient {
    async fn latest_transfers(&self) -> FeedResult<Vec<TransferRecord>> {
        self.fetch_with_retry().await
    }
}
