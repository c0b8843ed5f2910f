//! Application configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use transfer_watch_core::{parse_address, Address, Chain, CoreError, DetectMode};
use transfer_watch_feeds::{DEFAULT_API_BASE, DEFAULT_PRICE_API_BASE};

/// Explorer and price requests.
pub const EXPLORER_TIMEOUT: Duration = Duration::from_secs(20);
/// RPC, price and posting requests.
pub const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Etherscan rejects pages larger than this.
const MAX_PAGE_SIZE: u32 = 10_000;

/// Configuration errors. These are the only fatal errors at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{field}: {source}")]
    InvalidAddress {
        field: &'static str,
        #[source]
        source: CoreError,
    },

    #[error("{field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Explorer API key.
    #[serde(skip_serializing)]
    pub api_key: String,
    /// Explorer API endpoint.
    pub api_base: String,
    /// EIP-155 chain id passed to the explorer.
    pub chain_id: u64,
    /// Wallet whose incoming transfers are watched.
    pub wallet: String,
    /// Token contract.
    pub contract: String,
    /// JSON-RPC endpoint; chain default when unset.
    pub rpc_url: Option<String>,
    /// Seconds between polls.
    pub poll_interval_secs: u64,
    /// Seconds to wait after a failed request or iteration.
    pub retry_backoff_secs: u64,
    /// Transfers requested per page.
    pub page_size: u32,
    /// CoinGecko coin id.
    pub price_id: String,
    pub price_api_base: String,
    /// Symbol used until (or unless) the contract reports one.
    pub token_symbol: String,
    /// Block explorer front-end; chain default when unset.
    pub explorer_url: Option<String>,
    pub detect_mode: DetectMode,
    /// Status server port.
    pub port: u16,
    pub log_level: String,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            chain_id: Chain::Bsc.id(),
            wallet: String::new(),
            contract: String::new(),
            rpc_url: None,
            poll_interval_secs: 60,
            retry_backoff_secs: 5,
            page_size: 50,
            price_id: String::new(),
            price_api_base: DEFAULT_PRICE_API_BASE.to_string(),
            token_symbol: "TOKEN".to_string(),
            explorer_url: None,
            detect_mode: DetectMode::Newest,
            port: 5000,
            log_level: "info".to_string(),
        }
    }
}

/// Checked, normalized view of [`WatchConfig`].
#[derive(Debug, Clone)]
pub struct Target {
    pub wallet: Address,
    pub contract: Address,
    /// Known chain for `chain_id`, if any.
    pub chain: Option<Chain>,
    pub rpc_url: String,
    pub explorer_url: String,
    pub poll_interval: Duration,
    pub retry_backoff: Duration,
}

fn non_empty(value: &str, name: &'static str) -> ConfigResult<()> {
    if value.trim().is_empty() {
        Err(ConfigError::Missing(name))
    } else {
        Ok(())
    }
}

fn address(value: &str, name: &'static str) -> ConfigResult<Address> {
    non_empty(value, name)?;
    parse_address(value).map_err(|source| ConfigError::InvalidAddress { field: name, source })
}

impl WatchConfig {
    /// Validate the configuration and resolve chain defaults.
    pub fn validate(&self) -> ConfigResult<Target> {
        non_empty(&self.api_key, "ETHERSCAN_API_KEY")?;
        non_empty(&self.api_base, "ETHERSCAN_API_BASE")?;
        non_empty(&self.price_id, "COINGECKO_ID")?;
        non_empty(&self.token_symbol, "TOKEN_SYMBOL")?;

        let wallet = address(&self.wallet, "WATCH_WALLET")?;
        let contract = address(&self.contract, "TOKEN_CONTRACT")?;

        if self.poll_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "POLL_INTERVAL",
                reason: "must be at least 1 second".to_string(),
            });
        }
        if self.retry_backoff_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "RATE_LIMIT_RETRY",
                reason: "must be at least 1 second".to_string(),
            });
        }
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::InvalidValue {
                field: "PAGE_SIZE",
                reason: format!("must be between 1 and {}", MAX_PAGE_SIZE),
            });
        }

        let chain = Chain::from_id(self.chain_id);
        let rpc_url = match (self.rpc_url.as_deref(), chain) {
            (Some(url), _) if !url.trim().is_empty() => url.to_string(),
            (_, Some(chain)) => chain.default_rpc_url().to_string(),
            (_, None) => return Err(ConfigError::Missing("RPC_URL")),
        };
        let explorer_url = match (self.explorer_url.as_deref(), chain) {
            (Some(url), _) if !url.trim().is_empty() => url.trim_end_matches('/').to_string(),
            (_, Some(chain)) => chain.explorer_url().to_string(),
            (_, None) => return Err(ConfigError::Missing("EXPLORER_URL")),
        };

        Ok(Target {
            wallet,
            contract,
            chain,
            rpc_url,
            explorer_url,
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            retry_backoff: Duration::from_secs(self.retry_backoff_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const WALLET: &str = "0xE307F534EEc7256331C347Ad73E7A08446F1d7a7";
    const CONTRACT: &str = "0x000Ae314E2A2172a039B26378814C252734f556A";

    fn valid() -> WatchConfig {
        WatchConfig {
            api_key: "key".to_string(),
            wallet: WALLET.to_string(),
            contract: CONTRACT.to_string(),
            price_id: "aster-2".to_string(),
            token_symbol: "ASTER".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_config_default() {
        let config = WatchConfig::default();
        assert_eq!(config.chain_id, 56);
        assert_eq!(config.poll_interval_secs, 60);
        assert_eq!(config.retry_backoff_secs, 5);
        assert_eq!(config.page_size, 50);
        assert_eq!(config.port, 5000);
        assert_eq!(config.detect_mode, DetectMode::Newest);
    }

    #[test]
    fn test_validate_resolves_chain_defaults() {
        let target = valid().validate().unwrap();
        assert_eq!(target.wallet, parse_address(WALLET).unwrap());
        assert_eq!(target.chain, Some(Chain::Bsc));
        assert_eq!(target.rpc_url, Chain::Bsc.default_rpc_url());
        assert_eq!(target.explorer_url, "https://bscscan.com");
        assert_eq!(target.poll_interval, Duration::from_secs(60));
    }

    #[test]
    fn test_validate_explicit_urls() {
        let config = WatchConfig {
            chain_id: 999_999,
            rpc_url: Some("http://localhost:8545".to_string()),
            explorer_url: Some("https://scan.example/".to_string()),
            ..valid()
        };
        let target = config.validate().unwrap();
        assert_eq!(target.chain, None);
        assert_eq!(target.rpc_url, "http://localhost:8545");
        assert_eq!(target.explorer_url, "https://scan.example");
    }

    #[test]
    fn test_unknown_chain_requires_rpc_url() {
        let config = WatchConfig {
            chain_id: 999_999,
            ..valid()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Missing("RPC_URL"))));
    }

    #[test]
    fn test_missing_api_key() {
        let config = WatchConfig {
            api_key: " ".to_string(),
            ..valid()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing("ETHERSCAN_API_KEY"))
        ));
    }

    #[test]
    fn test_invalid_wallet() {
        let config = WatchConfig {
            wallet: "0x1234".to_string(),
            ..valid()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidAddress { field: "WATCH_WALLET", .. }));
        assert!(err.to_string().starts_with("WATCH_WALLET"));
    }

    #[test]
    fn test_invalid_numbers() {
        let zero_interval = WatchConfig {
            poll_interval_secs: 0,
            ..valid()
        };
        assert!(zero_interval.validate().is_err());

        let huge_page = WatchConfig {
            page_size: 20_000,
            ..valid()
        };
        assert!(matches!(
            huge_page.validate(),
            Err(ConfigError::InvalidValue { field: "PAGE_SIZE", .. })
        ));
    }

    #[test]
    fn test_config_serialization_hides_api_key() {
        let config = valid();
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("\"api_key\""));

        let parsed: WatchConfig = serde_json::from_str(&json.replace('{', "{\"api_key\":\"k\",")).unwrap();
        assert_eq!(parsed.page_size, config.page_size);
        assert_eq!(parsed.wallet, config.wallet);
    }
}
