//! Remote data sources for the transfer watcher.
//!
//! This crate provides HTTP clients for:
//! - `explorer` - Etherscan-compatible transfer history, retried on transient errors
//! - `rpc` - ERC-20 `decimals`, `symbol` and `balanceOf` reads through an alloy provider
//! - `price` - CoinGecko spot price
//!
//! The `source` traits are what the poll loop depends on.

pub mod error;
pub mod explorer;
pub mod price;
pub mod rpc;
pub mod source;

pub use error::*;
pub use explorer::{EtherscanClient, ExplorerConfig, DEFAULT_API_BASE};
pub use price::{CoinGeckoClient, DEFAULT_PRICE_API_BASE};
pub use rpc::Erc20Token;
pub use source::*;
