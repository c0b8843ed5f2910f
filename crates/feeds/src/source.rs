//! Data source traits used by the poll loop.

use crate::error::FeedResult;
use async_trait::async_trait;
use transfer_watch_core::amount::U256;
use transfer_watch_core::{Address, TransferRecord};

/// Source of recent token transfers, newest first.
#[async_trait]
pub trait TransferSource: Send + Sync {
    /// Most recent page of transfers for the watched wallet and token.
    async fn latest_transfers(&self) -> FeedResult<Vec<TransferRecord>>;
}

/// Spot price feed for the watched token.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// USD price of one token. `Ok(None)` means the feed has no quote.
    async fn usd_price(&self) -> FeedResult<Option<f64>>;
}

/// Read-only view of an ERC-20 token contract.
#[async_trait]
pub trait TokenReader: Send + Sync {
    async fn decimals(&self) -> FeedResult<u8>;

    async fn symbol(&self) -> FeedResult<String>;

    /// Raw (unscaled) balance of `owner`.
    async fn balance_of(&self, owner: &Address) -> FeedResult<U256>;
}
