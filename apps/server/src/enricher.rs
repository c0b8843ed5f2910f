//! Best-effort price and balance lookups for detected transfers.

use tracing::{info, warn};
use transfer_watch_core::amount::scale;
use transfer_watch_core::{Address, Lookup, Snapshot, TokenMetadata};
use transfer_watch_feeds::{PriceSource, TokenReader};

/// Read token `decimals()` and `symbol()`, falling back per field.
pub async fn load_metadata(token: Option<&dyn TokenReader>, fallback_symbol: &str) -> Lookup<TokenMetadata> {
    let token = match token {
        Some(token) => token,
        None => {
            return Lookup::defaulted(
                TokenMetadata::fallback(fallback_symbol),
                "token contract unavailable",
            )
        }
    };

    let mut metadata = TokenMetadata::fallback(fallback_symbol);
    let mut problems = Vec::new();

    match token.decimals().await {
        Ok(decimals) => metadata.decimals = decimals,
        Err(e) => problems.push(format!("decimals(): {}", e)),
    }
    match token.symbol().await {
        Ok(symbol) if !symbol.trim().is_empty() => metadata.symbol = symbol.trim().into(),
        Ok(_) => problems.push("symbol(): empty".to_string()),
        Err(e) => problems.push(format!("symbol(): {}", e)),
    }

    if problems.is_empty() {
        Lookup::Fetched(metadata)
    } else {
        Lookup::defaulted(metadata, problems.join("; "))
    }
}

/// Attaches price and wallet balance to a detected transfer.
pub struct Enricher {
    token: Option<Box<dyn TokenReader>>,
    price: Box<dyn PriceSource>,
    wallet: Address,
    metadata: Lookup<TokenMetadata>,
}

impl Enricher {
    /// Fetch token metadata once and build the enricher.
    ///
    /// Pass `token: None` to disable balance lookups.
    pub async fn connect(
        token: Option<Box<dyn TokenReader>>,
        price: Box<dyn PriceSource>,
        wallet: Address,
        fallback_symbol: &str,
    ) -> Self {
        let metadata = load_metadata(token.as_deref(), fallback_symbol).await;
        match &metadata {
            Lookup::Fetched(m) => info!("Token metadata: {} ({} decimals)", m.symbol, m.decimals),
            Lookup::Defaulted { value, reason } => warn!(
                "Using default token metadata {} ({} decimals): {}",
                value.symbol, value.decimals, reason
            ),
        }

        Self {
            token,
            price,
            wallet,
            metadata,
        }
    }

    /// Symbol used in notifications.
    pub fn symbol(&self) -> &str {
        &self.metadata.value().symbol
    }

    pub fn balance_enabled(&self) -> bool {
        self.token.is_some()
    }

    /// Current USD price, or None if the feed is unavailable.
    pub async fn price(&self) -> Option<f64> {
        match self.price.usd_price().await {
            Ok(Some(price)) => Some(price),
            Ok(None) => {
                warn!("Price feed returned no USD quote");
                None
            }
            Err(e) => {
                warn!("Could not fetch token price: {}", e);
                None
            }
        }
    }

    /// Scaled wallet balance, or None if the RPC lookup is unavailable.
    pub async fn balance(&self) -> Option<f64> {
        let token = self.token.as_ref()?;
        match token.balance_of(&self.wallet).await {
            Ok(raw) => Some(scale(raw, self.metadata.value().decimals)),
            Err(e) => {
                warn!("Could not fetch token balance via RPC: {}", e);
                None
            }
        }
    }

    /// Price and balance, looked up one after the other.
    pub async fn snapshot(&self) -> Snapshot {
        let price = self.price().await;
        let balance = self.balance().await;
        Snapshot::new(price, balance)
    }
}
