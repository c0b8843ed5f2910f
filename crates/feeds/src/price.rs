//! CoinGecko spot price lookup.

use crate::error::FeedResult;
use crate::source::PriceSource;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Default CoinGecko public API base.
pub const DEFAULT_PRICE_API_BASE: &str = "https://api.coingecko.com/api/v3";

/// USD price client for a single CoinGecko coin id.
pub struct CoinGeckoClient {
    api_base: String,
    coin_id: String,
    http: Client,
}

impl CoinGeckoClient {
    pub fn new(
        api_base: impl Into<String>,
        coin_id: impl Into<String>,
        timeout: Duration,
    ) -> FeedResult<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_base: api_base.into(),
            coin_id: coin_id.into(),
            http,
        })
    }

    pub fn coin_id(&self) -> &str {
        &self.coin_id
    }

    /// Fetch the current USD price.
    pub async fn fetch_price(&self) -> FeedResult<Option<f64>> {
        let url = format!("{}/simple/price", self.api_base.trim_end_matches('/'));

        let response: serde_json::Value = self
            .http
            .get(&url)
            .query(&[("ids", self.coin_id.as_str()), ("vs_currencies", "usd")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let price = extract_usd_price(&response, &self.coin_id);
        if price.is_none() {
            debug!(coin_id = %self.coin_id, "No USD quote in response: {}", response);
        }
        Ok(price)
    }
}

/// Pull `response[coin_id]["usd"]` out of a simple-price response.
/// The quote may be a JSON number or a numeric string.
pub fn extract_usd_price(response: &serde_json::Value, coin_id: &str) -> Option<f64> {
    let usd = response.get(coin_id)?.get("usd")?;
    usd.as_f64()
        .or_else(|| usd.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
        .filter(|p| p.is_finite())
}

#[async_trait]
impl PriceSource for CoinGeckoClient {
    async fn usd_price(&self) -> FeedResult<Option<f64>> {
        self.fetch_price().await
    }
}
