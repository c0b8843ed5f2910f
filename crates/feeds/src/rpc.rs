//! Read-only ERC-20 calls through an alloy HTTP provider.

use crate::error::{FeedError, FeedResult};
use crate::source::TokenReader;
use alloy::primitives::{Address, FixedBytes, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::sol;
use async_trait::async_trait;
use std::future::IntoFuture;
use std::time::Duration;
use tracing::debug;

sol! {
    #[sol(rpc)]
    interface IERC20 {
        function balanceOf(address owner) external view returns (uint256);
        function decimals() external view returns (uint8);
        function symbol() external view returns (string);
    }

    /// Older tokens (MKR, SAI) return `symbol()` as a fixed `bytes32`.
    #[sol(rpc)]
    interface IERC20Bytes32Symbol {
        function symbol() external view returns (bytes32);
    }
}

/// ERC-20 token contract reached through a JSON-RPC node.
pub struct Erc20Token {
    token: IERC20::IERC20Instance<DynProvider>,
    timeout: Duration,
}

impl Erc20Token {
    /// Build a provider for `url`. No request is made until the first call.
    pub fn connect(url: &str, contract: Address, timeout: Duration) -> FeedResult<Self> {
        let endpoint = url
            .parse()
            .map_err(|e| FeedError::InvalidRequest(format!("invalid RPC URL {:?}: {}", url, e)))?;
        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect_http(endpoint)
            .erased();

        Ok(Self {
            token: IERC20::new(contract, provider),
            timeout,
        })
    }

    pub fn contract(&self) -> &Address {
        self.token.address()
    }

    /// Chain id reported by the node. Used as a connectivity check.
    pub async fn chain_id(&self) -> FeedResult<u64> {
        self.timed("eth_chainId", self.token.provider().get_chain_id()).await
    }

    async fn timed<T, E, F>(&self, call: &str, request: F) -> FeedResult<T>
    where
        F: IntoFuture<Output = Result<T, E>>,
        E: Into<FeedError>,
    {
        match tokio::time::timeout(self.timeout, request.into_future()).await {
            Ok(result) => result.map_err(Into::into),
            Err(_) => Err(FeedError::Timeout(format!("{} after {:?}", call, self.timeout))),
        }
    }
}

/// Text of a NUL-padded `bytes32` symbol.
fn bytes32_text(raw: &FixedBytes<32>) -> FeedResult<String> {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    String::from_utf8(raw[..end].to_vec())
        .map_err(|e| FeedError::AbiDecode(format!("bytes32 symbol is not UTF-8: {}", e)))
}

#[async_trait]
impl TokenReader for Erc20Token {
    async fn decimals(&self) -> FeedResult<u8> {
        self.timed("decimals()", self.token.decimals().call()).await
    }

    async fn symbol(&self) -> FeedResult<String> {
        match self.timed("symbol()", self.token.symbol().call()).await {
            Err(FeedError::AbiDecode(reason)) => {
                debug!("symbol() is not an ABI string ({}), reading as bytes32", reason);
                let legacy = IERC20Bytes32Symbol::new(*self.contract(), self.token.provider().clone());
                let raw = self.timed("symbol()", legacy.symbol().call()).await?;
                bytes32_text(&raw)
            }
            other => other,
        }
    }

    async fn balance_of(&self, owner: &Address) -> FeedResult<U256> {
        self.timed("balanceOf()", self.token.balanceOf(*owner).call()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::serve;
    use alloy::hex;
    use axum::{routing::post, Json, Router};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use transfer_watch_core::parse_address;

    const CONTRACT: &str = "0x000Ae314E2A2172a039B26378814C252734f556A";
    const LEGACY_CONTRACT: &str = "0x9f8F72aA9304c8B593d555F12eF6589cC3A579A2";
    const REVERTING_CONTRACT: &str = "0x2222222222222222222222222222222222222222";
    const WALLET: &str = "0xE307F534EEc7256331C347Ad73E7A08446F1d7a7";
    const WHALE: &str = "0x3333333333333333333333333333333333333333";

    fn word(value: U256) -> String {
        hex::encode(value.to_be_bytes::<32>())
    }

    /// 2^200 base units, far above u128.
    fn whale_balance() -> U256 {
        U256::from(1u64) << 200
    }

    fn reply(id: Value, result: Value) -> Json<Value> {
        Json(json!({ "jsonrpc": "2.0", "id": id, "result": result }))
    }

    fn fail(id: Value, code: i64, message: &str) -> Json<Value> {
        Json(json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": { "code": code, "message": message }
        }))
    }

    /// Fake node answering eth_chainId and the ERC-20 views.
    async fn fake_node(Json(req): Json<Value>) -> Json<Value> {
        let id = req["id"].clone();
        match req["method"].as_str() {
            Some("eth_chainId") => reply(id, json!("0x38")),
            Some("eth_call") => {
                let call = &req["params"][0];
                let to = call["to"].as_str().unwrap_or_default().to_lowercase();
                let input = call["input"]
                    .as_str()
                    .or_else(|| call["data"].as_str())
                    .unwrap_or_default()
                    .to_lowercase();

                if to == REVERTING_CONTRACT {
                    return fail(id, 3, "execution reverted");
                }
                let legacy = to == LEGACY_CONTRACT.to_lowercase();

                let result = if input == "0x313ce567" {
                    format!("0x{}", word(U256::from(18u64)))
                } else if input == "0x95d89b41" && legacy {
                    format!("0x{:0<64}", hex::encode("MKR"))
                } else if input == "0x95d89b41" {
                    format!(
                        "0x{}{}{:0<64}",
                        word(U256::from(32u64)),
                        word(U256::from(5u64)),
                        hex::encode("ASTER")
                    )
                } else if input.starts_with("0x70a08231") && input.ends_with(&WHALE[2..]) {
                    format!("0x{}", word(whale_balance()))
                } else if input.starts_with("0x70a08231") {
                    format!("0x{}", word(U256::from(2_500_000_000_000_000_000u128)))
                } else {
                    return fail(id, 3, "execution reverted");
                };
                reply(id, json!(result))
            }
            _ => fail(id, -32601, "method not found"),
        }
    }

    async fn token_at(contract: &str) -> Erc20Token {
        let url = serve(Router::new().route("/", post(fake_node))).await;
        Erc20Token::connect(&url, parse_address(contract).unwrap(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_chain_id() {
        let token = token_at(CONTRACT).await;
        assert_eq!(token.chain_id().await.unwrap(), 56);
    }

    #[tokio::test]
    async fn test_token_views() {
        let token = token_at(CONTRACT).await;
        assert_eq!(token.decimals().await.unwrap(), 18);
        assert_eq!(token.symbol().await.unwrap(), "ASTER");

        let owner = parse_address(WALLET).unwrap();
        assert_eq!(
            token.balance_of(&owner).await.unwrap(),
            U256::from(2_500_000_000_000_000_000u128)
        );
    }

    #[tokio::test]
    async fn test_balance_wider_than_u128() {
        let token = token_at(CONTRACT).await;
        let whale = parse_address(WHALE).unwrap();
        let balance = token.balance_of(&whale).await.unwrap();
        assert_eq!(balance, whale_balance());
        assert!(balance > U256::from(u128::MAX));
    }

    #[tokio::test]
    async fn test_bytes32_symbol() {
        let token = token_at(LEGACY_CONTRACT).await;
        assert_eq!(token.symbol().await.unwrap(), "MKR");
    }

    #[tokio::test]
    async fn test_rpc_error_is_surfaced() {
        let token = token_at(REVERTING_CONTRACT).await;
        match token.decimals().await.unwrap_err() {
            FeedError::Rpc { code, message } => {
                assert_eq!(code, 3);
                assert_eq!(message, "execution reverted");
            }
            other => panic!("expected RPC error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_node_is_transient() {
        let contract = parse_address(CONTRACT).unwrap();
        let token = Erc20Token::connect("http://127.0.0.1:1", contract, Duration::from_millis(500)).unwrap();
        assert!(token.chain_id().await.unwrap_err().is_transient());
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        let contract = parse_address(CONTRACT).unwrap();
        assert!(matches!(
            Erc20Token::connect("not a url", contract, Duration::from_secs(1)),
            Err(FeedError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_bytes32_text_stops_at_padding() {
        let mut raw = [0u8; 32];
        raw[..3].copy_from_slice(b"SAI");
        assert_eq!(bytes32_text(&FixedBytes::from(raw)).unwrap(), "SAI");
    }
}
