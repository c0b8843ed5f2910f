//! EVM chain identifiers and per-chain defaults.

use serde::{Deserialize, Serialize};

/// EVM network the watched token lives on.
/// Discriminants are the EIP-155 chain ids used by the explorer API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u64)]
pub enum Chain {
    Ethereum = 1,
    Optimism = 10,
    Bsc = 56,
    Polygon = 137,
    Base = 8453,
    Arbitrum = 42161,
    Avalanche = 43114,
}

impl Chain {
    /// Look up a chain by its EIP-155 id.
    pub fn from_id(id: u64) -> Option<Self> {
        match id {
            1 => Some(Chain::Ethereum),
            10 => Some(Chain::Optimism),
            56 => Some(Chain::Bsc),
            137 => Some(Chain::Polygon),
            8453 => Some(Chain::Base),
            42161 => Some(Chain::Arbitrum),
            43114 => Some(Chain::Avalanche),
            _ => None,
        }
    }

    /// EIP-155 chain id.
    #[inline]
    pub fn id(self) -> u64 {
        self as u64
    }

    /// Get string representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Chain::Ethereum => "Ethereum",
            Chain::Optimism => "Optimism",
            Chain::Bsc => "BSC",
            Chain::Polygon => "Polygon",
            Chain::Base => "Base",
            Chain::Arbitrum => "Arbitrum",
            Chain::Avalanche => "Avalanche",
        }
    }

    /// Block explorer front-end used for transaction links.
    pub fn explorer_url(self) -> &'static str {
        match self {
            Chain::Ethereum => "https://etherscan.io",
            Chain::Optimism => "https://optimistic.etherscan.io",
            Chain::Bsc => "https://bscscan.com",
            Chain::Polygon => "https://polygonscan.com",
            Chain::Base => "https://basescan.org",
            Chain::Arbitrum => "https://arbiscan.io",
            Chain::Avalanche => "https://snowtrace.io",
        }
    }

    /// Public JSON-RPC endpoint used when none is configured.
    pub fn default_rpc_url(self) -> &'static str {
        match self {
            Chain::Ethereum => "https://eth.llamarpc.com",
            Chain::Optimism => "https://mainnet.optimism.io",
            Chain::Bsc => "https://bsc-dataseed.binance.org/",
            Chain::Polygon => "https://polygon-rpc.com",
            Chain::Base => "https://mainnet.base.org",
            Chain::Arbitrum => "https://arb1.arbitrum.io/rpc",
            Chain::Avalanche => "https://api.avax.network/ext/bc/C/rpc",
        }
    }
}

impl std::fmt::Display for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
