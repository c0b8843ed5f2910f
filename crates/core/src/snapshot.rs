//! Per-notification price and balance snapshot.

/// Enrichment values fetched for one detected transfer. Never cached.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Snapshot {
    /// USD price of one token, if the price feed answered
    pub price_usd: Option<f64>,
    /// Scaled wallet balance, if the chain read succeeded
    pub balance: Option<f64>,
}

impl Snapshot {
    pub fn new(price_usd: Option<f64>, balance: Option<f64>) -> Self {
        Self { price_usd, balance }
    }

    /// USD value of `amount` tokens.
    pub fn value_of(&self, amount: f64) -> Option<f64> {
        self.price_usd.map(|p| amount * p)
    }

    /// USD value of the whole wallet balance.
    pub fn holdings_value(&self) -> Option<f64> {
        match (self.balance, self.price_usd) {
            (Some(b), Some(p)) => Some(b * p),
            _ => None,
        }
    }
}
