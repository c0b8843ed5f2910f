//! Notification text for a detected transfer.

use chrono::{Local, TimeZone};
use transfer_watch_core::amount::format_grouped;
use transfer_watch_core::{Snapshot, TransferRecord};

/// Everything needed to describe one incoming transfer.
#[derive(Debug, Clone)]
pub struct TransferAlert<'a> {
    pub transfer: &'a TransferRecord,
    pub snapshot: Snapshot,
    /// Token symbol from contract metadata
    pub symbol: &'a str,
    /// Block explorer front-end, e.g. `https://bscscan.com`
    pub explorer_url: &'a str,
}

impl<'a> TransferAlert<'a> {
    pub fn new(
        transfer: &'a TransferRecord,
        snapshot: Snapshot,
        symbol: &'a str,
        explorer_url: &'a str,
    ) -> Self {
        Self {
            transfer,
            snapshot,
            symbol,
            explorer_url,
        }
    }

    /// Plain-text update for social posting, timestamps in local time.
    pub fn post_text(&self) -> String {
        self.post_text_in(&Local)
    }

    /// Plain-text update with timestamps rendered in `tz`.
    pub fn post_text_in<Tz: TimeZone>(&self, tz: &Tz) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        let amount = self.transfer.amount();
        let symbol = self.symbol;

        let mut lines = Vec::with_capacity(6);
        lines.push(format!("New {} incoming transfer detected", symbol));
        lines.push(format!("Date: {}", self.transfer.time_in(tz)));
        lines.push(format!("Amount: {} {}", format_grouped(amount, 6), symbol));

        match (self.snapshot.value_of(amount), self.snapshot.price_usd) {
            (Some(value), Some(price)) => lines.push(format!(
                "Value: ${} ({} @ ${:.6}/token)",
                format_grouped(value, 2),
                symbol,
                price
            )),
            _ => lines.push("Value: USD price unavailable".to_string()),
        }

        lines.push(match (self.snapshot.balance, self.snapshot.holdings_value()) {
            (Some(bal), Some(usd)) => format!(
                "Wallet holdings: {} {} (~${})",
                format_grouped(bal, 6),
                symbol,
                format_grouped(usd, 2)
            ),
            (Some(bal), None) => format!(
                "Wallet holdings: {} {} (USD price unavailable)",
                format_grouped(bal, 6),
                symbol
            ),
            (None, _) => "Wallet holdings: unavailable".to_string(),
        });

        lines.push(format!("Tx: {}", self.transfer.explorer_link(self.explorer_url)));
        lines.join("\n")
    }

    /// Detailed block written to the console log.
    pub fn console_text(&self) -> String {
        let tx = self.transfer;
        let amount = tx.amount();

        let mut lines = vec![
            format!("--- Latest {} incoming transfer ---", self.symbol),
            format!("[{}] +{:.6} {}", tx.block_number, amount, tx.symbol),
            format!("From: {}", tx.from),
            format!("To:   {}", tx.to),
            format!("Tx:   {}", tx.explorer_link(self.explorer_url)),
        ];
        if tx.timestamp.is_some() {
            lines.push(format!("Time: {}", tx.local_time()));
        }

        lines.push(match (self.snapshot.value_of(amount), self.snapshot.price_usd) {
            (Some(value), Some(price)) => format!(
                "Tx value: ${} ({} @ ${:.6})",
                format_grouped(value, 2),
                self.symbol,
                price
            ),
            _ => "Tx value: (price unavailable)".to_string(),
        });

        lines.push(match (self.snapshot.balance, self.snapshot.holdings_value()) {
            (Some(bal), Some(usd)) => format!(
                "Wallet total: {} {}  (~${})",
                format_grouped(bal, 6),
                self.symbol,
                format_grouped(usd, 2)
            ),
            (Some(bal), None) => format!("Wallet total: {} {}", format_grouped(bal, 6), self.symbol),
            (None, _) => "Wallet total: (unavailable)".to_string(),
        });

        lines.push("-".repeat(38));
        lines.join("\n")
    }
}
