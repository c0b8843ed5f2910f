//! Change detection over explorer transfer pages.
//!
//! Pages arrive newest-first. The detector picks the newest transfer whose
//! recipient is the watched address and compares its hash against the
//! last one reported.

use crate::address::Address;
use crate::transfer::TransferRecord;
use serde::{Deserialize, Serialize};

/// First record (in page order) whose recipient is `watched`.
pub fn find_newest_incoming<'a>(
    txs: &'a [TransferRecord],
    watched: &Address,
) -> Option<&'a TransferRecord> {
    txs.iter().find(|tx| tx.is_incoming_to(watched))
}

/// Result of comparing the newest hash with the last reported one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detection {
    New,
    Unchanged,
}

/// Compare `newest` against `previous`. No previous hash counts as new.
pub fn classify(newest: &str, previous: Option<&str>) -> Detection {
    match previous {
        Some(prev) if prev == newest => Detection::Unchanged,
        _ => Detection::New,
    }
}

/// How many transfers to report when the newest hash changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectMode {
    /// Report only the newest incoming transfer; intermediate ones are skipped.
    #[default]
    Newest,
    /// Report every incoming transfer newer than the last reported one.
    CatchUp,
}

/// Hash of the last reported transfer. Lives only in process memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchState {
    last_seen: Option<String>,
}

impl WatchState {
    /// Empty state used at process start.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_seen(&self) -> Option<&str> {
        self.last_seen.as_deref()
    }

    #[inline]
    pub fn is_bootstrap(&self) -> bool {
        self.last_seen.is_none()
    }

    /// State after reporting `hash`.
    pub fn record(self, hash: impl Into<String>) -> Self {
        Self {
            last_seen: Some(hash.into()),
        }
    }

    /// Newest incoming transfer if it differs from the last reported one.
    pub fn detect<'a>(
        &self,
        txs: &'a [TransferRecord],
        watched: &Address,
    ) -> Option<&'a TransferRecord> {
        let newest = find_newest_incoming(txs, watched)?;
        match classify(&newest.hash, self.last_seen()) {
            Detection::New => Some(newest),
            Detection::Unchanged => None,
        }
    }

    /// Transfers to report, oldest first.
    ///
    /// In [`DetectMode::CatchUp`] every incoming transfer above the last
    /// reported hash is returned; if that hash is no longer on the page the
    /// whole page's incoming transfers are returned. Before anything has been
    /// reported both modes return only the newest match.
    pub fn pending<'a>(
        &self,
        txs: &'a [TransferRecord],
        watched: &Address,
        mode: DetectMode,
    ) -> Vec<&'a TransferRecord> {
        let newest = match self.detect(txs, watched) {
            Some(tx) => tx,
            None => return Vec::new(),
        };

        let last = match (mode, self.last_seen()) {
            (DetectMode::CatchUp, Some(last)) => last,
            _ => return vec![newest],
        };

        let mut pending: Vec<&TransferRecord> = txs
            .iter()
            .take_while(|tx| tx.hash != last)
            .filter(|tx| tx.is_incoming_to(watched))
            .collect();
        pending.dedup_by(|a, b| a.hash == b.hash);
        pending.reverse();
        pending
    }
}
