//! Transfer poll loop.
//!
//! Bootstrap runs one fetch immediately; afterwards the loop sleeps for the
//! poll interval before every fetch. Errors and panics inside an iteration
//! are logged and followed by the retry backoff. The loop never exits.

use crate::enricher::Enricher;
use crate::state::SharedStatus;
use futures_util::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tracing::{debug, error, info};
use transfer_watch_alerts::{Notifier, TransferAlert};
use transfer_watch_core::{Address, DetectMode, TransferRecord, WatchState};
use transfer_watch_feeds::{FeedResult, TransferSource};

/// Loop timing and detection settings.
#[derive(Debug, Clone)]
pub struct PollSettings {
    pub wallet: Address,
    pub poll_interval: Duration,
    pub retry_backoff: Duration,
    pub mode: DetectMode,
    /// Block explorer front-end for transaction links
    pub explorer_url: String,
}

/// Holds the status running flag up for as long as the loop is alive.
/// Dropped on panic or task abort as well as on return.
struct RunningFlag(SharedStatus);

impl RunningFlag {
    fn raise(status: SharedStatus) -> Self {
        status.set_running(true);
        Self(status)
    }
}

impl Drop for RunningFlag {
    fn drop(&mut self) {
        self.0.set_running(false);
    }
}

pub struct Poller {
    source: Box<dyn TransferSource>,
    enricher: Enricher,
    notifier: Notifier,
    settings: PollSettings,
    status: SharedStatus,
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}

impl Poller {
    pub fn new(
        source: Box<dyn TransferSource>,
        enricher: Enricher,
        notifier: Notifier,
        settings: PollSettings,
        status: SharedStatus,
    ) -> Self {
        Self {
            source,
            enricher,
            notifier,
            settings,
            status,
        }
    }

    /// Fetch, detect, then enrich and notify each pending transfer.
    ///
    /// `state` advances after every notification, so a failure partway
    /// through a batch keeps the transfers already reported. Returns the
    /// number of transfers reported.
    pub async fn poll_once(&self, state: &mut WatchState) -> FeedResult<usize> {
        let txs = self.source.latest_transfers().await?;
        debug!("Fetched {} transfers", txs.len());

        let pending: Vec<TransferRecord> = state
            .pending(&txs, &self.settings.wallet, self.settings.mode)
            .into_iter()
            .cloned()
            .collect();

        for tx in &pending {
            let snapshot = self.enricher.snapshot().await;
            let alert = TransferAlert::new(
                tx,
                snapshot,
                self.enricher.symbol(),
                &self.settings.explorer_url,
            );
            self.notifier.notify(&alert).await;
            self.status.record_notification();
            *state = std::mem::take(state).record(tx.hash.as_str());
        }

        self.status.record_poll();
        Ok(pending.len())
    }

    /// One iteration with errors and panics contained.
    ///
    /// Returns None after logging the failure and sleeping the backoff.
    async fn guarded_poll(&self, state: &mut WatchState) -> Option<usize> {
        let result = AssertUnwindSafe(self.poll_once(state)).catch_unwind().await;

        match result {
            Ok(Ok(notified)) => return Some(notified),
            Ok(Err(e)) => error!("Unexpected error: {}", e),
            Err(payload) => error!("Poll iteration panicked: {}", panic_message(payload.as_ref())),
        }

        self.status.record_failure();
        tokio::time::sleep(self.settings.retry_backoff).await;
        None
    }

    /// Run forever.
    pub async fn run(self) {
        let _running = RunningFlag::raise(self.status.clone());

        let secs = self.settings.poll_interval.as_secs();
        info!(
            "Watching latest {} incoming to {}",
            self.enricher.symbol(),
            self.settings.wallet
        );
        info!("Polling every {} seconds", secs);
        if self.settings.mode == DetectMode::CatchUp {
            info!("Catch-up mode: every new incoming transfer is reported");
        }

        let mut state = WatchState::new();
        if self.guarded_poll(&mut state).await == Some(0) {
            info!("No incoming transfer found yet");
        }

        loop {
            tokio::time::sleep(self.settings.poll_interval).await;

            if self.guarded_poll(&mut state).await == Some(0) {
                info!("No new tx in last {} seconds", secs);
            }
        }
    }
}
