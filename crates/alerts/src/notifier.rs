//! Transfer notification dispatch.
//!
//! Every alert goes to the console log. Alerts are also posted to the
//! configured social sink, if any; posting failures are logged and never
//! propagated to the caller.

use crate::error::PostResult;
use crate::message::TransferAlert;
use async_trait::async_trait;
use tracing::{error, info};

/// External sink for plain-text updates.
#[async_trait]
pub trait Poster: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Publish `text`, returning the remote post id if known.
    async fn post(&self, text: &str) -> PostResult<Option<String>>;
}

/// What happened to the social post for one alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostStatus {
    /// No poster configured.
    Disabled,
    /// Posted; carries the remote id when returned.
    Posted(Option<String>),
    /// Posting failed; the error was logged.
    Failed(String),
}

/// Result of dispatching one alert.
#[derive(Debug, Clone)]
pub struct Delivery {
    /// Text that was (or would have been) posted
    pub text: String,
    pub post: PostStatus,
}

/// Sends transfer alerts to the console and optional poster.
pub struct Notifier {
    poster: Option<Box<dyn Poster>>,
}

impl Notifier {
    /// Console-only notifier.
    pub fn console_only() -> Self {
        Self { poster: None }
    }

    /// Notifier that also posts through `poster`.
    pub fn with_poster(poster: Box<dyn Poster>) -> Self {
        Self {
            poster: Some(poster),
        }
    }

    pub fn posting_enabled(&self) -> bool {
        self.poster.is_some()
    }

    /// Log the alert and post it if a poster is configured.
    pub async fn notify(&self, alert: &TransferAlert<'_>) -> Delivery {
        info!("\n{}", alert.console_text());

        let text = alert.post_text();
        let post = match &self.poster {
            None => PostStatus::Disabled,
            Some(poster) => match poster.post(&text).await {
                Ok(id) => {
                    info!(
                        "Posted update to {}. id: {}",
                        poster.name(),
                        id.as_deref().unwrap_or("unknown")
                    );
                    PostStatus::Posted(id)
                }
                Err(e) => {
                    error!("Could not post to {}: {}", poster.name(), e);
                    error!("Message was:\n{}", text);
                    PostStatus::Failed(e.to_string())
                }
            },
        };

        Delivery { text, post }
    }
}
