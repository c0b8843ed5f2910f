//! Transfer alert system.
//!
//! This crate provides:
//! - Notification text for detected transfers
//! - X (Twitter) posting with OAuth 1.0a signing
//! - A notifier that logs every alert and posts when configured

pub mod error;
pub mod message;
pub mod notifier;
pub mod x;

pub use error::{PostError, PostResult};
pub use message::TransferAlert;
pub use notifier::{Delivery, Notifier, PostStatus, Poster};
pub use x::{XClient, XCredentials};
