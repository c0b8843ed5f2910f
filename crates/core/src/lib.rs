//! Core data types for the transfer watcher.

pub mod address;
pub mod amount;
pub mod chain;
pub mod detector;
pub mod error;
pub mod snapshot;
pub mod token;
pub mod transfer;

pub use address::*;
pub use chain::*;
pub use detector::*;
pub use error::*;
pub use snapshot::*;
pub use token::*;
pub use transfer::*;
