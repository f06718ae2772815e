//! Tradier brokerage integration
//!
//! Read-only access to the account endpoints the audit consumes, plus the
//! normalization layer that turns the feed's duck-typed JSON into the
//! engine's records.

pub mod client;
pub mod types;

pub use client::{TradierClient, HISTORY_PAGE_LIMIT, PRODUCTION_HOST, SANDBOX_HOST};
pub use types::{FeedBatch, TradierError};
