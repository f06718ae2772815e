//! Tradier brokerage REST client
//!
//! Thin read-only client over the handful of endpoints the audit needs:
//! profile, positions, history, gain/loss and quotes. Every response is
//! normalized through [`super::types`] before leaving this module.

use chrono::NaiveDate;
use indicatif::ProgressBar;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::campaign::types::{ClosedPositionRecord, HistoricalEvent, Position, QuoteBook};

use super::types::{
    extract_accounts, extract_list, normalize_events, normalize_gainloss, normalize_positions,
    normalize_quotes, FeedBatch, TradierError,
};

pub const PRODUCTION_HOST: &str = "https://api.tradier.com/v1";
pub const SANDBOX_HOST: &str = "https://sandbox.tradier.com/v1";

/// Records per history page; the feed caps pages at this size.
pub const HISTORY_PAGE_LIMIT: u32 = 100;

pub struct TradierClient {
    http: Client,
    base_url: String,
    token: String,
}

impl TradierClient {
    pub fn new(token: impl Into<String>, sandbox: bool) -> Self {
        let host = if sandbox { SANDBOX_HOST } else { PRODUCTION_HOST };
        Self::with_base_url(token, host)
    }

    /// Point the client at an arbitrary host (tests).
    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value, TradierError> {
        let url = format!("{}/{}", self.base_url, path);
        debug!(%url, "Tradier GET");

        let response = self
            .http
            .get(&url)
            .query(query)
            .bearer_auth(&self.token)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "Tradier API error");
            return Err(TradierError::Api { status, body });
        }

        Ok(response.json().await?)
    }

    /// First account number on the token's profile.
    pub async fn account_id(&self) -> Result<String, TradierError> {
        let value = self.get_json("user/profile", &[]).await?;
        extract_accounts(&value)
            .into_iter()
            .next()
            .ok_or(TradierError::NoAccount)
    }

    /// Currently open positions.
    pub async fn positions(&self, account_id: &str) -> Result<FeedBatch<Position>, TradierError> {
        let value = self
            .get_json(&format!("accounts/{account_id}/positions"), &[])
            .await?;
        Ok(normalize_positions(extract_list(&value, "positions", "position")))
    }

    /// Historical account events from `since` onward, scanning up to
    /// `max_pages` pages of [`HISTORY_PAGE_LIMIT`] records. Stops early on
    /// the first empty page.
    pub async fn history(
        &self,
        account_id: &str,
        since: NaiveDate,
        max_pages: u32,
        progress: Option<&ProgressBar>,
    ) -> Result<FeedBatch<HistoricalEvent>, TradierError> {
        let mut batch = FeedBatch::default();
        for page in 1..=max_pages {
            if let Some(bar) = progress {
                bar.set_message(format!("history page {page}/{max_pages}"));
            }
            let value = self
                .get_json(
                    &format!("accounts/{account_id}/history"),
                    &[
                        ("limit", HISTORY_PAGE_LIMIT.to_string()),
                        ("page", page.to_string()),
                        ("start", since.format("%Y-%m-%d").to_string()),
                    ],
                )
                .await?;
            let items = extract_list(&value, "history", "event");
            if items.is_empty() {
                break;
            }
            batch.extend(normalize_events(items));
            if let Some(bar) = progress {
                bar.inc(1);
            }
        }
        debug!(events = batch.records.len(), malformed = batch.malformed, "History scan done");
        Ok(batch)
    }

    /// Broker-computed closed positions (realized gain/loss report).
    pub async fn gain_loss(
        &self,
        account_id: &str,
    ) -> Result<FeedBatch<ClosedPositionRecord>, TradierError> {
        let value = self
            .get_json(&format!("accounts/{account_id}/gainloss"), &[])
            .await?;
        Ok(normalize_gainloss(extract_list(
            &value,
            "gainloss",
            "closed_position",
        )))
    }

    /// Batched quotes with greeks for the given symbols. Empty input skips
    /// the round trip.
    pub async fn quotes(&self, symbols: &[String]) -> Result<QuoteBook, TradierError> {
        if symbols.is_empty() {
            return Ok(QuoteBook::new());
        }
        let value = self
            .get_json(
                "markets/quotes",
                &[
                    ("symbols", symbols.join(",")),
                    ("greeks", "true".to_string()),
                ],
            )
            .await?;
        Ok(normalize_quotes(extract_list(&value, "quotes", "quote")))
    }
}
