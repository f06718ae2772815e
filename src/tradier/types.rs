//! Raw Tradier API shapes and boundary normalization
//!
//! The Tradier REST feed is duck-typed: list fields collapse to a single
//! object when one record exists, to JSON `null` or the literal string
//! `"null"` when empty, and may be absent entirely. Everything is
//! normalized here into the engine's strongly-typed records; core logic
//! never sees these shapes.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::campaign::types::{
    ClosedPositionRecord, EventKind, HistoricalEvent, Position, Quote, QuoteBook, TradeSide,
};

#[derive(Debug, thiserror::Error)]
pub enum TradierError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Tradier API returned status {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Malformed response body: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("No account found on this token's profile")]
    NoAccount,
}

/// A normalized feed page plus the number of records dropped as malformed.
#[derive(Debug, Clone)]
pub struct FeedBatch<T> {
    pub records: Vec<T>,
    pub malformed: usize,
}

// Manual impl: a derive would demand `T: Default`, which the record types
// don't carry.
impl<T> Default for FeedBatch<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            malformed: 0,
        }
    }
}

impl<T> FeedBatch<T> {
    pub fn extend(&mut self, other: FeedBatch<T>) {
        self.records.extend(other.records);
        self.malformed += other.malformed;
    }
}

/// Pull the list at `value[outer][inner]`, tolerating every shape the feed
/// produces: an array, a lone object, `null`, the string `"null"`, or a
/// missing key.
pub fn extract_list(value: &Value, outer: &str, inner: &str) -> Vec<Value> {
    match value.get(outer).and_then(|v| v.get(inner)) {
        Some(Value::Array(items)) => items.clone(),
        Some(obj @ Value::Object(_)) => vec![obj.clone()],
        _ => Vec::new(),
    }
}

/// First ten characters of a feed timestamp as a date. The feed mixes bare
/// dates with full ISO timestamps; only the date part is meaningful here.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let head = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct RawAccount {
    pub account_number: String,
}

/// Account numbers from a `user/profile` payload, first one first.
pub fn extract_accounts(value: &Value) -> Vec<String> {
    extract_list(value, "profile", "account")
        .into_iter()
        .filter_map(|item| serde_json::from_value::<RawAccount>(item).ok())
        .map(|a| a.account_number)
        .collect()
}

// ---------------------------------------------------------------------------
// Positions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct RawPosition {
    pub symbol: String,
    pub quantity: Decimal,
    #[serde(default)]
    pub cost_basis: Decimal,
    #[serde(default)]
    pub date_acquired: Option<String>,
}

pub fn normalize_positions(items: Vec<Value>) -> FeedBatch<Position> {
    let mut batch = FeedBatch::default();
    for item in items {
        match serde_json::from_value::<RawPosition>(item) {
            Ok(raw) => batch.records.push(Position {
                symbol: raw.symbol,
                quantity: raw.quantity,
                cost_basis: raw.cost_basis.abs(),
                date_acquired: raw.date_acquired.as_deref().and_then(parse_date),
            }),
            Err(err) => {
                debug!(%err, "Dropping malformed position record");
                batch.malformed += 1;
            }
        }
    }
    batch
}

// ---------------------------------------------------------------------------
// History events
// ---------------------------------------------------------------------------

/// Fill details nested one level down on some feed variants.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTradeDetail {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub quantity: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawEvent {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub side: Option<String>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub quantity: Option<Decimal>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub trade: Option<RawTradeDetail>,
}

pub fn normalize_events(items: Vec<Value>) -> FeedBatch<HistoricalEvent> {
    let mut batch = FeedBatch::default();
    for item in items {
        let raw: RawEvent = match serde_json::from_value(item) {
            Ok(raw) => raw,
            Err(err) => {
                debug!(%err, "Dropping malformed history event");
                batch.malformed += 1;
                continue;
            }
        };

        let kind = match raw.kind.as_deref() {
            Some("trade") => EventKind::Trade,
            Some("option") => EventKind::OptionEvent,
            // Dividends, transfers, journal entries: unrelated by design.
            _ => continue,
        };

        let detail = raw.trade.unwrap_or_default();
        let Some(symbol) = raw.symbol.or(detail.symbol) else {
            continue;
        };
        let Some(date) = raw.date.as_deref().and_then(parse_date) else {
            debug!(%symbol, "History event without a usable date");
            batch.malformed += 1;
            continue;
        };

        batch.records.push(HistoricalEvent {
            symbol,
            kind,
            side: raw.side.as_deref().map(TradeSide::parse),
            price: raw.price.or(detail.price).unwrap_or(Decimal::ZERO).abs(),
            quantity: raw.quantity.or(detail.quantity).unwrap_or(Decimal::ZERO).abs(),
            date,
        });
    }
    batch
}

// ---------------------------------------------------------------------------
// Gain/loss report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct RawClosedPosition {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub open_date: Option<String>,
    #[serde(default)]
    pub close_date: Option<String>,
    #[serde(default)]
    pub gain_loss: Option<Decimal>,
    #[serde(default)]
    pub quantity: Option<Decimal>,
    #[serde(default)]
    pub term: Option<i64>,
}

pub fn normalize_gainloss(items: Vec<Value>) -> FeedBatch<ClosedPositionRecord> {
    let mut batch = FeedBatch::default();
    for item in items {
        let raw: RawClosedPosition = match serde_json::from_value(item) {
            Ok(raw) => raw,
            Err(err) => {
                debug!(%err, "Dropping malformed gain/loss record");
                batch.malformed += 1;
                continue;
            }
        };
        let normalized = raw.symbol.as_ref().and_then(|symbol| {
            let open_date = raw.open_date.as_deref().and_then(parse_date)?;
            let close_date = raw.close_date.as_deref().and_then(parse_date)?;
            let gain_loss = raw.gain_loss?;
            Some(ClosedPositionRecord {
                symbol: symbol.clone(),
                open_date,
                close_date,
                gain_loss,
                quantity: raw.quantity.unwrap_or(Decimal::ZERO).abs(),
                term: raw.term,
            })
        });
        match normalized {
            Some(record) => batch.records.push(record),
            None => {
                debug!("Dropping gain/loss record with missing fields");
                batch.malformed += 1;
            }
        }
    }
    batch
}

// ---------------------------------------------------------------------------
// Quotes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawGreeks {
    #[serde(default)]
    pub delta: Option<Decimal>,
    #[serde(default)]
    pub theta: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawQuote {
    pub symbol: String,
    #[serde(default)]
    pub last: Option<Decimal>,
    #[serde(default)]
    pub strike: Option<Decimal>,
    #[serde(default)]
    pub expiration_date: Option<String>,
    #[serde(default)]
    pub greeks: Option<RawGreeks>,
}

pub fn normalize_quotes(items: Vec<Value>) -> QuoteBook {
    let mut book = QuoteBook::new();
    for item in items {
        match serde_json::from_value::<RawQuote>(item) {
            Ok(raw) => {
                let greeks = raw.greeks.unwrap_or_default();
                book.insert(
                    raw.symbol.clone(),
                    Quote {
                        symbol: raw.symbol,
                        last: raw.last,
                        delta: greeks.delta,
                        theta: greeks.theta,
                        strike: raw.strike,
                        expiration_date: raw.expiration_date.as_deref().and_then(parse_date),
                    },
                );
            }
            Err(err) => debug!(%err, "Dropping malformed quote"),
        }
    }
    book
}
