//! Campaign engine type definitions with strong typing
//!
//! Everything the reconciliation engine consumes is normalized into these
//! types at the broker boundary; the engine never sees raw JSON shapes.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A currently held instrument, normalized from the broker position feed.
///
/// Quantity keeps its sign (negative = short); cost basis is stored absolute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub quantity: Decimal,
    pub cost_basis: Decimal,
    pub date_acquired: Option<NaiveDate>,
}

/// Side of a historical trade event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeSide {
    SellToOpen,
    SellToClose,
    Sell,
    BuyToOpen,
    BuyToClose,
    Buy,
    Other,
}

impl TradeSide {
    /// Parse a broker side string; generic buy/sell absorb unknown variants.
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "sell_to_open" => Self::SellToOpen,
            "sell_to_close" => Self::SellToClose,
            "buy_to_open" => Self::BuyToOpen,
            "buy_to_close" => Self::BuyToClose,
            other if other.contains("sell") => Self::Sell,
            other if other.contains("buy") => Self::Buy,
            _ => Self::Other,
        }
    }

    pub fn is_sell(&self) -> bool {
        matches!(self, Self::SellToOpen | Self::SellToClose | Self::Sell)
    }

    pub fn is_buy(&self) -> bool {
        matches!(self, Self::BuyToOpen | Self::BuyToClose | Self::Buy)
    }

    /// Uppercase label for audit display.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SellToOpen => "SELL_TO_OPEN",
            Self::SellToClose => "SELL_TO_CLOSE",
            Self::Sell => "SELL",
            Self::BuyToOpen => "BUY_TO_OPEN",
            Self::BuyToClose => "BUY_TO_CLOSE",
            Self::Buy => "BUY",
            Self::Other => "OTHER",
        }
    }
}

/// Kind of historical account event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// A regular fill (carries a side).
    Trade,
    /// An option lifecycle event (expiration/assignment notice).
    OptionEvent,
    Other,
}

/// A past account event, normalized: price and quantity are absolute,
/// direction is conveyed by the side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoricalEvent {
    pub symbol: String,
    pub kind: EventKind,
    pub side: Option<TradeSide>,
    pub price: Decimal,
    pub quantity: Decimal,
    pub date: NaiveDate,
}

/// One row of a broker-computed realized gain/loss report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClosedPositionRecord {
    pub symbol: String,
    pub open_date: NaiveDate,
    pub close_date: NaiveDate,
    pub gain_loss: Decimal,
    pub quantity: Decimal,
    /// Holding period in days, when the broker reports it.
    pub term: Option<i64>,
}

/// Live quote with greeks; read-only, supplied once per reconciliation pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub last: Option<Decimal>,
    pub delta: Option<Decimal>,
    pub theta: Option<Decimal>,
    pub strike: Option<Decimal>,
    pub expiration_date: Option<NaiveDate>,
}

/// Quotes keyed by exact symbol.
pub type QuoteBook = HashMap<String, Quote>;

/// Leg classification of an open position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LegClass {
    /// Long, high-delta, long-dated (the LEAP being financed).
    Core,
    /// Short, low-delta, short-dated (the premium harvest).
    IncomeShort,
    /// Covered stock, hedges, anything the campaign ignores.
    Unclassified,
}

/// One CORE (LEAP) holding inside a campaign.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreLeg {
    pub symbol: String,
    pub date_acquired: Option<NaiveDate>,
    pub expiration: Option<NaiveDate>,
    pub strike: Decimal,
    pub quantity: Decimal,
    pub cost: Decimal,
    pub value: Decimal,
}

impl CoreLeg {
    pub fn pnl(&self) -> Decimal {
        self.value - self.cost
    }
}

/// The single open INCOME-SHORT leg under juice monitoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveShort {
    pub symbol: String,
    pub strike: Decimal,
    pub expiration: Option<NaiveDate>,
    pub quantity: Decimal,
    pub last: Option<Decimal>,
    /// Per-share extrinsic value; `None` when spot or last is unavailable.
    pub extrinsic: Option<Decimal>,
    /// Extrinsic × 100 × |quantity|, in dollars.
    pub juice_dollars: Option<Decimal>,
    pub dte: Option<i64>,
    pub roll_signal: bool,
}

/// Which leg a closed trade was attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LegAttribution {
    /// Premium harvesting; counts toward realized income.
    Income,
    /// Core-position turnover; audited but excluded from income.
    Core,
}

impl LegAttribution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "INCOME",
            Self::Core => "CORE",
        }
    }
}

/// A realized option closure attributed to a campaign.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClosedTrade {
    pub symbol: String,
    pub strike: Decimal,
    pub open_date: Option<NaiveDate>,
    pub close_date: Option<NaiveDate>,
    /// True when the close was inferred from the symbol vanishing from the
    /// open-position snapshot rather than an explicit closing event.
    pub expired: bool,
    /// Audit label, e.g. "STO/BTC", "EXPIRED", "SELL_TO_OPEN".
    pub operation: String,
    /// Signed dollar impact on the campaign.
    pub realized: Decimal,
    pub attribution: LegAttribution,
}

impl ClosedTrade {
    /// Days in trade (open to close), when both dates are known.
    pub fn days_in_trade(&self) -> Option<i64> {
        match (self.open_date, self.close_date) {
            (Some(open), Some(close)) => Some((close - open).num_days()),
            _ => None,
        }
    }

    /// Close-date column label; inferred expirations show "EXPIRED".
    pub fn close_label(&self) -> String {
        if self.expired {
            "EXPIRED".to_string()
        } else {
            self.close_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "-".to_string())
        }
    }
}

/// One reconciled diagonal covered-call campaign, keyed by underlying root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub underlying: String,
    pub spot: Option<Decimal>,
    /// Earliest CORE acquisition date; `None` when the feed omitted them all.
    pub start: Option<NaiveDate>,
    pub core: Vec<CoreLeg>,
    pub realized_income: Decimal,
    pub closed_trades: Vec<ClosedTrade>,
    pub active_short: Option<ActiveShort>,
}

impl Campaign {
    pub fn new(underlying: impl Into<String>, spot: Option<Decimal>) -> Self {
        Self {
            underlying: underlying.into(),
            spot,
            start: None,
            core: Vec::new(),
            realized_income: Decimal::ZERO,
            closed_trades: Vec::new(),
            active_short: None,
        }
    }

    /// Total CORE cost basis.
    pub fn leaps_cost(&self) -> Decimal {
        self.core.iter().map(|l| l.cost).sum()
    }

    /// Total CORE market value.
    pub fn leaps_value(&self) -> Decimal {
        self.core.iter().map(|l| l.value).sum()
    }

    /// Whether a strike lands within `tolerance` of any current CORE strike.
    pub fn matches_core_strike(&self, strike: Decimal, tolerance: Decimal) -> bool {
        self.core
            .iter()
            .any(|l| (l.strike - strike).abs() <= tolerance)
    }
}

/// Counts of records excluded during a pass, for auditability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRecords {
    /// Unparsable or field-incomplete records.
    pub malformed: usize,
    /// Records whose underlying owns no campaign.
    pub no_campaign: usize,
    /// Records closed before the campaign start boundary.
    pub outside_window: usize,
    /// Closing events with no matching opening sale (scan window truncation).
    pub unmatched: usize,
}

impl SkippedRecords {
    pub fn total(&self) -> usize {
        self.malformed + self.no_campaign + self.outside_window + self.unmatched
    }

    pub fn absorb(&mut self, other: SkippedRecords) {
        self.malformed += other.malformed;
        self.no_campaign += other.no_campaign;
        self.outside_window += other.outside_window;
        self.unmatched += other.unmatched;
    }
}

/// Historical data source for one reconciliation run.
///
/// Exactly one source feeds a run; mixing both for the same underlying would
/// double-count realized income.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum HistorySource {
    /// Raw account events, paired by the reconciler (Strategy A).
    Events(Vec<HistoricalEvent>),
    /// Broker-computed closed positions (Strategy B, preferred).
    GainLoss(Vec<ClosedPositionRecord>),
}

impl HistorySource {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Events(_) => "event stream",
            Self::GainLoss(_) => "gain/loss report",
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Events(events) => events.is_empty(),
            Self::GainLoss(records) => records.is_empty(),
        }
    }
}

/// Aggregated performance figures for one campaign.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignKpis {
    pub leaps_cost: Decimal,
    pub leaps_value: Decimal,
    pub leaps_pnl: Decimal,
    pub realized_income: Decimal,
    pub net_income: Decimal,
    /// Percent; exactly zero when the cost basis is zero.
    pub roi: Decimal,
    pub annualized_roi: Decimal,
    pub days_active: i64,
}

/// One campaign plus its KPI rollup, ready for presentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignReport {
    pub campaign: Campaign,
    pub kpis: CampaignKpis,
}

/// Full output of one reconciliation pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    pub account_id: String,
    pub as_of: NaiveDate,
    /// Which history source fed the pass ("event stream" / "gain/loss report").
    pub source: String,
    pub campaigns: Vec<CampaignReport>,
    pub skipped: SkippedRecords,
}

impl AuditReport {
    pub fn is_empty(&self) -> bool {
        self.campaigns.is_empty()
    }
}
