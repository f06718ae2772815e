//! History reconciliation
//!
//! Attributes historical option closures to their owning campaigns and
//! accumulates realized income without double-counting. Two strategies,
//! selected by whichever data source fed the run:
//!
//! - **Event pairing** (raw account history): per symbol, a single open
//!   sell-to-open slot is matched against the next buy-to-close, FIFO by
//!   date. A slot left open for a symbol that is no longer held is treated
//!   as an expiration (full premium captured). Symbols whose events carry
//!   only generic buy/sell sides fall back to signed cash-flow accumulation.
//! - **Gain/loss report** (broker-computed closed positions, preferred):
//!   each record is window-filtered against the campaign start and
//!   attributed to a leg by strike proximity.
//!
//! The single-slot FIFO pairing is an assumption, not a guarantee: the feed
//! carries no identifier linking an opening sale to its closing purchase, so
//! repeated trading of one contract can pair differently than broker-side
//! lot accounting.

use std::collections::{BTreeMap, HashSet};

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::config::EngineConfig;

use super::builder::CONTRACT_MULTIPLIER;
use super::symbol;
use super::types::{
    Campaign, ClosedPositionRecord, ClosedTrade, EventKind, HistoricalEvent, HistorySource,
    LegAttribution, SkippedRecords, TradeSide,
};

/// Reconcile one history source into the campaigns. Returns the exclusion
/// counts for the audit trail.
pub fn reconcile(
    campaigns: &mut BTreeMap<String, Campaign>,
    source: &HistorySource,
    open_symbols: &HashSet<String>,
    config: &EngineConfig,
) -> SkippedRecords {
    let mut skipped = SkippedRecords::default();
    match source {
        HistorySource::Events(events) => {
            reconcile_events(campaigns, events, open_symbols, config, &mut skipped);
        }
        HistorySource::GainLoss(records) => {
            reconcile_gainloss(campaigns, records, config, &mut skipped);
        }
    }

    // Newest-first audit log, stable for equal dates.
    for campaign in campaigns.values_mut() {
        campaign
            .closed_trades
            .sort_by(|a, b| b.close_date.cmp(&a.close_date));
    }
    skipped
}

/// Strike-proximity leg attribution: anything at a current CORE strike is
/// core turnover, everything else is income.
fn attribute(campaign: &Campaign, strike: Decimal, config: &EngineConfig) -> LegAttribution {
    if campaign.matches_core_strike(strike, config.strike_match_tolerance) {
        LegAttribution::Core
    } else {
        LegAttribution::Income
    }
}

fn contract_dollars(price: Decimal, quantity: Decimal) -> Decimal {
    price.abs() * quantity.abs() * Decimal::from(CONTRACT_MULTIPLIER)
}

// ---------------------------------------------------------------------------
// Strategy A: raw event stream
// ---------------------------------------------------------------------------

/// An opening sale waiting for its close.
struct OpenSale {
    date: chrono::NaiveDate,
    price: Decimal,
    quantity: Decimal,
}

fn reconcile_events(
    campaigns: &mut BTreeMap<String, Campaign>,
    events: &[HistoricalEvent],
    open_symbols: &HashSet<String>,
    config: &EngineConfig,
    skipped: &mut SkippedRecords,
) {
    // Page order is meaningless; regroup per symbol and sort by date before
    // any matching. Only option events that land inside a campaign window
    // participate.
    let mut groups: BTreeMap<&str, Vec<&HistoricalEvent>> = BTreeMap::new();
    for event in events {
        let decoded = symbol::decode(&event.symbol);
        if !decoded.is_option() {
            continue;
        }
        let Some(campaign) = campaigns.get(&decoded.underlying) else {
            skipped.no_campaign += 1;
            continue;
        };
        if let Some(start) = campaign.start {
            if event.date < start {
                skipped.outside_window += 1;
                continue;
            }
        } else {
            warn!(
                underlying = %campaign.underlying,
                "Campaign start unknown; admitting history event without window check"
            );
        }
        groups.entry(event.symbol.as_str()).or_default().push(event);
    }

    for (sym, mut group) in groups {
        group.sort_by_key(|e| e.date);
        let decoded = symbol::decode(sym);
        let Some(campaign) = campaigns.get_mut(&decoded.underlying) else {
            continue;
        };
        let attribution = attribute(campaign, decoded.strike, config);
        let is_open = open_symbols.contains(sym);

        let has_pairing_sides = group.iter().any(|e| {
            matches!(
                e.side,
                Some(TradeSide::SellToOpen) | Some(TradeSide::BuyToClose)
            )
        });

        if has_pairing_sides {
            pair_symbol_events(
                campaign,
                &decoded,
                &group,
                is_open,
                attribution,
                skipped,
            );
        } else {
            cash_flow_symbol_events(campaign, &decoded, &group, is_open, attribution, skipped);
        }
    }
}

/// Explicit STO/BTC pairing with a single open slot per symbol.
fn pair_symbol_events(
    campaign: &mut Campaign,
    decoded: &symbol::DecodedSymbol,
    group: &[&HistoricalEvent],
    still_open: bool,
    attribution: LegAttribution,
    skipped: &mut SkippedRecords,
) {
    let mut slot: Option<OpenSale> = None;

    for event in group {
        match event.side {
            Some(TradeSide::SellToOpen) => {
                if slot.is_some() {
                    // No close ever arrived for the previous sale; the
                    // single-slot model keeps only the latest.
                    debug!(symbol = %decoded.raw, "Overwriting unclosed sell-to-open slot");
                }
                slot = Some(OpenSale {
                    date: event.date,
                    price: event.price.abs(),
                    quantity: event.quantity.abs(),
                });
            }
            Some(TradeSide::BuyToClose) => match slot.take() {
                Some(open) => {
                    let realized =
                        (open.price - event.price.abs()) * event.quantity.abs()
                            * Decimal::from(CONTRACT_MULTIPLIER);
                    push_trade(
                        campaign,
                        ClosedTrade {
                            symbol: decoded.raw.clone(),
                            strike: decoded.strike,
                            open_date: Some(open.date),
                            close_date: Some(event.date),
                            expired: false,
                            operation: "STO/BTC".to_string(),
                            realized,
                            attribution,
                        },
                    );
                }
                None => {
                    debug!(symbol = %decoded.raw, date = %event.date, "Buy-to-close with no matching open");
                    skipped.unmatched += 1;
                }
            },
            _ => {
                // Stray sides inside a paired symbol carry no slot meaning.
                debug!(symbol = %decoded.raw, side = ?event.side, "Ignoring non-pairing side");
            }
        }
    }

    if let Some(open) = slot {
        if still_open {
            // The live short; its premium is not realized yet.
            return;
        }
        // Sold, never bought back, and no longer held: expired worthless,
        // full premium kept.
        let realized = contract_dollars(open.price, open.quantity);
        push_trade(
            campaign,
            ClosedTrade {
                symbol: decoded.raw.clone(),
                strike: decoded.strike,
                open_date: Some(open.date),
                close_date: decoded.expiration,
                expired: true,
                operation: "EXPIRED".to_string(),
                realized,
                attribution,
            },
        );
    }
}

/// Signed cash-flow fallback for symbols without explicit open/close sides.
/// Strictly more permissive than pairing; only applied to symbols that are
/// no longer held, so live premium is never counted as realized.
fn cash_flow_symbol_events(
    campaign: &mut Campaign,
    decoded: &symbol::DecodedSymbol,
    group: &[&HistoricalEvent],
    still_open: bool,
    attribution: LegAttribution,
    skipped: &mut SkippedRecords,
) {
    if still_open {
        return;
    }

    for event in group {
        let is_credit = event.kind == EventKind::OptionEvent
            || event.side.map(|s| s.is_sell()).unwrap_or(false);
        let is_debit = event.side.map(|s| s.is_buy()).unwrap_or(false);

        let cash = if is_credit {
            contract_dollars(event.price, event.quantity)
        } else if is_debit {
            -contract_dollars(event.price, event.quantity)
        } else {
            debug!(symbol = %decoded.raw, "Event with no usable direction");
            skipped.malformed += 1;
            continue;
        };

        let operation = if event.kind == EventKind::OptionEvent {
            "EXPIRATION".to_string()
        } else {
            event
                .side
                .map(|s| s.as_str().to_string())
                .unwrap_or_else(|| "OTHER".to_string())
        };

        push_trade(
            campaign,
            ClosedTrade {
                symbol: decoded.raw.clone(),
                strike: decoded.strike,
                open_date: None,
                close_date: Some(event.date),
                expired: false,
                operation,
                realized: cash,
                attribution,
            },
        );
    }
}

// ---------------------------------------------------------------------------
// Strategy B: broker gain/loss report
// ---------------------------------------------------------------------------

fn reconcile_gainloss(
    campaigns: &mut BTreeMap<String, Campaign>,
    records: &[ClosedPositionRecord],
    config: &EngineConfig,
    skipped: &mut SkippedRecords,
) {
    for record in records {
        let decoded = symbol::decode(&record.symbol);
        if !decoded.is_option() {
            // Stock closures are portfolio turnover, not campaign history.
            continue;
        }
        let Some(campaign) = campaigns.get_mut(&decoded.underlying) else {
            skipped.no_campaign += 1;
            continue;
        };
        // Window filter: trades closed before the current core position
        // existed belong to an earlier LEAP cycle. Inclusive on the start
        // day itself.
        if let Some(start) = campaign.start {
            if record.close_date < start {
                skipped.outside_window += 1;
                continue;
            }
        } else {
            warn!(
                underlying = %campaign.underlying,
                "Campaign start unknown; admitting gain/loss record without window check"
            );
        }

        let attribution = attribute(campaign, decoded.strike, config);
        push_trade(
            campaign,
            ClosedTrade {
                symbol: record.symbol.clone(),
                strike: decoded.strike,
                open_date: Some(record.open_date),
                close_date: Some(record.close_date),
                expired: false,
                operation: "CLOSED".to_string(),
                realized: record.gain_loss,
                attribution,
            },
        );
    }
}

/// Record a trade in the audit log; only INCOME-attributed flows touch the
/// realized accumulator.
fn push_trade(campaign: &mut Campaign, trade: ClosedTrade) {
    if trade.attribution == LegAttribution::Income {
        campaign.realized_income += trade.realized;
    }
    campaign.closed_trades.push(trade);
}
