//! Campaign aggregation
//!
//! Groups classified positions by underlying root into Campaign aggregates.
//! Only underlyings holding at least one CORE position produce a campaign;
//! stray shorts and unclassified holdings never do. The campaign start
//! boundary is pinned to the earliest CORE acquisition date, which the
//! reconciler later uses as its attribution window.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::config::EngineConfig;

use super::classify::classify;
use super::symbol;
use super::types::{Campaign, CoreLeg, LegClass, Position, Quote, QuoteBook};

/// Shares per standard option contract.
pub const CONTRACT_MULTIPLIER: u32 = 100;

/// Build one campaign per underlying that holds a CORE leg.
pub fn build_campaigns(
    positions: &[Position],
    quotes: &QuoteBook,
    config: &EngineConfig,
) -> BTreeMap<String, Campaign> {
    let mut campaigns = BTreeMap::new();

    for position in positions {
        let quote = quotes.get(&position.symbol);
        let delta = quote.and_then(|q| q.delta);
        if classify(position.quantity, delta, config) != LegClass::Core {
            continue;
        }

        let decoded = symbol::decode(&position.symbol);
        let underlying = decoded.underlying.clone();
        let spot = quotes.get(&underlying).and_then(|q| q.last);

        let campaign = campaigns
            .entry(underlying.clone())
            .or_insert_with(|| Campaign::new(underlying, spot));
        campaign.core.push(core_leg(position, quote, &decoded));
        campaign.start = campaign
            .core
            .iter()
            .filter_map(|l| l.date_acquired)
            .min();
    }

    campaigns
}

/// Build the CORE leg record, preferring quote fields over the decoded
/// symbol for strike/expiration (the quote is authoritative when present).
fn core_leg(position: &Position, quote: Option<&Quote>, decoded: &symbol::DecodedSymbol) -> CoreLeg {
    let last = quote.and_then(|q| q.last).unwrap_or(Decimal::ZERO);
    let strike = quote
        .and_then(|q| q.strike)
        .unwrap_or(decoded.strike);
    let expiration = quote
        .and_then(|q| q.expiration_date)
        .or(decoded.expiration);

    CoreLeg {
        symbol: position.symbol.clone(),
        date_acquired: position.date_acquired,
        expiration,
        strike,
        quantity: position.quantity,
        cost: position.cost_basis.abs(),
        value: position.quantity * last * Decimal::from(CONTRACT_MULTIPLIER),
    }
}
