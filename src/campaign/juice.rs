//! Juice monitoring for the open short leg
//!
//! "Juice" is the extrinsic (time) value left in the campaign's active
//! short call. Once it drains the position has little left to give and
//! should be rolled; the monitor computes extrinsic value, days to
//! expiration and a roll signal against configurable floors.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::config::EngineConfig;

use super::builder::CONTRACT_MULTIPLIER;
use super::classify::classify;
use super::symbol;
use super::types::{ActiveShort, Campaign, LegClass, Position, Quote, QuoteBook};

/// Call intrinsic value: what exercising today would capture.
pub fn intrinsic_value(spot: Decimal, strike: Decimal) -> Decimal {
    (spot - strike).max(Decimal::ZERO)
}

/// Per-share extrinsic value (juice): option price beyond intrinsic.
pub fn extrinsic_value(last: Decimal, spot: Decimal, strike: Decimal) -> Decimal {
    last - intrinsic_value(spot, strike)
}

/// Whole days until expiration; negative once expired.
pub fn days_to_expiration(expiration: NaiveDate, today: NaiveDate) -> i64 {
    (expiration - today).num_days()
}

/// Scan open positions for INCOME-SHORT legs and attach each to its owning
/// campaign's active-short slot. Shorts on underlyings without a campaign
/// are ignored. When several shorts share an underlying the latest
/// expiration wins; the data model holds exactly one.
pub fn attach_active_shorts(
    campaigns: &mut BTreeMap<String, Campaign>,
    positions: &[Position],
    quotes: &QuoteBook,
    today: NaiveDate,
    config: &EngineConfig,
) {
    for position in positions {
        let quote = quotes.get(&position.symbol);
        let delta = quote.and_then(|q| q.delta);
        if classify(position.quantity, delta, config) != LegClass::IncomeShort {
            continue;
        }

        let decoded = symbol::decode(&position.symbol);
        let Some(campaign) = campaigns.get_mut(&decoded.underlying) else {
            debug!(symbol = %position.symbol, "Short with no campaign; ignoring");
            continue;
        };

        let short = monitor_short(position, quote, &decoded, campaign.spot, today, config);
        match &campaign.active_short {
            Some(existing) if existing.expiration >= short.expiration => {
                warn!(
                    underlying = %campaign.underlying,
                    kept = %existing.symbol,
                    dropped = %short.symbol,
                    "Multiple open shorts on one underlying; keeping latest expiration"
                );
            }
            Some(existing) => {
                warn!(
                    underlying = %campaign.underlying,
                    kept = %short.symbol,
                    dropped = %existing.symbol,
                    "Multiple open shorts on one underlying; keeping latest expiration"
                );
                campaign.active_short = Some(short);
            }
            None => campaign.active_short = Some(short),
        }
    }
}

/// Build the monitored view of one short position.
fn monitor_short(
    position: &Position,
    quote: Option<&Quote>,
    decoded: &symbol::DecodedSymbol,
    spot: Option<Decimal>,
    today: NaiveDate,
    config: &EngineConfig,
) -> ActiveShort {
    let strike = quote.and_then(|q| q.strike).unwrap_or(decoded.strike);
    let expiration = quote.and_then(|q| q.expiration_date).or(decoded.expiration);
    let last = quote.and_then(|q| q.last);

    // Zero or missing spot makes intrinsic meaningless; degrade to unknown
    // rather than reporting the full premium as juice.
    let spot = spot.filter(|s| *s > Decimal::ZERO);
    let extrinsic = match (last, spot) {
        (Some(last), Some(spot)) => Some(extrinsic_value(last, spot, strike)),
        _ => None,
    };
    let juice_dollars = extrinsic
        .map(|e| e * Decimal::from(CONTRACT_MULTIPLIER) * position.quantity.abs());
    let dte = expiration.map(|e| days_to_expiration(e, today));

    let roll_signal = match (extrinsic, juice_dollars) {
        (Some(extrinsic), Some(dollars)) => {
            dollars < config.juice_dollar_threshold
                || extrinsic < config.juice_share_threshold
        }
        _ => false,
    };

    ActiveShort {
        symbol: position.symbol.clone(),
        strike,
        expiration,
        quantity: position.quantity,
        last,
        extrinsic,
        juice_dollars,
        dte,
        roll_signal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    use crate::campaign::types::CoreLeg;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn campaigns_with_spot(spot: Option<Decimal>) -> BTreeMap<String, Campaign> {
        let mut campaign = Campaign::new("NVDA", spot);
        campaign.start = Some(date(2024, 3, 1));
        campaign.core.push(CoreLeg {
            symbol: "NVDA260116C00080000".to_string(),
            date_acquired: Some(date(2024, 3, 1)),
            expiration: Some(date(2026, 1, 16)),
            strike: dec!(80),
            quantity: dec!(1),
            cost: dec!(5000),
            value: dec!(6000),
        });
        let mut map = BTreeMap::new();
        map.insert("NVDA".to_string(), campaign);
        map
    }

    fn short_position(symbol: &str) -> Position {
        Position {
            symbol: symbol.to_string(),
            quantity: dec!(-1),
            cost_basis: dec!(600),
            date_acquired: Some(date(2024, 4, 1)),
        }
    }

    fn short_quote(symbol: &str, last: Decimal) -> Quote {
        let decoded = symbol::decode(symbol);
        Quote {
            symbol: symbol.to_string(),
            last: Some(last),
            delta: Some(dec!(-0.30)),
            theta: Some(dec!(-0.05)),
            strike: Some(decoded.strike),
            expiration_date: decoded.expiration,
        }
    }

    const SHORT: &str = "NVDA240503C00100000";

    #[test]
    fn test_intrinsic_and_extrinsic() {
        assert_eq!(intrinsic_value(dec!(105), dec!(100)), dec!(5));
        assert_eq!(intrinsic_value(dec!(95), dec!(100)), Decimal::ZERO);
        assert_eq!(extrinsic_value(dec!(6.00), dec!(105), dec!(100)), dec!(1.00));
        // Out of the money: the whole premium is juice.
        assert_eq!(extrinsic_value(dec!(2.50), dec!(95), dec!(100)), dec!(2.50));
    }

    #[test]
    fn test_healthy_juice_no_roll_signal() {
        let mut campaigns = campaigns_with_spot(Some(dec!(105)));
        let positions = vec![short_position(SHORT)];
        let mut quotes = QuoteBook::new();
        quotes.insert(SHORT.to_string(), short_quote(SHORT, dec!(6.00)));

        attach_active_shorts(
            &mut campaigns,
            &positions,
            &quotes,
            date(2024, 4, 18),
            &EngineConfig::default(),
        );

        let short = campaigns["NVDA"].active_short.as_ref().expect("active short");
        assert_eq!(short.extrinsic, Some(dec!(1.00)));
        assert_eq!(short.juice_dollars, Some(dec!(100.00)));
        assert_eq!(short.dte, Some(15));
        assert!(!short.roll_signal);
    }

    #[test]
    fn test_drained_juice_raises_roll_signal() {
        let mut campaigns = campaigns_with_spot(Some(dec!(112)));
        let positions = vec![short_position(SHORT)];
        let mut quotes = QuoteBook::new();
        quotes.insert(SHORT.to_string(), short_quote(SHORT, dec!(12.05)));

        attach_active_shorts(
            &mut campaigns,
            &positions,
            &quotes,
            date(2024, 4, 18),
            &EngineConfig::default(),
        );

        let short = campaigns["NVDA"].active_short.as_ref().unwrap();
        assert_eq!(short.extrinsic, Some(dec!(0.05)));
        assert_eq!(short.juice_dollars, Some(dec!(5.00)));
        assert!(short.roll_signal);
    }

    #[test]
    fn test_missing_spot_degrades_to_unknown() {
        let mut campaigns = campaigns_with_spot(None);
        let positions = vec![short_position(SHORT)];
        let mut quotes = QuoteBook::new();
        quotes.insert(SHORT.to_string(), short_quote(SHORT, dec!(6.00)));

        attach_active_shorts(
            &mut campaigns,
            &positions,
            &quotes,
            date(2024, 4, 18),
            &EngineConfig::default(),
        );

        let short = campaigns["NVDA"].active_short.as_ref().unwrap();
        assert_eq!(short.extrinsic, None);
        assert_eq!(short.juice_dollars, None);
        assert!(!short.roll_signal);
        // DTE still known from the contract itself.
        assert_eq!(short.dte, Some(15));
    }

    #[test]
    fn test_short_without_campaign_ignored() {
        let mut campaigns = campaigns_with_spot(Some(dec!(105)));
        let stray = "TSLA240503C00250000";
        let positions = vec![short_position(stray)];
        let mut quotes = QuoteBook::new();
        quotes.insert(stray.to_string(), short_quote(stray, dec!(4.00)));

        attach_active_shorts(
            &mut campaigns,
            &positions,
            &quotes,
            date(2024, 4, 18),
            &EngineConfig::default(),
        );
        assert!(campaigns["NVDA"].active_short.is_none());
    }

    #[test]
    fn test_latest_expiration_wins_with_two_shorts() {
        let mut campaigns = campaigns_with_spot(Some(dec!(105)));
        let near = "NVDA240503C00100000";
        let far = "NVDA240517C00105000";
        let positions = vec![short_position(near), short_position(far)];
        let mut quotes = QuoteBook::new();
        quotes.insert(near.to_string(), short_quote(near, dec!(6.00)));
        quotes.insert(far.to_string(), short_quote(far, dec!(3.20)));

        attach_active_shorts(
            &mut campaigns,
            &positions,
            &quotes,
            date(2024, 4, 18),
            &EngineConfig::default(),
        );

        let short = campaigns["NVDA"].active_short.as_ref().unwrap();
        assert_eq!(short.symbol, far);
        assert_eq!(short.expiration, Some(date(2024, 5, 17)));
    }

    #[test]
    fn test_long_dated_short_not_displaced_by_nearer() {
        let mut campaigns = campaigns_with_spot(Some(dec!(105)));
        let far = "NVDA240517C00105000";
        let near = "NVDA240503C00100000";
        // Far expiration arrives first; the nearer one must not displace it.
        let positions = vec![short_position(far), short_position(near)];
        let mut quotes = QuoteBook::new();
        quotes.insert(near.to_string(), short_quote(near, dec!(6.00)));
        quotes.insert(far.to_string(), short_quote(far, dec!(3.20)));

        attach_active_shorts(
            &mut campaigns,
            &positions,
            &quotes,
            date(2024, 4, 18),
            &EngineConfig::default(),
        );
        assert_eq!(campaigns["NVDA"].active_short.as_ref().unwrap().symbol, far);
    }

    #[test]
    fn test_dte_floor_and_sign() {
        let expiration = date(2024, 5, 3);
        assert_eq!(days_to_expiration(expiration, date(2024, 4, 18)), 15);
        assert_eq!(days_to_expiration(expiration, date(2024, 5, 3)), 0);
        assert_eq!(days_to_expiration(expiration, date(2024, 5, 6)), -3);
    }
}
