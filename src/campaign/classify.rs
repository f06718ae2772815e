//! Leg classification
//!
//! Labels an open position from its quantity sign and live delta. A missing
//! or zero delta always yields UNCLASSIFIED so that stock and no-greeks
//! instruments can never masquerade as the long leg.

use rust_decimal::Decimal;

use crate::config::EngineConfig;

use super::types::LegClass;

/// Classify one position. Pure; delta comes from the live quote.
pub fn classify(quantity: Decimal, delta: Option<Decimal>, config: &EngineConfig) -> LegClass {
    let delta = match delta {
        Some(d) if !d.is_zero() => d.abs(),
        _ => return LegClass::Unclassified,
    };

    if quantity > Decimal::ZERO && delta > config.core_delta_threshold {
        LegClass::Core
    } else if quantity < Decimal::ZERO && delta < config.short_delta_threshold {
        LegClass::IncomeShort
    } else {
        LegClass::Unclassified
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn config() -> EngineConfig {
        EngineConfig::default()
    }

    #[test]
    fn test_long_high_delta_is_core() {
        assert_eq!(
            classify(dec!(2), Some(dec!(0.85)), &config()),
            LegClass::Core
        );
        // Deep ITM puts carry negative delta; magnitude decides.
        assert_eq!(
            classify(dec!(1), Some(dec!(-0.90)), &config()),
            LegClass::Core
        );
    }

    #[test]
    fn test_short_low_delta_is_income() {
        assert_eq!(
            classify(dec!(-1), Some(dec!(0.25)), &config()),
            LegClass::IncomeShort
        );
    }

    #[test]
    fn test_threshold_is_strict() {
        // Exactly at the boundary falls through on both sides.
        assert_eq!(
            classify(dec!(1), Some(dec!(0.50)), &config()),
            LegClass::Unclassified
        );
        assert_eq!(
            classify(dec!(-1), Some(dec!(0.50)), &config()),
            LegClass::Unclassified
        );
    }

    #[test]
    fn test_missing_delta_never_core() {
        assert_eq!(classify(dec!(10), None, &config()), LegClass::Unclassified);
        assert_eq!(
            classify(dec!(10), Some(Decimal::ZERO), &config()),
            LegClass::Unclassified
        );
    }

    #[test]
    fn test_short_high_delta_unclassified() {
        // A deep ITM short call is not income harvesting.
        assert_eq!(
            classify(dec!(-1), Some(dec!(0.75)), &config()),
            LegClass::Unclassified
        );
    }

    #[test]
    fn test_zero_quantity_unclassified() {
        assert_eq!(
            classify(Decimal::ZERO, Some(dec!(0.80)), &config()),
            LegClass::Unclassified
        );
    }
}
