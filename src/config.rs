//! Engine configuration
//!
//! All reconciliation thresholds live in one explicit value passed into the
//! engine entry point; nothing reads ambient state mid-pass. Defaults can be
//! overridden by `LEAPLEDGER_*` environment variables (loaded via dotenvy at
//! startup) and by CLI flags on top of those.

use rust_decimal::Decimal;
use tracing::warn;

/// Thresholds steering classification, attribution and roll signals.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// |delta| above which a long position counts as the CORE leg.
    pub core_delta_threshold: Decimal,
    /// |delta| below which a short position counts as the INCOME leg.
    pub short_delta_threshold: Decimal,
    /// Absolute strike distance treated as "same strike" when attributing
    /// closed options to the CORE leg.
    pub strike_match_tolerance: Decimal,
    /// Roll signal when remaining juice falls under this many dollars.
    pub juice_dollar_threshold: Decimal,
    /// Roll signal when per-share extrinsic falls under this value.
    pub juice_share_threshold: Decimal,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            core_delta_threshold: Decimal::new(50, 2),  // 0.50
            short_delta_threshold: Decimal::new(50, 2), // 0.50
            strike_match_tolerance: Decimal::new(5, 1), // 0.5
            juice_dollar_threshold: Decimal::from(15),
            juice_share_threshold: Decimal::new(15, 2), // 0.15
        }
    }
}

impl EngineConfig {
    /// Defaults overlaid with any `LEAPLEDGER_*` environment overrides.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(v) = env_decimal("LEAPLEDGER_CORE_DELTA") {
            config.core_delta_threshold = v;
        }
        if let Some(v) = env_decimal("LEAPLEDGER_SHORT_DELTA") {
            config.short_delta_threshold = v;
        }
        if let Some(v) = env_decimal("LEAPLEDGER_STRIKE_TOLERANCE") {
            config.strike_match_tolerance = v;
        }
        if let Some(v) = env_decimal("LEAPLEDGER_JUICE_DOLLARS") {
            config.juice_dollar_threshold = v;
        }
        if let Some(v) = env_decimal("LEAPLEDGER_JUICE_SHARE") {
            config.juice_share_threshold = v;
        }
        config
    }
}

/// Read a decimal env var; unparsable values are ignored with a warning
/// rather than aborting startup.
fn env_decimal(name: &str) -> Option<Decimal> {
    let raw = std::env::var(name).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Ignoring {}={:?}: {}", name, raw, e);
            None
        }
    }
}
