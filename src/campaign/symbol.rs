//! Option symbol decoding
//!
//! Decodes OCC-style contract identifiers (root + YYMMDD + C/P + 8-digit
//! strike in thousandths) into their parts. Decoding never fails: anything
//! that doesn't match the strict pattern degrades to an equity symbol with
//! strike zero.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// What kind of contract a symbol identifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractKind {
    Call,
    Put,
    /// Stock or anything that didn't decode as an option.
    Equity,
}

/// A decoded contract identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedSymbol {
    pub raw: String,
    pub underlying: String,
    pub kind: ContractKind,
    pub strike: Decimal,
    pub expiration: Option<NaiveDate>,
}

impl DecodedSymbol {
    pub fn is_option(&self) -> bool {
        matches!(self.kind, ContractKind::Call | ContractKind::Put)
    }

    fn equity(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            underlying: underlying_root(raw).to_string(),
            kind: ContractKind::Equity,
            strike: Decimal::ZERO,
            expiration: None,
        }
    }
}

/// Underlying root: the leading run of uppercase ASCII letters.
///
/// Symbols too short to be option contracts pass through unchanged, so
/// dotted share classes ("BRK.B") keep their full ticker.
pub fn underlying_root(symbol: &str) -> &str {
    if symbol.len() < 6 {
        return symbol;
    }
    let end = symbol
        .bytes()
        .position(|b| !b.is_ascii_uppercase())
        .unwrap_or(symbol.len());
    if end == 0 {
        symbol
    } else {
        &symbol[..end]
    }
}

/// Decode a contract identifier, falling back to an equity symbol on any
/// mismatch. The strike field is fixed-point thousandths: "00010000" ⇒ 10.00.
pub fn decode(symbol: &str) -> DecodedSymbol {
    // Tail is fixed-width: 6 date digits + C/P + 8 strike digits.
    let bytes = symbol.as_bytes();
    if bytes.len() < 16 {
        return DecodedSymbol::equity(symbol);
    }
    let (head, tail) = bytes.split_at(bytes.len() - 15);

    if head.is_empty() || !head.iter().all(|b| b.is_ascii_uppercase()) {
        return DecodedSymbol::equity(symbol);
    }
    let (date_part, rest) = tail.split_at(6);
    let (cp, strike_part) = rest.split_at(1);
    if !date_part.iter().all(|b| b.is_ascii_digit())
        || !strike_part.iter().all(|b| b.is_ascii_digit())
    {
        return DecodedSymbol::equity(symbol);
    }
    let kind = match cp[0] {
        b'C' => ContractKind::Call,
        b'P' => ContractKind::Put,
        _ => return DecodedSymbol::equity(symbol),
    };

    let expiration = parse_expiration(date_part);
    if expiration.is_none() {
        // Digits that don't form a calendar date (e.g. month 13).
        return DecodedSymbol::equity(symbol);
    }

    let strike_milli: i64 = std::str::from_utf8(strike_part)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);

    DecodedSymbol {
        raw: symbol.to_string(),
        underlying: String::from_utf8_lossy(head).into_owned(),
        kind,
        strike: Decimal::new(strike_milli, 3),
        expiration,
    }
}

fn parse_expiration(digits: &[u8]) -> Option<NaiveDate> {
    let s = std::str::from_utf8(digits).ok()?;
    let yy: i32 = s[0..2].parse().ok()?;
    let mm: u32 = s[2..4].parse().ok()?;
    let dd: u32 = s[4..6].parse().ok()?;
    NaiveDate::from_ymd_opt(2000 + yy, mm, dd)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_decode_call() {
        let decoded = decode("NVDA260116C00100000");
        assert_eq!(decoded.underlying, "NVDA");
        assert_eq!(decoded.kind, ContractKind::Call);
        assert_eq!(decoded.strike, dec!(100));
        assert_eq!(
            decoded.expiration,
            NaiveDate::from_ymd_opt(2026, 1, 16)
        );
        assert!(decoded.is_option());
    }

    #[test]
    fn test_decode_put() {
        let decoded = decode("F241220P00011500");
        assert_eq!(decoded.underlying, "F");
        assert_eq!(decoded.kind, ContractKind::Put);
        assert_eq!(decoded.strike, dec!(11.5));
    }

    #[test]
    fn test_strike_fixed_point() {
        // Strike field is thousandths: "00010000" means $10.00.
        let decoded = decode("XYZ250620C00010000");
        assert_eq!(decoded.strike, dec!(10));
        let fractional = decode("XYZ250620C00012500");
        assert_eq!(fractional.strike, dec!(12.5));
    }

    #[test]
    fn test_stock_symbol_falls_through() {
        let decoded = decode("AMD");
        assert_eq!(decoded.kind, ContractKind::Equity);
        assert_eq!(decoded.underlying, "AMD");
        assert_eq!(decoded.strike, Decimal::ZERO);
        assert!(decoded.expiration.is_none());
        assert!(!decoded.is_option());
    }

    #[test]
    fn test_malformed_never_panics() {
        for raw in [
            "",
            "X",
            "nvda260116C00100000",     // lowercase root
            "NVDA26AB16C00100000",     // letters in the date
            "NVDA261316C00100000",     // month 13
            "NVDA260116X00100000",     // not C/P
            "NVDA260116C0010000Z",     // letter in the strike
            "12345678901234567890",
        ] {
            let decoded = decode(raw);
            assert_eq!(decoded.kind, ContractKind::Equity, "input: {raw}");
            assert_eq!(decoded.raw, raw);
        }
    }

    #[test]
    fn test_underlying_root() {
        assert_eq!(underlying_root("NVDA260116C00100000"), "NVDA");
        assert_eq!(underlying_root("SPY"), "SPY");
        // Short symbols pass through whole, preserving share classes.
        assert_eq!(underlying_root("BRK.B"), "BRK.B");
        // Long non-uppercase-led strings fall back to the raw symbol.
        assert_eq!(underlying_root("123456789"), "123456789");
    }
}
