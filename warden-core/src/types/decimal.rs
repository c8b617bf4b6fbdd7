//! Fixed-point amount conversion.
//!
//! Chains report amounts as integers in their smallest unit (or as
//! `LegacyDec` values carrying 18 implied decimals). Metrics want a human
//! scaled float, so everything funnels through [`scale`]. Precision is only
//! given up at that last step.

use std::str::FromStr;

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};

/// Number of implied decimals in a cosmos-sdk `LegacyDec`.
pub const LEGACY_DEC_PRECISION: u32 = 18;

/// Errors produced while reading a raw amount
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecimalError {
    /// The upstream sent an empty amount
    #[error("empty amount")]
    Empty,
    /// The amount is not a non-negative number in the expected radix
    #[error("invalid amount {0:?}")]
    Invalid(String),
}

/// Divide `value` by `10^exponent`.
pub fn scale(value: f64, exponent: u32) -> f64 {
    value / pow10(exponent)
}

/// Multiply `value` by `10^exponent`; the inverse of [`scale`].
pub fn unscale(value: f64, exponent: u32) -> f64 {
    value * pow10(exponent)
}

fn pow10(exponent: u32) -> f64 {
    10f64.powi(exponent.min(i32::MAX as u32) as i32)
}

fn big_to_f64(value: &BigUint) -> f64 {
    // BigUint -> f64 only saturates to infinity, it never fails
    value.to_f64().unwrap_or(f64::INFINITY)
}

/// Parse a base-10 integer amount and scale it down by `10^exponent`.
pub fn parse_integer_amount(raw: &str, exponent: u32) -> Result<f64, DecimalError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(DecimalError::Empty);
    }
    let value = BigUint::from_str(raw).map_err(|_| DecimalError::Invalid(raw.to_owned()))?;
    Ok(scale(big_to_f64(&value), exponent))
}

/// Parse a base-10 decimal amount such as `"1250.500000000000000000"` and
/// scale it down by `10^exponent`. Plain integers are accepted too.
pub fn parse_decimal_amount(raw: &str, exponent: u32) -> Result<f64, DecimalError> {
    let raw = raw.trim();
    let Some((int_part, frac_part)) = raw.split_once('.') else {
        return parse_integer_amount(raw, exponent);
    };
    let invalid = || DecimalError::Invalid(raw.to_owned());
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(invalid());
    }
    if !frac_part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let int_value = if int_part.is_empty() {
        BigUint::zero()
    } else {
        BigUint::from_str(int_part).map_err(|_| invalid())?
    };
    let frac_value = if frac_part.is_empty() {
        0.0
    } else {
        f64::from_str(&format!("0.{frac_part}")).map_err(|_| invalid())?
    };

    Ok(scale(big_to_f64(&int_value) + frac_value, exponent))
}

/// Parse a `0x` prefixed hexadecimal amount (as returned by `eth_getBalance`)
/// and scale it down by `10^exponent`.
pub fn parse_hex_amount(raw: &str, exponent: u32) -> Result<f64, DecimalError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(DecimalError::Empty);
    }
    let digits = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .unwrap_or(raw);
    if digits.is_empty() {
        return Ok(0.0);
    }
    let value = BigUint::parse_bytes(digits.as_bytes(), 16)
        .ok_or_else(|| DecimalError::Invalid(raw.to_owned()))?;
    Ok(scale(big_to_f64(&value), exponent))
}

/// Read a `LegacyDec` as serialised in gRPC `bytes` fields.
///
/// The wire form is the decimal's internal integer (value × 10^18) rendered
/// as ASCII digits. Some nodes send the human form with a decimal point
/// instead; both are accepted.
pub fn parse_legacy_dec(raw: &[u8]) -> Result<f64, DecimalError> {
    let text =
        std::str::from_utf8(raw).map_err(|_| DecimalError::Invalid(format!("{raw:?}")))?;
    if text.contains('.') {
        parse_decimal_amount(text, 0)
    } else {
        parse_integer_amount(text, LEGACY_DEC_PRECISION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        let tolerance = expected.abs() * 1e-12;
        assert!(
            (actual - expected).abs() <= tolerance,
            "{actual} is not within {tolerance} of {expected}"
        );
    }

    #[test]
    fn integer_amounts_are_scaled() {
        assert_eq!(parse_integer_amount("0", 18).unwrap(), 0.0);
        assert_close(parse_integer_amount("1500000", 6).unwrap(), 1.5);
        assert_close(
            parse_integer_amount("1000000000000000000", 18).unwrap(),
            1.0,
        );
    }

    #[test]
    fn scaling_round_trips_representative_magnitudes() {
        // zero, a small balance, and a supply near the top of what chains mint
        let amounts = ["0", "42", "1234567", "1000000000000000000000000000"];
        for exponent in [0, 6, 18] {
            for raw in amounts {
                let expected = f64::from_str(raw).unwrap();
                let scaled = parse_integer_amount(raw, exponent).unwrap();
                assert_close(unscale(scaled, exponent), expected);
            }
        }
    }

    #[test]
    fn decimal_amounts_keep_their_fraction() {
        assert_close(
            parse_decimal_amount("1250.500000000000000000", 0).unwrap(),
            1250.5,
        );
        assert_close(parse_decimal_amount("0.25", 0).unwrap(), 0.25);
        assert_close(parse_decimal_amount("2500000.0", 6).unwrap(), 2.5);
        assert_close(parse_decimal_amount("300", 2).unwrap(), 3.0);
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_integer_amount("", 6), Err(DecimalError::Empty));
        assert!(matches!(
            parse_integer_amount("12a", 6),
            Err(DecimalError::Invalid(_))
        ));
        assert!(matches!(
            parse_integer_amount("-5", 0),
            Err(DecimalError::Invalid(_))
        ));
        assert!(matches!(
            parse_decimal_amount("1.2.3", 0),
            Err(DecimalError::Invalid(_))
        ));
        assert!(matches!(
            parse_decimal_amount(".", 0),
            Err(DecimalError::Invalid(_))
        ));
        assert!(matches!(
            parse_hex_amount("0xzz", 18),
            Err(DecimalError::Invalid(_))
        ));
    }

    #[test]
    fn hex_balances() {
        assert_eq!(parse_hex_amount("0x0", 18).unwrap(), 0.0);
        assert_eq!(parse_hex_amount("0x", 18).unwrap(), 0.0);
        // 1.5 ether
        assert_close(parse_hex_amount("0x14d1120d7b160000", 18).unwrap(), 1.5);
    }

    #[test]
    fn legacy_dec_in_both_forms() {
        assert_close(parse_legacy_dec(b"130000000000000000").unwrap(), 0.13);
        assert_close(parse_legacy_dec(b"0.130000000000000000").unwrap(), 0.13);
        assert!(parse_legacy_dec(&[0xff, 0xfe]).is_err());
    }
}
