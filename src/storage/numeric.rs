//! Numeric Encoding for String Values
//!
//! The store has no integer or float type. Counters are ordinary byte strings
//! that happen to hold base-10 text, so every INCR-family operation parses the
//! stored bytes, does the arithmetic, and writes the canonical text back.
//!
//! ## Integer Rules
//!
//! Integers follow the strict Redis grammar:
//!
//! - an optional leading `-`, then one or more ASCII digits
//! - no leading `+`, no whitespace, no leading zeros (`"0"` itself is fine)
//! - the value must fit in an `i64`
//!
//! A well-formed number that does not fit in an `i64` is reported as
//! [`StoreError::OutOfRange`], anything else as [`StoreError::NotAnInteger`].
//!
//! ## Float Formatting
//!
//! INCRBYFLOAT results are written back as the shortest decimal text that
//! round-trips to the same `f64`, with no exponent and no trailing zeros:
//!
//! ```
//! use stringkv::storage::numeric::format_f64;
//!
//! assert_eq!(format_f64(10.5 + 0.1), "10.6");
//! assert_eq!(format_f64(3000.0), "3000");
//! assert_eq!(format_f64(1.0e-7), "0.0000001");
//! ```

use crate::storage::error::{StoreError, StoreResult};
use std::num::IntErrorKind;

/// Parses stored bytes as a signed 64-bit integer.
pub fn parse_i64(raw: &[u8]) -> StoreResult<i64> {
    let text = std::str::from_utf8(raw).map_err(|_| StoreError::TypeMismatch)?;
    parse_i64_str(text)
}

/// Parses text as a signed 64-bit integer using the strict grammar above.
pub fn parse_i64_str(text: &str) -> StoreResult<i64> {
    let digits = text.strip_prefix('-').unwrap_or(text);

    let well_formed = match digits.as_bytes() {
        [] => false,
        [b'0'] => !text.starts_with('-'),
        [first, rest @ ..] => {
            (b'1'..=b'9').contains(first) && rest.iter().all(u8::is_ascii_digit)
        }
    };
    if !well_formed {
        return Err(StoreError::NotAnInteger);
    }

    text.parse::<i64>().map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => StoreError::OutOfRange,
        _ => StoreError::NotAnInteger,
    })
}

/// Parses stored bytes as a finite float.
pub fn parse_f64(raw: &[u8]) -> StoreResult<f64> {
    let text = std::str::from_utf8(raw).map_err(|_| StoreError::TypeMismatch)?;
    parse_f64_str(text)
}

/// Parses text as a finite float. `inf` and `nan` spellings are rejected.
pub fn parse_f64_str(text: &str) -> StoreResult<f64> {
    match text.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(StoreError::NotAFloat),
    }
}

/// Formats a float as the shortest round-trip decimal without an exponent.
///
/// Negative zero is written as `"0"`.
pub fn format_f64(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    // `Display` for f64 never switches to scientific notation.
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_i64_valid() {
        assert_eq!(parse_i64(b"0"), Ok(0));
        assert_eq!(parse_i64(b"56"), Ok(56));
        assert_eq!(parse_i64(b"-42"), Ok(-42));
        assert_eq!(parse_i64(b"9223372036854775807"), Ok(i64::MAX));
        assert_eq!(parse_i64(b"-9223372036854775808"), Ok(i64::MIN));
    }

    #[test]
    fn test_parse_i64_rejects_malformed() {
        let cases: [&[u8]; 10] = [
            b"",
            b"-",
            b"+5",
            b" 5",
            b"5 ",
            b"007",
            b"-0",
            b"1.5",
            b"hello",
            b"12abc",
        ];
        for raw in cases {
            assert_eq!(parse_i64(raw), Err(StoreError::NotAnInteger), "{:?}", raw);
        }
    }

    #[test]
    fn test_parse_i64_overflow_is_out_of_range() {
        assert_eq!(
            parse_i64(b"18446744073709551616"),
            Err(StoreError::OutOfRange)
        );
        assert_eq!(
            parse_i64(b"9223372036854775808"),
            Err(StoreError::OutOfRange)
        );
        assert_eq!(
            parse_i64(b"-9223372036854775809"),
            Err(StoreError::OutOfRange)
        );
    }

    #[test]
    fn test_parse_non_utf8_is_type_mismatch() {
        assert_eq!(parse_i64(&[0xff, 0xfe]), Err(StoreError::TypeMismatch));
        assert_eq!(parse_f64(&[0xc3, 0x28]), Err(StoreError::TypeMismatch));
    }

    #[test]
    fn test_parse_f64() {
        assert_eq!(parse_f64(b"10.5"), Ok(10.5));
        assert_eq!(parse_f64(b"-3"), Ok(-3.0));
        assert_eq!(parse_f64(b"5.0e3"), Ok(5000.0));
        assert_eq!(parse_f64(b"abc"), Err(StoreError::NotAFloat));
        assert_eq!(parse_f64(b""), Err(StoreError::NotAFloat));
        assert_eq!(parse_f64(b"inf"), Err(StoreError::NotAFloat));
        assert_eq!(parse_f64(b"NaN"), Err(StoreError::NotAFloat));
    }

    #[test]
    fn test_format_f64() {
        assert_eq!(format_f64(10.6), "10.6");
        assert_eq!(format_f64(3.0), "3");
        assert_eq!(format_f64(-0.0), "0");
        assert_eq!(format_f64(-2.5), "-2.5");
        assert_eq!(format_f64(1.0e21), "1000000000000000000000");
        assert!(!format_f64(1.0e-10).contains('e'));
    }
}
