use crate::{Error, Result};

/// The closed set of representations an identifier can be converted to.
///
/// Every identifier family supports all four; `parse`/`to_repr` round-trip
/// losslessly within a family's domain.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Format {
    /// Raw big-endian bytes, fixed length per family (16 or 8).
    Bytes,
    /// Lowercase hex text, fixed length, no separators.
    Hex,
    /// The family's canonical text form: dash-grouped hex for UUIDs,
    /// Crockford base32 for ULIDs, a decimal string for Snowflakes.
    Canonical,
    /// A numeric value, see [`Numeric`].
    Numeric,
}

/// The numeric form of an identifier.
///
/// This is an explicit tagged choice, never an implicit coercion: values
/// that fit a native `u64` are carried as [`Numeric::Int`]; anything wider
/// (128-bit families reach 2^128 − 1) is carried as an arbitrary-precision
/// decimal string.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Numeric {
    Int(u64),
    BigDecimal(String),
}

impl Numeric {
    /// Builds the numeric form of a raw value, choosing the native arm
    /// whenever the value fits.
    #[must_use]
    pub fn from_u128(value: u128) -> Self {
        match u64::try_from(value) {
            Ok(v) => Self::Int(v),
            Err(_) => Self::BigDecimal(value.to_string()),
        }
    }

    /// Returns the value as a `u128`, parsing the decimal arm if necessary.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the decimal string is not a
    /// non-negative integer within `u128` range.
    pub fn to_u128(&self) -> Result<u128> {
        match self {
            Self::Int(v) => Ok(u128::from(*v)),
            Self::BigDecimal(text) => {
                text.parse::<u128>().map_err(|_| Error::Validation {
                    expected: "decimal integer in [0, 2^128)",
                    found: text.clone(),
                })
            }
        }
    }
}

/// An owned representation of an identifier in one of the formats of
/// [`Format`]. Parsing takes a `Repr`; formatting produces one.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Repr {
    Bytes(Vec<u8>),
    Hex(String),
    Canonical(String),
    Numeric(Numeric),
}

impl Repr {
    /// The [`Format`] tag of this representation.
    #[must_use]
    pub fn format(&self) -> Format {
        match self {
            Self::Bytes(_) => Format::Bytes,
            Self::Hex(_) => Format::Hex,
            Self::Canonical(_) => Format::Canonical,
            Self::Numeric(_) => Format::Numeric,
        }
    }
}

/// Classification of an identifier's bit pattern.
///
/// The sentinels are detected on the raw value, independent of which
/// representation the value arrived in.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum IdKind {
    /// All bits zero.
    Nil,
    /// All bits one.
    Max,
    /// Anything else.
    Standard,
}

/// Decodes fixed-length hex text into `out`, accepting either case.
///
/// The input must be exactly `2 * out.len()` hex digits with no separators.
pub(crate) fn decode_hex(text: &str, out: &mut [u8], expected: &'static str) -> Result<()> {
    let bytes = text.as_bytes();
    if bytes.len() != out.len() * 2 {
        return Err(Error::Validation {
            expected,
            found: text.to_string(),
        });
    }
    for (i, slot) in out.iter_mut().enumerate() {
        let hi = hex_val(bytes[2 * i]);
        let lo = hex_val(bytes[2 * i + 1]);
        match (hi, lo) {
            (Some(hi), Some(lo)) => *slot = (hi << 4) | lo,
            _ => {
                return Err(Error::Validation {
                    expected,
                    found: text.to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Encodes bytes as lowercase hex with no separators.
pub(crate) fn encode_hex(bytes: &[u8]) -> String {
    const DIGITS: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        out.push(DIGITS[usize::from(b >> 4)] as char);
        out.push(DIGITS[usize::from(b & 0x0F)] as char);
    }
    out
}

fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_picks_native_arm_when_it_fits() {
        assert_eq!(Numeric::from_u128(42), Numeric::Int(42));
        assert_eq!(Numeric::from_u128(u128::from(u64::MAX)), Numeric::Int(u64::MAX));
    }

    #[test]
    fn numeric_falls_back_to_decimal_text_above_u64() {
        let wide = u128::from(u64::MAX) + 1;
        assert_eq!(
            Numeric::from_u128(wide),
            Numeric::BigDecimal("18446744073709551616".to_string())
        );
        assert_eq!(
            Numeric::from_u128(u128::MAX),
            Numeric::BigDecimal("340282366920938463463374607431768211455".to_string())
        );
    }

    #[test]
    fn numeric_roundtrips_through_u128() {
        for v in [0u128, 1, u128::from(u64::MAX), u128::from(u64::MAX) + 1, u128::MAX] {
            assert_eq!(Numeric::from_u128(v).to_u128().unwrap(), v);
        }
    }

    #[test]
    fn numeric_rejects_garbage_decimal() {
        let bad = Numeric::BigDecimal("12x4".to_string());
        assert!(matches!(bad.to_u128(), Err(Error::Validation { .. })));
        let negative = Numeric::BigDecimal("-5".to_string());
        assert!(matches!(negative.to_u128(), Err(Error::Validation { .. })));
    }

    #[test]
    fn hex_roundtrip_and_case_insensitivity() {
        let mut out = [0u8; 4];
        decode_hex("DEADbeef", &mut out, "8 hex chars").unwrap();
        assert_eq!(out, [0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(encode_hex(&out), "deadbeef");
    }

    #[test]
    fn hex_rejects_bad_length_and_characters() {
        let mut out = [0u8; 4];
        assert!(decode_hex("deadbee", &mut out, "8 hex chars").is_err());
        assert!(decode_hex("deadbeeg", &mut out, "8 hex chars").is_err());
    }
}
