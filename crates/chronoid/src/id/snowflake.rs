use crate::{Error, Identifier, Result};
use core::fmt;

/// A 64-bit Snowflake-style identifier.
///
/// The value is an opaque unsigned 64-bit bit pattern; how it partitions
/// into timestamp, machine, and sequence fields is the concern of
/// [`SnowflakeLayout`], and timestamp recovery is parameterized by epoch
/// offset and shift (see [`extract_millis`]).
///
/// Wire forms: the raw integer, a decimal string (which may exceed the
/// signed 64-bit range, up to 18446744073709551615), 16 hex chars, or 8
/// big-endian bytes.
///
/// [`SnowflakeLayout`]: crate::SnowflakeLayout
/// [`extract_millis`]: crate::extract_millis
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Snowflake {
    id: u64,
}

impl Snowflake {
    /// The Nil sentinel: all bits zero.
    pub const NIL: Self = Self { id: 0 };

    /// The Max sentinel: all bits one.
    pub const MAX: Self = Self { id: u64::MAX };

    /// Converts a raw integer into this type.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self { id: raw }
    }

    /// Converts this type into its raw integer representation.
    #[must_use]
    pub const fn to_raw(&self) -> u64 {
        self.id
    }

    /// Wraps 8 big-endian bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 8]) -> Self {
        Self {
            id: u64::from_be_bytes(bytes),
        }
    }

    /// Returns the big-endian byte form.
    #[must_use]
    pub const fn to_bytes(&self) -> [u8; 8] {
        self.id.to_be_bytes()
    }

    /// Returns the ID as a zero-padded 20-digit string, useful where the
    /// decimal form must sort lexicographically.
    #[must_use]
    pub fn to_padded_string(&self) -> String {
        format!("{:020}", self.id)
    }
}

impl Identifier for Snowflake {
    const BITS: u32 = 64;
    const EXPECTED_BYTES: &'static str = "8 big-endian bytes";
    const EXPECTED_HEX: &'static str = "16 hex chars";
    const EXPECTED_NUMERIC: &'static str = "integer in [0, 2^64)";

    fn to_u128(&self) -> u128 {
        u128::from(self.id)
    }

    fn from_raw_u128(raw: u128) -> Self {
        debug_assert!(raw <= u128::from(u64::MAX));
        Self { id: raw as u64 }
    }

    fn parse_canonical(text: &str) -> Result<Self> {
        // Canonical text is the unsigned decimal form. `u64::from_str`
        // covers the full range up to 18446744073709551615.
        text.parse::<u64>()
            .map(|id| Self { id })
            .map_err(|_| Error::Validation {
                expected: "decimal integer in [0, 2^64)",
                found: text.to_string(),
            })
    }

    fn canonical(&self) -> String {
        self.id.to_string()
    }
}

impl fmt::Display for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl fmt::Debug for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Snowflake({} / 0x{:016x})", self.id, self.id)
    }
}

impl From<u64> for Snowflake {
    fn from(raw: u64) -> Self {
        Self::from_raw(raw)
    }
}

impl From<Snowflake> for u64 {
    fn from(id: Snowflake) -> Self {
        id.to_raw()
    }
}

impl core::str::FromStr for Snowflake {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_canonical(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Format, IdKind, Numeric, Repr};

    #[test]
    fn decimal_beyond_signed_range_parses() {
        let id = Snowflake::parse_canonical("18446744073709551615").unwrap();
        assert_eq!(id, Snowflake::MAX);
        assert_eq!(id.kind(), IdKind::Max);
        assert_eq!(id.canonical(), "18446744073709551615");
    }

    #[test]
    fn rejects_out_of_range_and_malformed_decimals() {
        assert!(Snowflake::parse_canonical("18446744073709551616").is_err());
        assert!(Snowflake::parse_canonical("-1").is_err());
        assert!(Snowflake::parse_canonical("12ab").is_err());
    }

    #[test]
    fn numeric_repr_is_always_native() {
        let id = Snowflake::from_raw(1_541_815_603_606_036_480);
        assert_eq!(
            id.to_repr(Format::Numeric),
            Repr::Numeric(Numeric::Int(1_541_815_603_606_036_480))
        );
    }

    #[test]
    fn numeric_parse_rejects_values_beyond_64_bits() {
        let wide = Repr::Numeric(Numeric::BigDecimal("18446744073709551616".into()));
        assert!(matches!(
            Snowflake::parse(&wide),
            Err(Error::Validation { .. })
        ));
        let max = Repr::Numeric(Numeric::BigDecimal("18446744073709551615".into()));
        assert_eq!(Snowflake::parse(&max).unwrap(), Snowflake::MAX);
    }

    #[test]
    fn hex_and_bytes_are_eight_wide() {
        let id = Snowflake::from_raw(0x0123_4567_89AB_CDEF);
        assert_eq!(id.to_repr(Format::Hex), Repr::Hex("0123456789abcdef".into()));
        assert_eq!(
            id.to_repr(Format::Bytes),
            Repr::Bytes(vec![0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xEF])
        );
        assert!(Snowflake::parse(&Repr::Bytes(vec![0u8; 16])).is_err());
    }

    #[test]
    fn all_representations_roundtrip() {
        let id = Snowflake::from_raw(1_541_815_603_606_036_480);
        for format in [Format::Bytes, Format::Hex, Format::Canonical, Format::Numeric] {
            assert_eq!(Snowflake::parse(&id.to_repr(format)).unwrap(), id, "{format:?}");
        }
    }

    #[test]
    fn padded_string_sorts_like_the_integer() {
        let a = Snowflake::from_raw(99);
        let b = Snowflake::from_raw(100);
        assert!(a.to_padded_string() < b.to_padded_string());
        assert_eq!(a.to_padded_string().len(), 20);
    }
}
