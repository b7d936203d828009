mod repr;
mod snowflake;
mod ulid;
mod uuid;

pub use repr::*;
pub use snowflake::*;
pub use ulid::*;
pub use uuid::*;

use crate::{Error, Result};

/// Common surface of the identifier families.
///
/// An identifier is an immutable fixed-width bit pattern (128 bits for the
/// UUID/ULID families, 64 for Snowflakes), validated at construction. Its
/// representation never affects equality or ordering: two identifiers are
/// equal iff their bit patterns are equal, which the `Eq`/`Ord` bounds here
/// inherit directly from the backing integer.
///
/// The format-conversion engine lives in the default methods: each family
/// supplies its width, canonical-text codec, and error labels, and inherits
/// lossless `parse`/`to_repr` across all of [`Format`]'s arms.
pub trait Identifier: Sized + Copy + Clone + Eq + Ord + core::hash::Hash {
    /// Width of the bit pattern (64 or 128).
    const BITS: u32;

    /// Error label naming the expected byte shape.
    const EXPECTED_BYTES: &'static str;
    /// Error label naming the expected hex shape.
    const EXPECTED_HEX: &'static str;
    /// Error label naming the expected numeric domain.
    const EXPECTED_NUMERIC: &'static str;

    /// Returns the raw bit pattern, zero-extended to 128 bits.
    fn to_u128(&self) -> u128;

    /// Builds the identifier from a raw value already known to be in range.
    fn from_raw_u128(raw: u128) -> Self;

    /// Parses the family's canonical text form.
    fn parse_canonical(text: &str) -> Result<Self>;

    /// Formats the family's canonical text form.
    fn canonical(&self) -> String;

    /// The fixed byte length of the raw form.
    #[must_use]
    fn byte_len() -> usize {
        (Self::BITS / 8) as usize
    }

    /// The largest raw value of this family (the Max sentinel).
    #[must_use]
    fn max_value() -> u128 {
        if Self::BITS == 128 {
            u128::MAX
        } else {
            (1 << Self::BITS) - 1
        }
    }

    /// Classifies the bit pattern as Nil, Max, or a standard value.
    ///
    /// Detection operates on the raw value, so it is independent of the
    /// representation the identifier was parsed from.
    fn kind(&self) -> IdKind {
        let raw = self.to_u128();
        if raw == 0 {
            IdKind::Nil
        } else if raw == Self::max_value() {
            IdKind::Max
        } else {
            IdKind::Standard
        }
    }

    /// Parses any supported representation into an identifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] naming the expected shape on wrong
    /// length, disallowed characters, or a numeric value outside the
    /// family's range.
    fn parse(repr: &Repr) -> Result<Self> {
        match repr {
            Repr::Bytes(bytes) => {
                if bytes.len() != Self::byte_len() {
                    return Err(Error::Validation {
                        expected: Self::EXPECTED_BYTES,
                        found: format!("{} bytes", bytes.len()),
                    });
                }
                let mut raw = 0u128;
                for &b in bytes {
                    raw = (raw << 8) | u128::from(b);
                }
                Ok(Self::from_raw_u128(raw))
            }
            Repr::Hex(text) => {
                let mut buf = vec![0u8; Self::byte_len()];
                decode_hex(text, &mut buf, Self::EXPECTED_HEX)?;
                let mut raw = 0u128;
                for &b in &buf {
                    raw = (raw << 8) | u128::from(b);
                }
                Ok(Self::from_raw_u128(raw))
            }
            Repr::Canonical(text) => Self::parse_canonical(text),
            Repr::Numeric(numeric) => {
                let raw = numeric.to_u128()?;
                if raw > Self::max_value() {
                    return Err(Error::Validation {
                        expected: Self::EXPECTED_NUMERIC,
                        found: raw.to_string(),
                    });
                }
                Ok(Self::from_raw_u128(raw))
            }
        }
    }

    /// Converts the identifier into the requested representation.
    ///
    /// Lossless: `Self::parse(&id.to_repr(f))` reproduces `id` for every
    /// `f` in [`Format`].
    fn to_repr(&self, format: Format) -> Repr {
        let be = self.to_u128().to_be_bytes();
        let tail = &be[16 - Self::byte_len()..];
        match format {
            Format::Bytes => Repr::Bytes(tail.to_vec()),
            Format::Hex => Repr::Hex(encode_hex(tail)),
            Format::Canonical => Repr::Canonical(self.canonical()),
            Format::Numeric => Repr::Numeric(Numeric::from_u128(self.to_u128())),
        }
    }
}
