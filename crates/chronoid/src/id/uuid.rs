use super::{decode_hex, encode_hex};
use crate::{Error, Identifier, Result, Variant, Version, variant_of, version_of};
use core::fmt;

/// A 128-bit universally unique identifier per RFC 9562.
///
/// The canonical text form is dash-grouped lowercase hex:
///
/// ```text
/// xxxxxxxx-xxxx-Mxxx-Nxxx-xxxxxxxxxxxx
/// ```
///
/// where `M` carries the version nibble and `N` the variant marker bits.
/// Input is accepted case-insensitively; output is always lowercase.
///
/// # Example
///
/// ```
/// use chronoid::{Format, Identifier, Repr, Uuid};
///
/// let id = Uuid::parse_canonical("550E8400-E29B-41D4-A716-446655440000").unwrap();
/// assert_eq!(id.canonical(), "550e8400-e29b-41d4-a716-446655440000");
/// assert_eq!(
///     id.to_repr(Format::Hex),
///     Repr::Hex("550e8400e29b41d4a716446655440000".into())
/// );
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Uuid {
    bytes: [u8; 16],
}

impl Uuid {
    /// The Nil sentinel: all bits zero.
    pub const NIL: Self = Self { bytes: [0x00; 16] };

    /// The Max sentinel: all bits one.
    pub const MAX: Self = Self { bytes: [0xFF; 16] };

    /// Canonical text length, including the four dashes.
    pub const CANONICAL_LEN: usize = 36;

    /// Wraps raw bytes. Every 16-byte pattern is a structurally valid UUID.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self { bytes }
    }

    /// Returns the RFC-layout bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.bytes
    }

    /// Consumes the UUID and returns its bytes.
    #[must_use]
    pub const fn into_bytes(self) -> [u8; 16] {
        self.bytes
    }

    /// Returns the version field, or `None` when the variant is not the RFC
    /// family or the nibble is not one of the eight defined versions.
    #[must_use]
    pub fn version(&self) -> Option<Version> {
        version_of(&self.bytes)
    }

    /// Returns the variant family encoded in the high bits of byte 8.
    #[must_use]
    pub fn variant(&self) -> Variant {
        variant_of(&self.bytes)
    }
}

impl Identifier for Uuid {
    const BITS: u32 = 128;
    const EXPECTED_BYTES: &'static str = "16 UUID bytes";
    const EXPECTED_HEX: &'static str = "32 hex chars";
    const EXPECTED_NUMERIC: &'static str = "integer in [0, 2^128)";

    fn to_u128(&self) -> u128 {
        u128::from_be_bytes(self.bytes)
    }

    fn from_raw_u128(raw: u128) -> Self {
        Self {
            bytes: raw.to_be_bytes(),
        }
    }

    fn parse_canonical(text: &str) -> Result<Self> {
        const EXPECTED: &str = "36-char dashed UUID";
        let b = text.as_bytes();
        if b.len() != Self::CANONICAL_LEN {
            return Err(Error::Validation {
                expected: EXPECTED,
                found: text.to_string(),
            });
        }
        // Dash positions are fixed; everything else must be hex.
        for &i in &[8usize, 13, 18, 23] {
            if b[i] != b'-' {
                return Err(Error::Validation {
                    expected: EXPECTED,
                    found: text.to_string(),
                });
            }
        }
        let mut hex = String::with_capacity(32);
        for (i, &c) in b.iter().enumerate() {
            if !matches!(i, 8 | 13 | 18 | 23) {
                hex.push(c as char);
            }
        }
        let mut bytes = [0u8; 16];
        decode_hex(&hex, &mut bytes, EXPECTED)?;
        Ok(Self { bytes })
    }

    fn canonical(&self) -> String {
        let hex = encode_hex(&self.bytes);
        let mut out = String::with_capacity(Self::CANONICAL_LEN);
        out.push_str(&hex[0..8]);
        out.push('-');
        out.push_str(&hex[8..12]);
        out.push('-');
        out.push_str(&hex[12..16]);
        out.push('-');
        out.push_str(&hex[16..20]);
        out.push('-');
        out.push_str(&hex[20..32]);
        out
    }
}

impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

impl fmt::Debug for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Uuid")
            .field("canonical", &self.canonical())
            .field("version", &self.version())
            .field("variant", &self.variant())
            .finish()
    }
}

impl core::str::FromStr for Uuid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_canonical(s)
    }
}

impl TryFrom<&str> for Uuid {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        Self::parse_canonical(s)
    }
}

impl From<[u8; 16]> for Uuid {
    fn from(bytes: [u8; 16]) -> Self {
        Self::from_bytes(bytes)
    }
}
