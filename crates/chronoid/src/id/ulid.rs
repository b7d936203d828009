use crate::{Error, Identifier, Result};
use core::fmt;

/// Crockford base32 alphabet: `I`, `L`, `O`, and `U` are excluded.
const ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";
const NO_VALUE: u8 = 255;

/// Decode table. Lowercase letters map like their uppercase forms, and the
/// Crockford aliases are remapped before validation: `I`, `L` → 1, `O` → 0.
/// `U` stays invalid.
const LOOKUP: [u8; 256] = {
    let mut lut = [NO_VALUE; 256];
    let mut i = 0_u8;
    while i < 32 {
        let c = ALPHABET[i as usize];
        lut[c as usize] = i;
        if c.is_ascii_uppercase() {
            lut[(c + 32) as usize] = i;
        }
        i += 1;
    }
    lut[b'O' as usize] = 0;
    lut[b'o' as usize] = 0;
    lut[b'I' as usize] = 1;
    lut[b'i' as usize] = 1;
    lut[b'L' as usize] = 1;
    lut[b'l' as usize] = 1;
    lut
};

/// A 128-bit lexicographically sortable identifier.
///
/// - 48 bits timestamp (ms since the Unix epoch)
/// - 80 bits random
///
/// ```text
///  Bit Index:  127            80 79           0
///              +----------------+-------------+
///  Field:      | timestamp (48) | random (80) |
///              +----------------+-------------+
///              |<-- MSB -- 128 bits -- LSB -->|
/// ```
///
/// The canonical text form is 26 characters of Crockford base32, uppercase
/// on output. 26 characters carry 130 bits of capacity for a 128-bit value,
/// so the first character must be `0`–`7`; anything larger is rejected
/// rather than silently truncated.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Ulid {
    id: u128,
}

impl Ulid {
    pub const TIMESTAMP_BITS: u32 = 48;
    pub const RANDOM_BITS: u32 = 80;

    pub const RANDOM_SHIFT: u32 = 0;
    pub const TIMESTAMP_SHIFT: u32 = Self::RANDOM_BITS;

    pub const TIMESTAMP_MASK: u128 = (1 << Self::TIMESTAMP_BITS) - 1;
    pub const RANDOM_MASK: u128 = (1 << Self::RANDOM_BITS) - 1;

    /// Canonical text length.
    pub const CANONICAL_LEN: usize = 26;

    /// The Nil sentinel: all bits zero.
    pub const NIL: Self = Self { id: 0 };

    /// The Max sentinel: all bits one.
    pub const MAX: Self = Self { id: u128::MAX };

    /// Packs a timestamp and a random value into a ULID. Out-of-range
    /// inputs are masked to their fields.
    #[must_use]
    pub const fn from_parts(timestamp: u128, random: u128) -> Self {
        let t = (timestamp & Self::TIMESTAMP_MASK) << Self::TIMESTAMP_SHIFT;
        let r = (random & Self::RANDOM_MASK) << Self::RANDOM_SHIFT;
        Self { id: t | r }
    }

    /// Wraps 16 big-endian bytes (48-bit time ∥ 80-bit random).
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self {
            id: u128::from_be_bytes(bytes),
        }
    }

    /// Returns the big-endian byte form.
    #[must_use]
    pub const fn to_bytes(&self) -> [u8; 16] {
        self.id.to_be_bytes()
    }

    /// Extracts the millisecond timestamp field.
    #[must_use]
    pub const fn timestamp(&self) -> u64 {
        ((self.id >> Self::TIMESTAMP_SHIFT) & Self::TIMESTAMP_MASK) as u64
    }

    /// Extracts the random field.
    #[must_use]
    pub const fn random(&self) -> u128 {
        (self.id >> Self::RANDOM_SHIFT) & Self::RANDOM_MASK
    }

    /// Converts this type into its raw integer representation.
    #[must_use]
    pub const fn to_raw(&self) -> u128 {
        self.id
    }

    /// Converts a raw integer into this type.
    #[must_use]
    pub const fn from_raw(raw: u128) -> Self {
        Self { id: raw }
    }
}

impl Identifier for Ulid {
    const BITS: u32 = 128;
    const EXPECTED_BYTES: &'static str = "16 ULID bytes";
    const EXPECTED_HEX: &'static str = "32 hex chars";
    const EXPECTED_NUMERIC: &'static str = "integer in [0, 2^128)";

    fn to_u128(&self) -> u128 {
        self.id
    }

    fn from_raw_u128(raw: u128) -> Self {
        Self { id: raw }
    }

    fn parse_canonical(text: &str) -> Result<Self> {
        const EXPECTED: &str = "26-char Crockford base32 ULID";
        let bytes = text.as_bytes();
        if bytes.len() != Self::CANONICAL_LEN {
            return Err(Error::Validation {
                expected: EXPECTED,
                found: text.to_string(),
            });
        }
        let mut acc = 0u128;
        for (i, &b) in bytes.iter().enumerate() {
            let val = LOOKUP[b as usize];
            if val == NO_VALUE {
                return Err(Error::Validation {
                    expected: EXPECTED,
                    found: text.to_string(),
                });
            }
            // The leading character carries bits 128 and 129, which a
            // 128-bit value cannot hold; it must decode to 0..=7.
            if i == 0 && val > 7 {
                return Err(Error::Validation {
                    expected: "ULID starting with 0-7",
                    found: text.to_string(),
                });
            }
            acc = (acc << 5) | u128::from(val);
        }
        Ok(Self { id: acc })
    }

    fn canonical(&self) -> String {
        let mut out = String::with_capacity(Self::CANONICAL_LEN);
        for i in 0..Self::CANONICAL_LEN {
            let shift = 125 - 5 * i;
            let index = ((self.id >> shift) & 0x1F) as usize;
            out.push(ALPHABET[index] as char);
        }
        out
    }
}

impl fmt::Display for Ulid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

impl fmt::Debug for Ulid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ulid")
            .field("id", &format_args!("{} (0x{:x})", self.id, self.id))
            .field("timestamp", &self.timestamp())
            .field("random", &format_args!("0x{:x}", self.random()))
            .finish()
    }
}

impl core::str::FromStr for Ulid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_canonical(s)
    }
}

impl TryFrom<&str> for Ulid {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        Self::parse_canonical(s)
    }
}
