//! Version and variant bit fields on the 16-byte RFC layout.
//!
//! The version nibble lives in the high half of byte 6; the variant marker
//! occupies one to three of the high bits of byte 8, depending on the
//! family. [`apply_version_variant`] writes exactly those bits and leaves
//! every other bit of the input untouched; [`version_of`] and
//! [`variant_of`] are its pure inverses.

/// The eight defined version values of the RFC variant.
///
/// The nibble only carries meaning when [`variant_of`] reports
/// [`Variant::Rfc`]; each value implies a distinct generation algorithm.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Version {
    /// Gregorian time and node.
    V1 = 1,
    /// DCE Security, with embedded POSIX UIDs.
    V2 = 2,
    /// Name-based, MD5.
    V3 = 3,
    /// Random.
    V4 = 4,
    /// Name-based, SHA-1.
    V5 = 5,
    /// Reordered Gregorian time, sortable.
    V6 = 6,
    /// Unix-epoch time, sortable.
    V7 = 7,
    /// Custom / experimental.
    V8 = 8,
}

impl Version {
    /// All eight defined versions, in order.
    pub const ALL: [Self; 8] = [
        Self::V1,
        Self::V2,
        Self::V3,
        Self::V4,
        Self::V5,
        Self::V6,
        Self::V7,
        Self::V8,
    ];

    /// Maps a nibble to a defined version, or `None` for 0 and 9–15.
    #[must_use]
    pub const fn from_nibble(nibble: u8) -> Option<Self> {
        match nibble {
            1 => Some(Self::V1),
            2 => Some(Self::V2),
            3 => Some(Self::V3),
            4 => Some(Self::V4),
            5 => Some(Self::V5),
            6 => Some(Self::V6),
            7 => Some(Self::V7),
            8 => Some(Self::V8),
            _ => None,
        }
    }

    /// The 4-bit discriminant value.
    #[must_use]
    pub const fn as_nibble(self) -> u8 {
        self as u8
    }
}

/// The variant families partitioning the 128-bit layout space.
///
/// The family is encoded in the high bits of byte 8 and determines how many
/// of those bits the marker consumes:
///
/// ```text
///   0xx  Ncs        (1 bit)
///   10x  Rfc        (2 bits; the version nibble applies)
///   110  Microsoft  (3 bits)
///   111  Future     (3 bits)
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Variant {
    /// Legacy NCS layout.
    Ncs,
    /// The RFC 9562 layout.
    Rfc,
    /// Legacy Microsoft COM/DCOM layout.
    Microsoft,
    /// Reserved for future definition.
    Future,
}

impl Variant {
    /// Number of high bits of byte 8 the marker consumes.
    #[must_use]
    pub const fn marker_bits(self) -> u32 {
        match self {
            Self::Ncs => 1,
            Self::Rfc => 2,
            Self::Microsoft | Self::Future => 3,
        }
    }
}

/// Writes the version nibble and variant marker into a 16-byte value.
///
/// Only the high nibble of byte 6 (when `version` is present) and the
/// marker bits of byte 8 are overwritten; all other bits pass through
/// unchanged. Passing `None` for the version leaves byte 6 untouched,
/// which the non-RFC families require.
#[must_use]
pub const fn apply_version_variant(
    mut bytes: [u8; 16],
    version: Option<Version>,
    variant: Variant,
) -> [u8; 16] {
    if let Some(version) = version {
        bytes[6] = (bytes[6] & 0x0F) | (version.as_nibble() << 4);
    }
    bytes[8] = match variant {
        Variant::Ncs => bytes[8] & 0x7F,
        Variant::Rfc => (bytes[8] & 0x3F) | 0x80,
        Variant::Microsoft => (bytes[8] & 0x1F) | 0xC0,
        Variant::Future => (bytes[8] & 0x1F) | 0xE0,
    };
    bytes
}

/// Classifies the variant family from the high bits of byte 8.
#[must_use]
pub const fn variant_of(bytes: &[u8; 16]) -> Variant {
    let b = bytes[8];
    if b & 0x80 == 0 {
        Variant::Ncs
    } else if b & 0x40 == 0 {
        Variant::Rfc
    } else if b & 0x20 == 0 {
        Variant::Microsoft
    } else {
        Variant::Future
    }
}

/// Reads the version nibble, or `None` when the variant is not the RFC
/// family or the nibble is not one of the eight defined values.
#[must_use]
pub const fn version_of(bytes: &[u8; 16]) -> Option<Version> {
    match variant_of(bytes) {
        Variant::Rfc => Version::from_nibble(bytes[6] >> 4),
        _ => None,
    }
}
