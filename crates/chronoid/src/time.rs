use crate::{Error, Result};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Twitter epoch: Thursday, November 4, 2010 1:42:54.657 UTC
pub const TWITTER_EPOCH: Duration = Duration::from_millis(1_288_834_974_657);

/// Discord epoch: Thursday, January 1, 2015 00:00:00 UTC
pub const DISCORD_EPOCH: Duration = Duration::from_millis(1_420_070_400_000);

/// Instagram epoch: Saturday, January 1, 2011 00:00:00 UTC
pub const INSTAGRAM_EPOCH: Duration = Duration::from_millis(1_293_840_000_000);

/// Count of 100-nanosecond intervals between the Gregorian reform
/// (1582-10-15) and the Unix epoch. UUID versions 1 and 6 anchor their
/// 60-bit timestamps here.
pub const GREGORIAN_OFFSET_100NS: u64 = 0x01B2_1DD2_1381_4000;

/// A trait for time sources that return the current timestamp.
///
/// This abstraction allows you to plug in a real wall clock or a mocked
/// time source in tests.
///
/// The timestamp type `T` is generic (typically `u64` or `u128`), and the
/// unit is **milliseconds** relative to a configurable origin.
///
/// # Example
///
/// ```
/// use chronoid::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource<u64> for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1234
///     }
/// }
///
/// let time = FixedTime;
/// assert_eq!(time.current_millis(), 1234);
/// ```
pub trait TimeSource<T> {
    /// Returns the current time in milliseconds since the configured epoch.
    fn current_millis(&self) -> T;
}

impl<T, S: TimeSource<T> + ?Sized> TimeSource<T> for &S {
    fn current_millis(&self) -> T {
        (**self).current_millis()
    }
}

/// A wall-clock time source reporting milliseconds since a configurable
/// epoch.
///
/// Backward clock movement is *not* compensated here; the monotonic byte
/// generator and the clock-sequence engine own that concern, so this type
/// stays a plain `now()` collaborator.
#[derive(Clone, Debug)]
pub struct SystemClock {
    epoch: Duration,
}

impl Default for SystemClock {
    /// A clock anchored at the Unix epoch.
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    /// A clock anchored at the Unix epoch.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            epoch: Duration::ZERO,
        }
    }

    /// A clock whose zero point sits `epoch` after the Unix epoch, e.g.
    /// [`TWITTER_EPOCH`] for classic Snowflake layouts.
    ///
    /// # Panics
    ///
    /// `current_millis` panics if the system clock reads earlier than the
    /// configured epoch.
    #[must_use]
    pub const fn with_epoch(epoch: Duration) -> Self {
        Self { epoch }
    }
}

impl TimeSource<u64> for SystemClock {
    fn current_millis(&self) -> u64 {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before UNIX_EPOCH")
            .checked_sub(self.epoch)
            .expect("system clock before configured epoch");
        since_epoch.as_millis() as u64
    }
}

impl TimeSource<u128> for SystemClock {
    fn current_millis(&self) -> u128 {
        u128::from(<Self as TimeSource<u64>>::current_millis(self))
    }
}

/// Encodes a millisecond timestamp as a big-endian bit string of
/// `bit_width` bits, returned as `ceil(bit_width / 8)` bytes with the
/// unused high bits zero.
///
/// Typical widths: 48 for the ULID/UUIDv7 class, 41–42 for Snowflake
/// layouts.
///
/// # Errors
///
/// Returns [`Error::Range`] if `millis` does not fit in `bit_width` bits,
/// or if `bit_width` is zero or above 64.
///
/// # Example
///
/// ```
/// use chronoid::embed_millis;
///
/// // 2022-09-26T17:53:42.123Z
/// let bytes = embed_millis(1_664_214_822_123, 48).unwrap();
/// assert_eq!(bytes, [0x01, 0x83, 0x7a, 0xee, 0xec, 0xeb]);
/// ```
pub fn embed_millis(millis: u64, bit_width: u32) -> Result<Vec<u8>> {
    if bit_width == 0 || bit_width > 64 {
        return Err(Error::Range {
            millis: u128::from(millis),
            context: "a bit width in 1..=64",
        });
    }
    if bit_width < 64 && millis >= (1 << bit_width) {
        return Err(Error::Range {
            millis: u128::from(millis),
            context: "the requested timestamp field",
        });
    }
    let byte_len = bit_width.div_ceil(8) as usize;
    let be = millis.to_be_bytes();
    Ok(be[8 - byte_len..].to_vec())
}

/// Recovers a millisecond Unix timestamp from a raw identifier value.
///
/// Computes `(raw >> right_shift) + epoch_offset_ms` in 128-bit
/// arithmetic; Snowflake-class values may occupy the full unsigned 64-bit
/// range, so the sum is only narrowed at the boundary.
///
/// # Errors
///
/// Returns [`Error::Range`] if the resulting timestamp exceeds the `u64`
/// millisecond domain of [`SystemTime`] construction.
///
/// # Example
///
/// ```
/// use chronoid::extract_millis;
///
/// let ms = extract_millis(1_541_815_603_606_036_480, 1_288_834_974_657, 22).unwrap();
/// assert_eq!(ms, 1_656_432_460_105); // 2022-06-28T16:07:40.105Z
/// ```
pub fn extract_millis(raw: u128, epoch_offset_ms: u64, right_shift: u32) -> Result<u64> {
    let shifted = raw >> right_shift;
    let millis = shifted + u128::from(epoch_offset_ms);
    u64::try_from(millis).map_err(|_| Error::Range {
        millis,
        context: "a 64-bit millisecond timestamp",
    })
}

/// Like [`extract_millis`], but returns the timestamp as a [`SystemTime`].
pub fn extract_datetime(raw: u128, epoch_offset_ms: u64, right_shift: u32) -> Result<SystemTime> {
    let millis = extract_millis(raw, epoch_offset_ms, right_shift)?;
    Ok(UNIX_EPOCH + Duration::from_millis(millis))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embed_known_timestamp_into_48_bits() {
        // 2022-09-26T17:53:42.123456Z truncated to milliseconds.
        let bytes = embed_millis(1_664_214_822_123, 48).unwrap();
        assert_eq!(bytes, [0x01, 0x83, 0x7A, 0xEE, 0xEC, 0xEB]);
    }

    #[test]
    fn embed_extract_roundtrip() {
        for (ms, width) in [
            (0u64, 48u32),
            (1, 41),
            (1_664_214_822_123, 48),
            ((1 << 41) - 1, 41),
            ((1 << 42) - 1, 42),
            (u64::MAX, 64),
        ] {
            let bytes = embed_millis(ms, width).unwrap();
            let mut raw = 0u128;
            for b in bytes {
                raw = (raw << 8) | u128::from(b);
            }
            assert_eq!(extract_millis(raw, 0, 0).unwrap(), ms, "{ms} @ {width}");
        }
    }

    #[test]
    fn embed_rejects_value_exceeding_field() {
        assert!(matches!(
            embed_millis(1 << 41, 41),
            Err(Error::Range { .. })
        ));
        assert!(matches!(embed_millis(1, 0), Err(Error::Range { .. })));
        assert!(matches!(embed_millis(1, 65), Err(Error::Range { .. })));
    }

    #[test]
    fn snowflake_timestamp_resolves_against_twitter_epoch() {
        let ms = extract_millis(
            1_541_815_603_606_036_480,
            TWITTER_EPOCH.as_millis() as u64,
            22,
        )
        .unwrap();
        assert_eq!(ms, 1_656_432_460_105);

        let when = extract_datetime(
            1_541_815_603_606_036_480,
            TWITTER_EPOCH.as_millis() as u64,
            22,
        )
        .unwrap();
        assert_eq!(
            when.duration_since(UNIX_EPOCH).unwrap(),
            Duration::from_millis(1_656_432_460_105)
        );
    }

    #[test]
    fn extract_at_the_boundary_of_native_range() {
        // A full-width unsigned value with no shift lands exactly at
        // u64::MAX and still converts.
        assert_eq!(
            extract_millis(u128::from(u64::MAX), 0, 0).unwrap(),
            u64::MAX
        );
        // One more millisecond of offset pushes it out of the domain.
        assert!(matches!(
            extract_millis(u128::from(u64::MAX), 1, 0),
            Err(Error::Range { .. })
        ));
    }

    #[test]
    fn system_clock_reports_against_custom_epoch() {
        let unix: u64 = SystemClock::new().current_millis();
        let twitter: u64 = SystemClock::with_epoch(TWITTER_EPOCH).current_millis();
        let offset = TWITTER_EPOCH.as_millis() as u64;
        // Both reads happen within a comfortably small window.
        assert!(unix - (twitter + offset) < 1_000);
    }
}
