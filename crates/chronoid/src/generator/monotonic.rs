use crate::{EntropySource, Result, TimeSource};
use sha2::{Digest, Sha256};

/// Usable bits of the top counter word; the six bits above are guard bits
/// that absorb increments before a forced reseed.
const GUARD_MASK: u16 = 0x03FF;

/// 24-bit increment steps sliced from a 32-byte digest.
const STEP_BYTES: usize = 3;
const STEPS_PER_DIGEST: usize = 10;

/// Width of the monotonic portion: 6 timestamp bytes and 10 counter bytes.
const MONOTONIC_LEN: usize = 16;

/// Mints strictly increasing byte strings: a 48-bit big-endian millisecond
/// prefix followed by an 80-bit counter.
///
/// ```text
///  Byte Index:  0              5 6              15
///               +----------------+----------------+
///  Field:       | timestamp (48) |  counter (80)  |
///               +----------------+----------------+
/// ```
///
/// When the timestamp advances the counter is redrawn from the entropy
/// source with the top word masked to its 10 usable bits. Within the same
/// millisecond the counter advances by a pseudorandom 24-bit step instead,
/// so call N+1 compares strictly greater than call N without touching the
/// CSPRNG. Steps come from repeatedly hashing a 64-byte seed buffer and
/// slicing the digest into 24-bit chunks.
///
/// Overflow into the guard bits forces a reseed one millisecond ahead of
/// the stored timestamp; the counter never silently wraps.
///
/// Ordering holds only for calls serialized through one instance. For a
/// shared handle, see [`LockMonotonicRandom`].
///
/// [`LockMonotonicRandom`]: crate::LockMonotonicRandom
#[derive(Debug)]
pub struct MonotonicRandom<R> {
    entropy: R,
    last_millis: u64,
    counter: [u16; 5],
    seed: [u8; 64],
    stream: [u8; 32],
    remaining: usize,
    seeded: bool,
}

impl<R: EntropySource> MonotonicRandom<R> {
    /// Creates a generator over the given entropy source. No entropy is
    /// drawn until the first mint.
    #[must_use]
    pub fn new(entropy: R) -> Self {
        Self {
            entropy,
            last_millis: 0,
            counter: [0; 5],
            seed: [0; 64],
            stream: [0; 32],
            remaining: 0,
            seeded: false,
        }
    }

    /// Mints the next value, reading the timestamp from `clock`.
    ///
    /// `len` is the output width in bytes. At 16, the full monotonic form is
    /// returned. Above 16, the extra tail bytes are fresh entropy and carry
    /// no ordering. Below 16, the output is the leading `len` bytes and the
    /// ordering guarantee is void.
    ///
    /// # Errors
    ///
    /// Only entropy failure: [`Error::RandomUnavailable`].
    ///
    /// [`Error::RandomUnavailable`]: crate::Error::RandomUnavailable
    pub fn next_with<T: TimeSource<u64>>(&mut self, clock: &T, len: usize) -> Result<Vec<u8>> {
        let millis = clock.current_millis();
        self.mint(millis, false, len)
    }

    /// Mints the next value for an explicit timestamp.
    ///
    /// Any timestamp that differs from the stored one, forward *or*
    /// backward, redraws the counter; only a repeated timestamp takes the
    /// increment path.
    ///
    /// # Errors
    ///
    /// Only entropy failure: [`Error::RandomUnavailable`].
    ///
    /// [`Error::RandomUnavailable`]: crate::Error::RandomUnavailable
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "trace", skip(self)))]
    pub fn next_at(&mut self, millis: u64, len: usize) -> Result<Vec<u8>> {
        self.mint(millis, true, len)
    }

    fn mint(&mut self, millis: u64, explicit: bool, len: usize) -> Result<Vec<u8>> {
        let fresh = !self.seeded
            || (explicit && millis != self.last_millis)
            || (!explicit && millis > self.last_millis);

        let effective = if fresh {
            self.reseed(millis)?;
            millis
        } else if self.advance() {
            self.last_millis
        } else {
            // Guard bits exhausted within this millisecond: behave as if
            // the clock had already ticked once.
            let bumped = self.last_millis + 1;
            self.reseed(bumped)?;
            bumped
        };

        let mut out = Vec::with_capacity(len.max(MONOTONIC_LEN));
        out.extend_from_slice(&effective.to_be_bytes()[2..8]);
        for word in self.counter {
            out.extend_from_slice(&word.to_be_bytes());
        }
        if len > MONOTONIC_LEN {
            let start = out.len();
            out.resize(len, 0);
            self.entropy.fill(&mut out[start..])?;
        } else {
            out.truncate(len);
        }
        Ok(out)
    }

    /// Redraws the counter and records `millis` as the current tick. The
    /// seed buffer for the increment stream is drawn once, on first use.
    fn reseed(&mut self, millis: u64) -> Result<()> {
        if !self.seeded {
            self.entropy.fill(&mut self.seed)?;
            self.stream = Sha256::digest(self.seed).into();
            self.remaining = STEPS_PER_DIGEST;
            self.seeded = true;
        }
        let mut raw = [0u8; 10];
        self.entropy.fill(&mut raw)?;
        for (word, pair) in self.counter.iter_mut().zip(raw.chunks_exact(2)) {
            *word = u16::from_be_bytes([pair[0], pair[1]]);
        }
        self.counter[0] &= GUARD_MASK;
        self.last_millis = millis;
        Ok(())
    }

    /// Adds the next 24-bit pseudorandom step to the 80-bit counter.
    /// Returns `false` when the sum escapes into the guard bits.
    fn advance(&mut self) -> bool {
        let mut carry = self.next_step();
        for word in self.counter.iter_mut().rev() {
            if carry == 0 {
                break;
            }
            let sum = u32::from(*word) + (carry & 0xFFFF);
            *word = sum as u16;
            carry = (carry >> 16) + (sum >> 16);
        }
        carry == 0 && self.counter[0] & !GUARD_MASK == 0
    }

    /// The increment stream: slices of the running digest, re-hashed once a
    /// batch is consumed. Never zero, so every call moves the counter.
    fn next_step(&mut self) -> u32 {
        if self.remaining == 0 {
            self.stream = Sha256::digest(self.stream).into();
            self.remaining = STEPS_PER_DIGEST;
        }
        let at = (STEPS_PER_DIGEST - self.remaining) * STEP_BYTES;
        self.remaining -= 1;
        let step = u32::from(self.stream[at]) << 16
            | u32::from(self.stream[at + 1]) << 8
            | u32::from(self.stream[at + 2]);
        step.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::entropy::testing::{BrokenEntropy, FixedEntropy};
    use crate::{ThreadRandom, TimeSource};

    struct FrozenClock(u64);
    impl TimeSource<u64> for FrozenClock {
        fn current_millis(&self) -> u64 {
            self.0
        }
    }

    #[test]
    fn frozen_clock_shares_prefix_and_strictly_increases() {
        let clock = FrozenClock(1_664_214_822_123);
        let mut generator = MonotonicRandom::new(FixedEntropy::new(&[0xAB, 0x12, 0x7F]));

        let first = generator.next_with(&clock, 16).unwrap();
        let second = generator.next_with(&clock, 16).unwrap();

        assert_eq!(first[..6], [0x01, 0x83, 0x7A, 0xEE, 0xEC, 0xEB]);
        assert_eq!(first[..6], second[..6]);
        assert!(second > first);
    }

    #[test]
    fn outputs_strictly_increase_across_many_calls() {
        let clock = FrozenClock(1_000);
        let mut generator = MonotonicRandom::new(ThreadRandom);
        let mut previous = generator.next_with(&clock, 16).unwrap();
        for _ in 0..10_000 {
            let next = generator.next_with(&clock, 16).unwrap();
            assert!(next > previous);
            previous = next;
        }
    }

    #[test]
    fn advancing_clock_moves_the_prefix() {
        let mut generator = MonotonicRandom::new(ThreadRandom);
        let early = generator.next_with(&FrozenClock(5_000), 16).unwrap();
        let late = generator.next_with(&FrozenClock(5_001), 16).unwrap();
        assert!(late[..6] > early[..6]);
        assert!(late > early);
    }

    #[test]
    fn explicit_timestamp_change_redraws_either_direction() {
        let mut generator = MonotonicRandom::new(FixedEntropy::new(&[0x5C, 0xE3]));
        let at_ten = generator.next_at(10, 16).unwrap();
        let back_at_five = generator.next_at(5, 16).unwrap();
        assert_eq!(back_at_five[..6], 5u64.to_be_bytes()[2..8]);
        assert!(back_at_five[..6] < at_ten[..6]);
    }

    #[test]
    fn clock_regression_without_explicit_timestamp_keeps_order() {
        let mut generator = MonotonicRandom::new(ThreadRandom);
        let first = generator.next_with(&FrozenClock(9_000), 16).unwrap();
        // Clock moved backward: the stored tick and increment path hold.
        let second = generator.next_with(&FrozenClock(8_000), 16).unwrap();
        assert_eq!(second[..6], first[..6]);
        assert!(second > first);
    }

    #[test]
    fn guard_overflow_borrows_the_next_millisecond() {
        // All-ones entropy saturates the counter at 03FF FFFF…; the next
        // increment must escape into the guard bits and force a reseed one
        // tick ahead.
        let mut generator = MonotonicRandom::new(FixedEntropy::new(&[0xFF]));
        let saturated = generator.next_at(100, 16).unwrap();
        assert_eq!(saturated[6..8], [0x03, 0xFF]);

        let bumped = generator.next_at(100, 16).unwrap();
        assert_eq!(bumped[..6], 101u64.to_be_bytes()[2..8]);
        assert!(bumped > saturated);
    }

    #[test]
    fn short_and_wide_outputs() {
        let mut generator = MonotonicRandom::new(ThreadRandom);
        let full = generator.next_at(42, 16).unwrap();
        assert_eq!(full.len(), 16);

        let short = generator.next_at(42, 10).unwrap();
        assert_eq!(short.len(), 10);
        assert_eq!(short[..6], 42u64.to_be_bytes()[2..8]);

        let wide = generator.next_at(42, 24).unwrap();
        assert_eq!(wide.len(), 24);
        assert_eq!(wide[..6], 42u64.to_be_bytes()[2..8]);
    }

    #[test]
    fn entropy_failure_is_surfaced() {
        let mut generator = MonotonicRandom::new(BrokenEntropy);
        assert!(matches!(
            generator.next_at(1, 16),
            Err(Error::RandomUnavailable(_))
        ));
    }
}
