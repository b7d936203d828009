use crate::{Error, Result, Snowflake, TimeSource};
use core::{cell::Cell, cmp::Ordering};

/// A 64-bit Snowflake field layout.
///
/// Fields are packed most-significant first: timestamp, machine, sequence.
/// Any high bits left over (64 minus the field sum) stay zero, which keeps
/// classic layouts clear of the signed-integer sign bit.
///
/// ```text
/// Twitter:    | 0 | timestamp (41) | machine (10) | sequence (12) |
/// Discord:    |     timestamp (42) | machine (10) | sequence (12) |
/// Instagram:  | 0 | timestamp (41) | machine (13) | sequence (10) |
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SnowflakeLayout {
    timestamp_bits: u32,
    machine_bits: u32,
    sequence_bits: u32,
}

impl SnowflakeLayout {
    /// The classic Twitter layout.
    pub const TWITTER: Self = Self::new(41, 10, 12);

    /// The Discord layout.
    pub const DISCORD: Self = Self::new(42, 10, 12);

    /// The Instagram layout (wider shard field, shorter sequence).
    pub const INSTAGRAM: Self = Self::new(41, 13, 10);

    /// Defines a layout. Each field must be non-empty and the fields must
    /// fit in 64 bits together.
    #[must_use]
    pub const fn new(timestamp_bits: u32, machine_bits: u32, sequence_bits: u32) -> Self {
        assert!(timestamp_bits > 0 && machine_bits > 0 && sequence_bits > 0);
        assert!(timestamp_bits + machine_bits + sequence_bits <= 64);
        Self {
            timestamp_bits,
            machine_bits,
            sequence_bits,
        }
    }

    const fn timestamp_shift(self) -> u32 {
        self.machine_bits + self.sequence_bits
    }

    const fn machine_shift(self) -> u32 {
        self.sequence_bits
    }

    const fn field_max(bits: u32) -> u64 {
        if bits == 64 { u64::MAX } else { (1 << bits) - 1 }
    }

    /// Largest representable timestamp, in milliseconds since the layout's
    /// epoch.
    #[must_use]
    pub const fn max_timestamp(self) -> u64 {
        Self::field_max(self.timestamp_bits)
    }

    /// Largest representable machine/shard value.
    #[must_use]
    pub const fn max_machine(self) -> u64 {
        Self::field_max(self.machine_bits)
    }

    /// Largest representable per-tick sequence value.
    #[must_use]
    pub const fn max_sequence(self) -> u64 {
        Self::field_max(self.sequence_bits)
    }

    /// Packs the three fields. Out-of-range inputs are masked.
    #[must_use]
    pub const fn pack(self, timestamp: u64, machine: u64, sequence: u64) -> Snowflake {
        let t = (timestamp & self.max_timestamp()) << self.timestamp_shift();
        let m = (machine & self.max_machine()) << self.machine_shift();
        let s = sequence & self.max_sequence();
        Snowflake::from_raw(t | m | s)
    }

    /// Extracts the timestamp field.
    #[must_use]
    pub const fn timestamp(self, id: Snowflake) -> u64 {
        (id.to_raw() >> self.timestamp_shift()) & self.max_timestamp()
    }

    /// Extracts the machine field.
    #[must_use]
    pub const fn machine(self, id: Snowflake) -> u64 {
        (id.to_raw() >> self.machine_shift()) & self.max_machine()
    }

    /// Extracts the sequence field.
    #[must_use]
    pub const fn sequence(self, id: Snowflake) -> u64 {
        id.to_raw() & self.max_sequence()
    }

    /// Right shift that recovers milliseconds from a raw value, for use
    /// with [`extract_millis`].
    ///
    /// [`extract_millis`]: crate::extract_millis
    #[must_use]
    pub const fn timestamp_right_shift(self) -> u32 {
        self.timestamp_shift()
    }
}

/// Outcome of polling a generator for the next ID.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IdGenStatus {
    /// A new ID is available.
    Ready { id: Snowflake },
    /// The sequence for the current tick is exhausted, or the clock sits
    /// behind the stored timestamp. Retry after `yield_for` milliseconds.
    Pending { yield_for: u64 },
}

/// A non-concurrent Snowflake minter over a configurable layout.
///
/// Lightweight and fast, but **not thread-safe**: state lives in a
/// [`Cell`] and calls must be serialized through one instance.
///
/// # Example
///
/// ```
/// use chronoid::{SnowflakeGenerator, SnowflakeLayout, SystemClock, TWITTER_EPOCH};
///
/// let generator = SnowflakeGenerator::new(
///     SnowflakeLayout::TWITTER,
///     7,
///     SystemClock::with_epoch(TWITTER_EPOCH),
/// )
/// .unwrap();
///
/// let id = generator.next_id(|_| std::thread::yield_now());
/// assert_eq!(SnowflakeLayout::TWITTER.machine(id), 7);
/// ```
pub struct SnowflakeGenerator<T> {
    layout: SnowflakeLayout,
    machine_id: u64,
    state: Cell<(u64, u64)>,
    time: T,
}

impl<T: TimeSource<u64>> SnowflakeGenerator<T> {
    /// Creates a generator for `layout`, minting on behalf of `machine_id`.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] if `machine_id` does not fit the layout's
    /// machine field.
    pub fn new(layout: SnowflakeLayout, machine_id: u64, time: T) -> Result<Self> {
        if machine_id > layout.max_machine() {
            return Err(Error::Validation {
                expected: "machine id within the layout's machine field",
                found: machine_id.to_string(),
            });
        }
        Ok(Self {
            layout,
            machine_id,
            state: Cell::new((0, 0)),
            time,
        })
    }

    /// Generates a new ID, invoking `f` with the suggested backoff (in
    /// milliseconds) whenever the generator is pending.
    pub fn next_id(&self, mut f: impl FnMut(u64)) -> Snowflake {
        loop {
            match self.poll_id() {
                IdGenStatus::Ready { id } => break id,
                IdGenStatus::Pending { yield_for } => f(yield_for),
            }
        }
    }

    /// A one-shot mint that refuses to wait.
    ///
    /// # Errors
    ///
    /// [`Error::Overflow`] when the sequence for the current millisecond is
    /// exhausted or the clock sits behind the stored timestamp.
    pub fn try_id_now(&self) -> Result<Snowflake> {
        match self.poll_id() {
            IdGenStatus::Ready { id } => Ok(id),
            IdGenStatus::Pending { .. } => Err(Error::Overflow),
        }
    }

    /// Attempts to generate the next available ID without waiting.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "trace", skip(self)))]
    pub fn poll_id(&self) -> IdGenStatus {
        let now = self.time.current_millis();
        let (timestamp, sequence) = self.state.get();

        match now.cmp(&timestamp) {
            Ordering::Equal => {
                if sequence < self.layout.max_sequence() {
                    self.state.set((timestamp, sequence + 1));
                    IdGenStatus::Ready {
                        id: self.layout.pack(timestamp, self.machine_id, sequence + 1),
                    }
                } else {
                    IdGenStatus::Pending { yield_for: 1 }
                }
            }
            Ordering::Greater => {
                self.state.set((now, 0));
                IdGenStatus::Ready {
                    id: self.layout.pack(now, self.machine_id, 0),
                }
            }
            Ordering::Less => Self::cold_clock_behind(now, timestamp),
        }
    }

    #[cold]
    #[inline(never)]
    fn cold_clock_behind(now: u64, timestamp: u64) -> IdGenStatus {
        IdGenStatus::Pending {
            yield_for: timestamp - now,
        }
    }
}
