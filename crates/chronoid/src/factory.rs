//! Minting entry points wiring the clock, entropy, codec, and sequence
//! engine together into finished identifiers.

use crate::{
    ClockSequence, EntropySource, Error, GREGORIAN_OFFSET_100NS, MemoryStore, MonotonicRandom,
    NodeSource, OsEntropy, RandSource, RandomNode, Result, SequencePolicy, StateStore,
    SystemClock, TimeSource, Ulid, Uuid, Variant, Version, apply_version_variant,
};

const TICKS_PER_MILLI: u64 = 10_000;
const MAX_GREGORIAN_TICKS: u64 = (1 << 60) - 1;

/// Converts Unix milliseconds to the 60-bit Gregorian 100-ns tick count
/// used by UUID versions 1 and 6.
fn gregorian_ticks(millis: u64) -> Result<u64> {
    let ticks = u128::from(millis) * u128::from(TICKS_PER_MILLI)
        + u128::from(GREGORIAN_OFFSET_100NS);
    if ticks > u128::from(MAX_GREGORIAN_TICKS) {
        return Err(Error::Range {
            millis: u128::from(millis),
            context: "the 60-bit Gregorian tick field",
        });
    }
    Ok(ticks as u64)
}

/// Mints a version 4 (random) UUID.
///
/// # Errors
///
/// Only entropy failure: [`Error::RandomUnavailable`].
pub fn new_v4<R: EntropySource>(entropy: &mut R) -> Result<Uuid> {
    let mut bytes = [0u8; 16];
    entropy.fill(&mut bytes)?;
    Ok(Uuid::from_bytes(apply_version_variant(
        bytes,
        Some(Version::V4),
        Variant::Rfc,
    )))
}

/// Mints a version 7 (Unix-epoch time-ordered) UUID.
///
/// The 48-bit millisecond prefix and the random tail come from the
/// monotonic generator, so v7 UUIDs minted through one generator instance
/// sort strictly by mint order even within a single millisecond.
///
/// # Errors
///
/// Only entropy failure: [`Error::RandomUnavailable`].
pub fn new_v7<R, T>(generator: &mut MonotonicRandom<R>, clock: &T) -> Result<Uuid>
where
    R: EntropySource,
    T: TimeSource<u64>,
{
    let raw = generator.next_with(clock, 16)?;
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&raw);
    Ok(Uuid::from_bytes(apply_version_variant(
        bytes,
        Some(Version::V7),
        Variant::Rfc,
    )))
}

/// Mints a ULID from the monotonic generator.
///
/// # Errors
///
/// Only entropy failure: [`Error::RandomUnavailable`].
pub fn new_ulid<R, T>(generator: &mut MonotonicRandom<R>, clock: &T) -> Result<Ulid>
where
    R: EntropySource,
    T: TimeSource<u64>,
{
    let raw = generator.next_with(clock, 16)?;
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&raw);
    Ok(Ulid::from_bytes(bytes))
}

/// Mints a version 1 (Gregorian time and node) UUID.
///
/// ```text
///  Byte:   0        3 4     5 6      7 8      9 10       15
///          +----------+-------+--------+--------+----------+
///  Field:  | time_low | t_mid | V+t_hi | N+cseq |   node   |
///          +----------+-------+--------+--------+----------+
/// ```
///
/// # Errors
///
/// [`Error::Range`] if the clock exceeds the 60-bit tick field, plus
/// whatever the sequence engine or node provider surfaces.
pub fn new_v1<T, S, R, N>(
    clock: &T,
    sequence: &mut ClockSequence<S, R>,
    node_source: &mut N,
) -> Result<Uuid>
where
    T: TimeSource<u64>,
    S: StateStore,
    R: RandSource<u64>,
    N: NodeSource,
{
    let millis = clock.current_millis();
    let ticks = gregorian_ticks(millis)?;
    let node = node_source.node_id()?;
    let clock_seq = sequence.next(node, millis)? as u16;

    let mut bytes = [0u8; 16];
    bytes[0..4].copy_from_slice(&((ticks & 0xFFFF_FFFF) as u32).to_be_bytes());
    bytes[4..6].copy_from_slice(&(((ticks >> 32) & 0xFFFF) as u16).to_be_bytes());
    bytes[6..8].copy_from_slice(&(((ticks >> 48) & 0x0FFF) as u16).to_be_bytes());
    bytes[8..10].copy_from_slice(&(clock_seq & 0x3FFF).to_be_bytes());
    bytes[10..16].copy_from_slice(&node.octets());
    Ok(Uuid::from_bytes(apply_version_variant(
        bytes,
        Some(Version::V1),
        Variant::Rfc,
    )))
}

/// Mints a version 6 (reordered Gregorian, sortable) UUID.
///
/// Same fields as version 1, with the timestamp laid out most-significant
/// first so byte order matches time order.
///
/// # Errors
///
/// As for [`new_v1`].
pub fn new_v6<T, S, R, N>(
    clock: &T,
    sequence: &mut ClockSequence<S, R>,
    node_source: &mut N,
) -> Result<Uuid>
where
    T: TimeSource<u64>,
    S: StateStore,
    R: RandSource<u64>,
    N: NodeSource,
{
    let millis = clock.current_millis();
    let ticks = gregorian_ticks(millis)?;
    let node = node_source.node_id()?;
    let clock_seq = sequence.next(node, millis)? as u16;

    let mut bytes = [0u8; 16];
    bytes[0..4].copy_from_slice(&((ticks >> 28) as u32).to_be_bytes());
    bytes[4..6].copy_from_slice(&(((ticks >> 12) & 0xFFFF) as u16).to_be_bytes());
    bytes[6..8].copy_from_slice(&((ticks & 0x0FFF) as u16).to_be_bytes());
    bytes[8..10].copy_from_slice(&(clock_seq & 0x3FFF).to_be_bytes());
    bytes[10..16].copy_from_slice(&node.octets());
    Ok(Uuid::from_bytes(apply_version_variant(
        bytes,
        Some(Version::V6),
        Variant::Rfc,
    )))
}

/// A ready-made assembly of the default collaborators: the system clock,
/// OS entropy, an in-memory state store, and a random node token.
///
/// Not thread-safe; wrap in [`LockMonotonicRandom`]-style handles or a
/// mutex of your own for shared use.
///
/// [`LockMonotonicRandom`]: crate::LockMonotonicRandom
pub struct IdFactory {
    clock: SystemClock,
    entropy: OsEntropy,
    monotonic: MonotonicRandom<OsEntropy>,
    sequence: ClockSequence<MemoryStore>,
    node: RandomNode,
}

impl Default for IdFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl IdFactory {
    #[must_use]
    pub fn new() -> Self {
        Self {
            clock: SystemClock::new(),
            entropy: OsEntropy,
            monotonic: MonotonicRandom::new(OsEntropy),
            sequence: ClockSequence::new(MemoryStore::new(), SequencePolicy::Rfc),
            node: RandomNode::default(),
        }
    }

    /// Mints a v4 UUID. See [`new_v4`].
    pub fn uuid_v4(&mut self) -> Result<Uuid> {
        new_v4(&mut self.entropy)
    }

    /// Mints a v7 UUID. See [`new_v7`].
    pub fn uuid_v7(&mut self) -> Result<Uuid> {
        new_v7(&mut self.monotonic, &self.clock)
    }

    /// Mints a v1 UUID. See [`new_v1`].
    pub fn uuid_v1(&mut self) -> Result<Uuid> {
        new_v1(&self.clock, &mut self.sequence, &mut self.node)
    }

    /// Mints a v6 UUID. See [`new_v6`].
    pub fn uuid_v6(&mut self) -> Result<Uuid> {
        new_v6(&self.clock, &mut self.sequence, &mut self.node)
    }

    /// Mints a ULID. See [`new_ulid`].
    pub fn ulid(&mut self) -> Result<Ulid> {
        new_ulid(&mut self.monotonic, &self.clock)
    }
}
