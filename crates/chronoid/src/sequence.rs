use crate::{EntropySource, Error, RandSource, Result, ThreadRandom};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Widest clock-sequence value of the 14-bit RFC field.
pub const DEFAULT_MAX_SEQUENCE: u64 = 0x3FFF;

/// A key-value record store for persisted sequence state.
///
/// The engine requires only per-key sequential consistency as observed by a
/// single caller; records are opaque byte strings at this seam.
pub trait StateStore {
    /// Returns the record stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Stores `record` under `key`, replacing any previous record.
    fn set(&self, key: &str, record: Vec<u8>) -> Result<()>;
}

/// An in-process [`StateStore`] over a mutex-guarded map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S: StateStore + ?Sized> StateStore for &S {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, record: Vec<u8>) -> Result<()> {
        (**self).set(key, record)
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.records.lock().get(key).cloned())
    }

    fn set(&self, key: &str, record: Vec<u8>) -> Result<()> {
        self.records.lock().insert(key.to_string(), record);
        Ok(())
    }
}

/// A 48-bit node token, written as 12 hex digits.
///
/// Values not derived from a real hardware address carry the multicast bit
/// (the low bit of the first octet), so they can never collide with an
/// IEEE-assigned MAC.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) [u8; 6]);

impl NodeId {
    /// Wraps six raw octets.
    #[must_use]
    pub const fn from_octets(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    /// Returns the raw octets.
    #[must_use]
    pub const fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// Draws a random node token with the multicast bit set.
    ///
    /// # Errors
    ///
    /// [`Error::RandomUnavailable`] when the entropy source fails.
    pub fn random<R: EntropySource>(entropy: &mut R) -> Result<Self> {
        let mut octets = [0u8; 6];
        entropy.fill(&mut octets)?;
        octets[0] |= 0x01;
        Ok(Self(octets))
    }
}

impl core::fmt::Display for NodeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for octet in self.0 {
            write!(f, "{octet:02x}")?;
        }
        Ok(())
    }
}

impl core::fmt::Debug for NodeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "NodeId({self})")
    }
}

impl core::str::FromStr for NodeId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut octets = [0u8; 6];
        crate::id::decode_hex(s, &mut octets, "12-hex-digit node id")?;
        Ok(Self(octets))
    }
}

/// A provider of node tokens.
///
/// The engine only consumes supplied values; hardware-address discovery is
/// a caller concern.
pub trait NodeSource {
    /// Returns the node token to mint under.
    ///
    /// # Errors
    ///
    /// Implementation-defined; the random provider surfaces
    /// [`Error::RandomUnavailable`].
    fn node_id(&mut self) -> Result<NodeId>;
}

impl NodeSource for NodeId {
    fn node_id(&mut self) -> Result<NodeId> {
        Ok(*self)
    }
}

/// A [`NodeSource`] that draws one random token and hands out copies.
#[derive(Debug, Default)]
pub struct RandomNode {
    cached: Option<NodeId>,
}

impl NodeSource for RandomNode {
    fn node_id(&mut self) -> Result<NodeId> {
        if let Some(node) = self.cached {
            return Ok(node);
        }
        let node = NodeId::random(&mut ThreadRandom)?;
        self.cached = Some(node);
        Ok(node)
    }
}

/// The persisted per-key record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceState {
    pub node: NodeId,
    pub sequence: u64,
    pub timestamp: u64,
}

/// How the sequence reacts to the supplied timestamp.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SequencePolicy {
    /// Every call advances the sequence, wrapping past the maximum. The
    /// wrap is an expected state transition, not an error.
    AlwaysIncreasing,
    /// The sequence holds steady while time advances and increments only
    /// when the supplied timestamp is less than or equal to the stored one,
    /// i.e. the clock moved backward or did not advance at this precision.
    Rfc,
}

/// Derives the small collision-avoidance counter attached to identifiers
/// minted for the same node at indistinguishable times.
///
/// State is keyed by a namespace token (default: the node's hex form) and
/// persisted through a [`StateStore`] as a JSON `{node, sequence,
/// timestamp}` record. Distinct namespaces never share a counter.
///
/// On first use of a key the initial value is drawn at random, unless a
/// fixed seed was supplied; the seed is consumed exactly once, and any
/// later reinitialization of an evicted key draws fresh randomness.
///
/// Calls must be serialized through one instance; see
/// [`LockClockSequence`] for a shared handle.
///
/// [`LockClockSequence`]: crate::LockClockSequence
#[derive(Debug)]
pub struct ClockSequence<S, R = ThreadRandom> {
    store: S,
    rand: R,
    policy: SequencePolicy,
    max: u64,
    seed: Option<u64>,
}

impl<S: StateStore> ClockSequence<S> {
    /// Creates an engine over `store` with the 14-bit default maximum and
    /// a thread-local random source for initial values.
    #[must_use]
    pub fn new(store: S, policy: SequencePolicy) -> Self {
        Self::with_rand(store, policy, ThreadRandom)
    }
}

impl<S: StateStore, R: RandSource<u64>> ClockSequence<S, R> {
    /// Creates an engine with an explicit random source.
    #[must_use]
    pub fn with_rand(store: S, policy: SequencePolicy, rand: R) -> Self {
        Self {
            store,
            rand,
            policy,
            max: DEFAULT_MAX_SEQUENCE,
            seed: None,
        }
    }

    /// Overrides the maximum representable sequence value.
    #[must_use]
    pub fn with_max(mut self, max: u64) -> Self {
        self.max = max;
        self
    }

    /// Supplies a fixed initial value for the first key initialization.
    /// Consumed exactly once, never replayed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Returns the next sequence value for `node` at `timestamp`, keyed by
    /// the node's own token.
    ///
    /// # Errors
    ///
    /// [`Error::StateCorruption`] for an ill-formed persisted record, plus
    /// whatever the store itself surfaces.
    pub fn next(&mut self, node: NodeId, timestamp: u64) -> Result<u64> {
        self.next_keyed(&node.to_string(), node, timestamp)
    }

    /// Returns the next sequence value under an explicit namespace token.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "trace", skip(self)))]
    pub fn next_keyed(&mut self, namespace: &str, node: NodeId, timestamp: u64) -> Result<u64> {
        let stored = self.load(namespace)?;
        let sequence = match (self.policy, stored) {
            (SequencePolicy::AlwaysIncreasing, stored) => {
                let current = match stored {
                    Some(state) => state.sequence,
                    None => self.initial(),
                };
                self.wrap(current.wrapping_add(1))
            }
            (SequencePolicy::Rfc, None) => self.initial(),
            (SequencePolicy::Rfc, Some(state)) => {
                if timestamp <= state.timestamp {
                    self.wrap(state.sequence.wrapping_add(1))
                } else {
                    state.sequence
                }
            }
        };
        let record = SequenceState {
            node,
            sequence,
            timestamp,
        };
        let encoded = serde_json::to_vec(&record).map_err(|e| Error::StateCorruption {
            key: namespace.to_string(),
            detail: e.to_string(),
        })?;
        self.store.set(namespace, encoded)?;
        Ok(sequence)
    }

    fn load(&self, namespace: &str) -> Result<Option<SequenceState>> {
        match self.store.get(namespace)? {
            None => Ok(None),
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| Error::StateCorruption {
                    key: namespace.to_string(),
                    detail: e.to_string(),
                }),
        }
    }

    /// First value for a fresh key: the one-shot seed if still unspent,
    /// otherwise a random draw within range.
    fn initial(&mut self) -> u64 {
        match self.seed.take() {
            Some(seed) => seed & self.max,
            None => self.rand.rand() & self.max,
        }
    }

    fn wrap(&self, value: u64) -> u64 {
        if value > self.max { 0 } else { value }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedRand(u64);
    impl RandSource<u64> for FixedRand {
        fn rand(&self) -> u64 {
            self.0
        }
    }

    fn node(tail: u8) -> NodeId {
        NodeId::from_octets([0x02, 0x42, 0xAC, 0x11, 0x00, tail])
    }

    #[test]
    fn always_increasing_wraps_from_seeded_maximum() {
        let mut engine =
            ClockSequence::new(MemoryStore::new(), SequencePolicy::AlwaysIncreasing)
                .with_seed(DEFAULT_MAX_SEQUENCE);
        assert_eq!(engine.next(node(1), 100).unwrap(), 0);
        assert_eq!(engine.next(node(1), 100).unwrap(), 1);
        assert_eq!(engine.next(node(1), 99).unwrap(), 2);
    }

    #[test]
    fn always_increasing_ignores_the_timestamp() {
        let mut engine = ClockSequence::new(MemoryStore::new(), SequencePolicy::AlwaysIncreasing)
            .with_seed(10);
        let first = engine.next(node(1), 500).unwrap();
        let second = engine.next(node(1), 9_000).unwrap();
        let third = engine.next(node(1), 1).unwrap();
        assert_eq!((first, second, third), (11, 12, 13));
    }

    #[test]
    fn rfc_holds_while_time_advances() {
        let mut engine =
            ClockSequence::new(MemoryStore::new(), SequencePolicy::Rfc).with_seed(7);
        assert_eq!(engine.next(node(1), 100).unwrap(), 7);
        assert_eq!(engine.next(node(1), 101).unwrap(), 7);
        assert_eq!(engine.next(node(1), 500).unwrap(), 7);
    }

    #[test]
    fn rfc_increments_on_backward_or_equal_time() {
        let mut engine =
            ClockSequence::new(MemoryStore::new(), SequencePolicy::Rfc).with_seed(7);
        assert_eq!(engine.next(node(1), 100).unwrap(), 7);
        // Equal timestamps count as "did not advance".
        assert_eq!(engine.next(node(1), 100).unwrap(), 8);
        assert_eq!(engine.next(node(1), 50).unwrap(), 9);
        assert_eq!(engine.next(node(1), 200).unwrap(), 9);
    }

    #[test]
    fn rfc_wraps_at_the_maximum() {
        let mut engine = ClockSequence::new(MemoryStore::new(), SequencePolicy::Rfc)
            .with_max(3)
            .with_seed(3);
        assert_eq!(engine.next(node(1), 10).unwrap(), 3);
        assert_eq!(engine.next(node(1), 10).unwrap(), 0);
        assert_eq!(engine.next(node(1), 10).unwrap(), 1);
    }

    #[test]
    fn namespaces_are_independent() {
        let mut engine = ClockSequence::new(MemoryStore::new(), SequencePolicy::AlwaysIncreasing)
            .with_seed(0);
        let a1 = engine.next_keyed("tenant-a", node(1), 10).unwrap();
        let a2 = engine.next_keyed("tenant-a", node(1), 10).unwrap();
        let b1 = engine.next_keyed("tenant-b", node(1), 10).unwrap();
        assert_eq!(a1 + 1, a2);
        // tenant-b initialized independently (random draw), then advances
        // on its own.
        let b2 = engine.next_keyed("tenant-b", node(1), 10).unwrap();
        assert_eq!(
            if b1 == DEFAULT_MAX_SEQUENCE { 0 } else { b1 + 1 },
            b2
        );
    }

    #[test]
    fn seed_is_never_replayed() {
        let store = MemoryStore::new();
        let mut engine =
            ClockSequence::with_rand(&store, SequencePolicy::Rfc, FixedRand(0x1234)).with_seed(7);
        assert_eq!(engine.next_keyed("first", node(1), 10).unwrap(), 7);
        // A later fresh key draws from the random source, not the seed.
        assert_eq!(engine.next_keyed("second", node(1), 10).unwrap(), 0x1234);
    }

    #[test]
    fn corrupt_record_fails_fast() {
        let store = MemoryStore::new();
        store.set("node", b"not json".to_vec()).unwrap();
        let mut engine = ClockSequence::new(&store, SequencePolicy::Rfc);
        let err = engine.next_keyed("node", node(1), 10).unwrap_err();
        assert!(matches!(err, Error::StateCorruption { ref key, .. } if key == "node"));
    }

    #[test]
    fn records_persist_through_the_store() {
        let store = MemoryStore::new();
        {
            let mut engine =
                ClockSequence::new(&store, SequencePolicy::Rfc).with_seed(42);
            engine.next(node(9), 1_000).unwrap();
        }
        // A second engine over the same store resumes from the record.
        let mut engine = ClockSequence::new(&store, SequencePolicy::Rfc);
        assert_eq!(engine.next(node(9), 1_000).unwrap(), 43);
        assert_eq!(engine.next(node(9), 2_000).unwrap(), 43);
    }

    #[test]
    fn node_id_text_roundtrip_and_multicast() {
        let node = NodeId::from_octets([0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0x01]);
        assert_eq!(node.to_string(), "deadbeef0001");
        assert_eq!("DEADBEEF0001".parse::<NodeId>().unwrap(), node);
        assert!("deadbeef00".parse::<NodeId>().is_err());
        assert!("deadbeef000g".parse::<NodeId>().is_err());

        let random = NodeId::random(&mut ThreadRandom).unwrap();
        assert_eq!(random.octets()[0] & 0x01, 0x01);
    }
}
