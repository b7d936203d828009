use crate::{Error, Result};
use rand::{Rng, RngCore, TryRngCore, rngs::OsRng};

/// A trait for random sources that return a random value.
///
/// Implementations may be cryptographically secure, pseudorandom, or fixed
/// for testing; the generators only require the output type `T` (typically
/// `u64` or `u128`).
pub trait RandSource<T> {
    /// Returns a uniformly random value.
    fn rand(&self) -> T;
}

/// A fallible byte-filling entropy source.
///
/// Unlike [`RandSource`], which is infallible and word-oriented, this seam
/// exists for the paths that consume raw byte runs (seed buffers, random
/// tails) and must surface OS-level failure instead of panicking.
pub trait EntropySource {
    /// Fills `dest` with random bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RandomUnavailable`] when the underlying source
    /// cannot produce bytes.
    fn fill(&mut self, dest: &mut [u8]) -> Result<()>;
}

/// Thread-local PRNG, seeded from the OS.
///
/// The cheap default for both [`RandSource`] and [`EntropySource`]; the
/// thread-local generator reseeds itself periodically and does not fail
/// after construction.
#[derive(Copy, Clone, Debug, Default)]
pub struct ThreadRandom;

impl RandSource<u64> for ThreadRandom {
    fn rand(&self) -> u64 {
        rand::rng().random()
    }
}

impl RandSource<u128> for ThreadRandom {
    fn rand(&self) -> u128 {
        rand::rng().random()
    }
}

impl EntropySource for ThreadRandom {
    fn fill(&mut self, dest: &mut [u8]) -> Result<()> {
        rand::rng().fill_bytes(dest);
        Ok(())
    }
}

/// Entropy drawn directly from the operating system on every call.
///
/// Slower than [`ThreadRandom`] but with no userspace state to leak across
/// forks or snapshots. Failure is reported, not panicked.
#[derive(Copy, Clone, Debug, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&mut self, dest: &mut [u8]) -> Result<()> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|e| Error::RandomUnavailable(e.to_string()))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Deterministic byte stream for tests: repeats a fixed pattern.
    pub(crate) struct FixedEntropy {
        pub(crate) pattern: Vec<u8>,
        pub(crate) cursor: usize,
    }

    impl FixedEntropy {
        pub(crate) fn new(pattern: &[u8]) -> Self {
            Self {
                pattern: pattern.to_vec(),
                cursor: 0,
            }
        }
    }

    impl EntropySource for FixedEntropy {
        fn fill(&mut self, dest: &mut [u8]) -> Result<()> {
            for slot in dest.iter_mut() {
                *slot = self.pattern[self.cursor % self.pattern.len()];
                self.cursor += 1;
            }
            Ok(())
        }
    }

    /// An entropy source that always fails, for error-path tests.
    pub(crate) struct BrokenEntropy;

    impl EntropySource for BrokenEntropy {
        fn fill(&mut self, _dest: &mut [u8]) -> Result<()> {
            Err(Error::RandomUnavailable("no entropy".into()))
        }
    }
}
