use thiserror::Error;

/// A result type defaulting to the crate-wide [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All errors that `chronoid` can produce.
///
/// Conversion failures always surface synchronously as one of these variants;
/// no operation silently defaults or retries. The always-increasing sequence
/// policy wrapping to zero is a normal state transition, not an error.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum Error {
    /// Parse input was malformed or outside the representable range of the
    /// target format. `expected` names the shape the parser was looking for.
    #[error("invalid {expected}: got {found:?}")]
    Validation {
        expected: &'static str,
        found: String,
    },

    /// A timestamp fell outside the domain representable by the target bit
    /// field or by the platform date-time type.
    #[error("timestamp out of range: {millis} ms does not fit {context}")]
    Range {
        millis: u128,
        context: &'static str,
    },

    /// The state store returned a record that is not a well-formed
    /// `{node, sequence, timestamp}` triple. The engine fails fast rather
    /// than reinitializing over a record it cannot interpret.
    #[error("corrupt sequence record for key {key:?}: {detail}")]
    StateCorruption { key: String, detail: String },

    /// The cryptographically secure random source failed to produce bytes.
    #[error("random source unavailable: {0}")]
    RandomUnavailable(String),

    /// A sequence counter is exhausted for the current tick. Retry policy is
    /// the caller's responsibility.
    #[error("sequence exhausted for the current tick")]
    Overflow,
}
