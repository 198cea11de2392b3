//! Error types for the protocol layer.
//!
//! Each crate in Arenastake defines its own error enum. This one covers
//! encoding and decoding, plus the [`ErrorKind`] taxonomy that the arena
//! and absorber errors classify themselves into.

use serde::{Deserialize, Serialize};

/// Errors that can occur while encoding or decoding envelopes.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, missing required fields,
    /// or an unknown notification tag.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message decoded but is not a valid notification.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

/// Coarse classification of every rejection the core can produce.
///
/// Callers that only care about *why* an operation failed in broad
/// terms (retry later? fix the input? missing permission?) branch on
/// this instead of matching every variant of every error enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Caller lacks the required role or membership.
    AccessViolation,
    /// The operation would break a structural invariant (inactive
    /// account, overlapping membership, unknown session or request).
    StateInvariantViolation,
    /// Zero amount, or an amount larger than what is available.
    ArithmeticBoundsViolation,
    /// Attempted before its guard time elapsed.
    TemporalGuardViolation,
    /// Nothing left to act on.
    ResourceExhaustion,
    /// A collaborator (asset ledger, directory, engine channel) failed
    /// and its reason is surfaced as-is.
    External,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::AccessViolation => "AccessViolation",
            Self::StateInvariantViolation => "StateInvariantViolation",
            Self::ArithmeticBoundsViolation => "ArithmeticBoundsViolation",
            Self::TemporalGuardViolation => "TemporalGuardViolation",
            Self::ResourceExhaustion => "ResourceExhaustion",
            Self::External => "External",
        };
        f.write_str(s)
    }
}
