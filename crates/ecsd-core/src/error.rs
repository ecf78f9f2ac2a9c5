use crate::verification_state::VerificationState;

/// Errors raised by proof creation, derivation, and verification.
///
/// Malformed input always surfaces as one of these variants. A proof that
/// parses but whose signatures do not check out is reported as a negative
/// verification result instead.
#[derive(Debug, thiserror::Error)]
pub enum ProofError {
    /// Malformed multibase envelope, header, or binary structure.
    #[error("format error: {0}")]
    Format(String),

    /// Decodable but semantically invalid field (wrong length or type).
    #[error("invalid \"{field}\": {reason}")]
    Validation { field: String, reason: String },

    /// Valid structure that violates a protocol precondition.
    #[error("{0}")]
    Logic(String),

    /// Fatal verification failure (e.g. signature count mismatch).
    #[error("verification error: {0}")]
    Verification(String),

    #[error("\"cryptosuite.name\" must be \"{expected}\", got \"{actual}\"")]
    CryptosuiteMismatch { expected: String, actual: String },

    #[error("canonicalization error: {0}")]
    Canonicalization(String),

    #[error("crypto error: {0}")]
    Crypto(String),

    #[error("invalid verification state transition from {from} to {to}")]
    InvalidStateTransition {
        from: VerificationState,
        to: VerificationState,
    },
}

impl ProofError {
    /// Shorthand for a [`ProofError::Validation`] naming the offending field.
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error belongs to the malformed-input class.
    pub fn is_malformed_input(&self) -> bool {
        matches!(self, Self::Format(_) | Self::Validation { .. })
    }
}
