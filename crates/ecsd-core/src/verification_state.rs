use std::fmt;

use crate::error::ProofError;

/// Stages of a single proof verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum VerificationState {
    /// Decoding the proof value.
    Parsing,
    /// Proof hash running concurrently with canonicalization.
    HashingOutstanding,
    /// Splitting statements into mandatory and non-mandatory.
    Partitioning,
    /// Checking per-statement signatures.
    StatementVerification,
    /// Checking the base signature over the verify data.
    BaseVerification,
    /// Every signature checked out. Final state.
    Valid,
    /// Well-formed proof with a failing signature. Final state.
    Invalid,
    /// Malformed proof or count mismatch. Final state.
    Error,
}

impl VerificationState {
    /// Whether this is a final (terminal) state.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Valid | Self::Invalid | Self::Error)
    }
}

impl fmt::Display for VerificationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parsing => write!(f, "Parsing"),
            Self::HashingOutstanding => write!(f, "HashingOutstanding"),
            Self::Partitioning => write!(f, "Partitioning"),
            Self::StatementVerification => write!(f, "StatementVerification"),
            Self::BaseVerification => write!(f, "BaseVerification"),
            Self::Valid => write!(f, "Valid"),
            Self::Invalid => write!(f, "Invalid"),
            Self::Error => write!(f, "Error"),
        }
    }
}

/// Events that move a verification forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationEvent {
    /// Proof value decoded; proof hash started.
    Parsed,
    /// Document canonicalized under the recovered labeling.
    Canonicalized,
    /// Statements partitioned and signature count matched.
    Partitioned,
    /// Every per-statement signature has been checked.
    StatementsChecked,
    /// Base signature verified and all statements passed.
    Accept,
    /// Some signature failed.
    Reject,
    /// Malformed input or fatal mismatch.
    Fail,
}

/// Drives [`VerificationState`] transitions.
///
/// Valid transitions:
/// - Parsing → HashingOutstanding (Parsed)
/// - HashingOutstanding → Partitioning (Canonicalized)
/// - Partitioning → StatementVerification (Partitioned)
/// - StatementVerification → BaseVerification (StatementsChecked)
/// - BaseVerification → Valid (Accept)
/// - BaseVerification → Invalid (Reject)
/// - any non-final state → Error (Fail)
pub struct VerificationStateMachine;

impl VerificationStateMachine {
    pub fn transition(
        current: VerificationState,
        event: VerificationEvent,
    ) -> Result<VerificationState, ProofError> {
        use VerificationEvent as E;
        use VerificationState as S;

        let new_state = match (current, event) {
            (S::Parsing, E::Parsed) => S::HashingOutstanding,
            (S::HashingOutstanding, E::Canonicalized) => S::Partitioning,
            (S::Partitioning, E::Partitioned) => S::StatementVerification,
            (S::StatementVerification, E::StatementsChecked) => S::BaseVerification,
            (S::BaseVerification, E::Accept) => S::Valid,
            (S::BaseVerification, E::Reject) => S::Invalid,
            (state, E::Fail) if !state.is_final() => S::Error,
            _ => {
                let target = match event {
                    E::Parsed => S::HashingOutstanding,
                    E::Canonicalized => S::Partitioning,
                    E::Partitioned => S::StatementVerification,
                    E::StatementsChecked => S::BaseVerification,
                    E::Accept => S::Valid,
                    E::Reject => S::Invalid,
                    E::Fail => S::Error,
                };
                return Err(ProofError::InvalidStateTransition {
                    from: current,
                    to: target,
                });
            }
        };

        tracing::debug!(
            from = %current,
            to = %new_state,
            event = ?event,
            "verification state transition"
        );

        Ok(new_state)
    }

    /// Check if a transition is valid without performing it.
    pub fn can_transition(current: VerificationState, event: VerificationEvent) -> bool {
        Self::transition(current, event).is_ok()
    }
}
