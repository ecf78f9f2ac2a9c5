//! ecsd Core — Shared types, errors, and constants for the `ecdsa-sd-2023`
//! selective-disclosure cryptosuite.

pub mod config;
pub mod error;
pub mod types;
pub mod verification_state;

pub use config::SuiteConfig;
pub use error::ProofError;
pub use types::{
    BaseProofParams, CompressedLabelMap, DerivedProofParams, LabelMap, ProofParams, VerifyData,
};
pub use verification_state::{VerificationEvent, VerificationState, VerificationStateMachine};

/// Name of the cryptosuite implemented by this workspace.
pub const CRYPTOSUITE_NAME: &str = "ecdsa-sd-2023";

/// Proof `type` of every proof produced by the cryptosuite.
pub const PROOF_TYPE: &str = "DataIntegrityProof";
