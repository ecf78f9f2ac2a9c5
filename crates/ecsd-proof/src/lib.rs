//! ecsd Proof — Selective-disclosure proofs: proof-value codec, signer,
//! discloser, verifier, and the cryptosuite that ties them together.

pub mod canonical;
pub mod cryptosuite;
pub mod discloser;
pub mod proof_set;
pub mod proof_value;
pub mod resolver;
pub mod signer;
pub mod statements;
pub mod verifier;

pub use canonical::{
    Canonicalizer, GroupedStatements, HmacLabeler, IdentityLabeler, JsonCanonicalizer,
    LabelFunction, LabelMapLabeler, StatementGroup,
};
pub use cryptosuite::Cryptosuite;
pub use discloser::{DisclosureData, ProofDiscloser};
pub use proof_value::{
    compress_label_map, decompress_label_map, parse_base_proof_value, parse_derived_proof_value,
    parse_proof_value, serialize_base_proof_value, serialize_derived_proof_value,
    serialize_verify_data, validate_label_map,
};
pub use resolver::{DidKeyResolver, KeyResolver, StaticKeyResolver};
pub use signer::{ProofSigner, SigningInput};
pub use verifier::{ProofVerifier, VerificationCheck, VerificationResult};
