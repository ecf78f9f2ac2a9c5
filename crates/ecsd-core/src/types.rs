use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ProofError;

/// Length of a P-256 ECDSA signature (`r || s`).
pub const SIGNATURE_LENGTH: usize = 64;
/// Length of a P-256 multikey public key (2-byte header + compressed point).
pub const PUBLIC_KEY_LENGTH: usize = 35;
/// Length of the HMAC key used for blank-node label blinding.
pub const HMAC_KEY_LENGTH: usize = 32;
/// Length of a SHA-256 digest.
pub const HASH_LENGTH: usize = 32;

/// Canonical blank-node identifier (`c14n<N>`) → blinded label (`u<base64url>`).
pub type LabelMap = BTreeMap<String, String>;

/// Wire form of a [`LabelMap`]: `N` → raw blinded label bytes.
pub type CompressedLabelMap = BTreeMap<u64, Vec<u8>>;

/// Payload of a base proof, created once by the signer at issuance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseProofParams {
    pub base_signature: Vec<u8>,
    /// Multikey bytes of the single-use statement key.
    pub public_key: Vec<u8>,
    pub hmac_key: Vec<u8>,
    /// One signature per non-mandatory statement, in statement order.
    pub signatures: Vec<Vec<u8>>,
    pub mandatory_pointers: Vec<String>,
}

impl BaseProofParams {
    /// Exact-length checks on every byte field.
    pub fn validate(&self) -> Result<(), ProofError> {
        check_length("baseSignature", &self.base_signature, SIGNATURE_LENGTH)?;
        check_length("publicKey", &self.public_key, PUBLIC_KEY_LENGTH)?;
        check_length("hmacKey", &self.hmac_key, HMAC_KEY_LENGTH)?;
        check_signatures(&self.signatures)
    }
}

/// Payload of a derived (disclosure) proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedProofParams {
    pub base_signature: Vec<u8>,
    pub public_key: Vec<u8>,
    /// Signatures of the disclosed non-mandatory statements only.
    pub signatures: Vec<Vec<u8>>,
    /// Label map keyed by the disclosed document's own canonical ids.
    pub label_map: LabelMap,
    /// Positions of the mandatory statements in the disclosed statement order.
    pub mandatory_indexes: Vec<usize>,
}

impl DerivedProofParams {
    /// Exact-length checks on every byte field and ordering of
    /// `mandatory_indexes`. Label-map syntax is checked by the codec.
    pub fn validate(&self) -> Result<(), ProofError> {
        check_length("baseSignature", &self.base_signature, SIGNATURE_LENGTH)?;
        check_length("publicKey", &self.public_key, PUBLIC_KEY_LENGTH)?;
        check_signatures(&self.signatures)?;
        if self.mandatory_indexes.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ProofError::validation(
                "mandatoryIndexes",
                "must be strictly increasing",
            ));
        }
        Ok(())
    }
}

/// Either kind of decoded proof payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProofParams {
    Base(BaseProofParams),
    Derived(DerivedProofParams),
}

impl ProofParams {
    pub fn base_signature(&self) -> &[u8] {
        match self {
            Self::Base(p) => &p.base_signature,
            Self::Derived(p) => &p.base_signature,
        }
    }

    pub fn public_key(&self) -> &[u8] {
        match self {
            Self::Base(p) => &p.public_key,
            Self::Derived(p) => &p.public_key,
        }
    }

    pub fn signatures(&self) -> &[Vec<u8>] {
        match self {
            Self::Base(p) => &p.signatures,
            Self::Derived(p) => &p.signatures,
        }
    }

    pub fn is_derived(&self) -> bool {
        matches!(self, Self::Derived(_))
    }
}

/// The bytes signed by the base signature:
/// `proofHash || publicKey || mandatoryHash`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyData {
    pub proof_hash: [u8; HASH_LENGTH],
    pub public_key: Vec<u8>,
    pub mandatory_hash: [u8; HASH_LENGTH],
}

impl VerifyData {
    pub fn new(
        proof_hash: [u8; HASH_LENGTH],
        public_key: Vec<u8>,
        mandatory_hash: [u8; HASH_LENGTH],
    ) -> Result<Self, ProofError> {
        check_length("publicKey", &public_key, PUBLIC_KEY_LENGTH)?;
        Ok(Self {
            proof_hash,
            public_key,
            mandatory_hash,
        })
    }

    /// Fixed-order concatenation with no length delimiters.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HASH_LENGTH * 2 + PUBLIC_KEY_LENGTH);
        bytes.extend_from_slice(&self.proof_hash);
        bytes.extend_from_slice(&self.public_key);
        bytes.extend_from_slice(&self.mandatory_hash);
        bytes
    }

    /// Split a concatenation produced by [`VerifyData::to_bytes`] by position.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProofError> {
        check_length("verifyData", bytes, HASH_LENGTH * 2 + PUBLIC_KEY_LENGTH)?;
        let (proof_hash, rest) = bytes.split_at(HASH_LENGTH);
        let (public_key, mandatory_hash) = rest.split_at(PUBLIC_KEY_LENGTH);
        Ok(Self {
            proof_hash: to_hash(proof_hash),
            public_key: public_key.to_vec(),
            mandatory_hash: to_hash(mandatory_hash),
        })
    }
}

fn to_hash(bytes: &[u8]) -> [u8; HASH_LENGTH] {
    let mut out = [0u8; HASH_LENGTH];
    out.copy_from_slice(bytes);
    out
}

fn check_length(field: &str, bytes: &[u8], expected: usize) -> Result<(), ProofError> {
    if bytes.len() != expected {
        return Err(ProofError::validation(
            field,
            format!("must be {} bytes, got {}", expected, bytes.len()),
        ));
    }
    Ok(())
}

fn check_signatures(signatures: &[Vec<u8>]) -> Result<(), ProofError> {
    for (i, signature) in signatures.iter().enumerate() {
        check_length(&format!("signatures[{}]", i), signature, SIGNATURE_LENGTH)?;
    }
    Ok(())
}
