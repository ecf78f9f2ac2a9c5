use ecsd_core::{BaseProofParams, ProofError, SuiteConfig, VerifyData};
use ecsd_crypto::{sign, Hash, HmacKey, KeyPair};

use crate::canonical::pointer::parse_pointer;
use crate::proof_value::serialize_base_proof_value;
use crate::statements::sign_statements;

/// Everything needed to produce a base proof value: the output of
/// `create_verify_data`.
#[derive(Clone)]
pub struct SigningInput {
    pub proof_hash: Hash,
    pub mandatory_pointers: Vec<String>,
    pub mandatory_hash: Hash,
    /// Non-mandatory statements in canonical order.
    pub non_mandatory: Vec<String>,
    pub hmac_key: HmacKey,
}

impl std::fmt::Debug for SigningInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningInput")
            .field("proof_hash", &hex::encode(self.proof_hash))
            .field("mandatory_pointers", &self.mandatory_pointers)
            .field("mandatory_hash", &hex::encode(self.mandatory_hash))
            .field("non_mandatory", &self.non_mandatory.len())
            .finish_non_exhaustive()
    }
}

/// Produces base proof values under an issuer's long-term key.
pub struct ProofSigner {
    /// Issuer's identity keypair.
    keypair: KeyPair,
    workers: usize,
}

impl ProofSigner {
    pub fn new(keypair: KeyPair, config: &SuiteConfig) -> Self {
        Self {
            keypair,
            workers: config.worker_count(),
        }
    }

    /// Sign every non-mandatory statement with a fresh statement key, sign
    /// the verify data with the identity key, and encode the base proof.
    pub async fn create_proof_value(&self, input: SigningInput) -> Result<String, ProofError> {
        for pointer in &input.mandatory_pointers {
            parse_pointer(pointer)?;
        }

        let statement_key = KeyPair::generate();
        let signatures = sign_statements(&statement_key, &input.non_mandatory, self.workers).await?;

        let public_key = statement_key.public_key().to_multikey_bytes();
        let verify_data = VerifyData::new(input.proof_hash, public_key.clone(), input.mandatory_hash)?;
        let base_signature = sign(&verify_data.to_bytes(), &self.keypair);

        let params = BaseProofParams {
            base_signature: base_signature.to_bytes().to_vec(),
            public_key,
            hmac_key: input.hmac_key.export(),
            signatures,
            mandatory_pointers: input.mandatory_pointers,
        };
        let proof_value = serialize_base_proof_value(&params)?;

        tracing::info!(
            issuer_key = %self.keypair.public_key().to_multibase(),
            signatures = params.signatures.len(),
            mandatory_pointers = params.mandatory_pointers.len(),
            "base proof created"
        );

        Ok(proof_value)
    }
}
