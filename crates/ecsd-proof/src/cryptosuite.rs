use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};

use ecsd_core::{ProofError, SuiteConfig, CRYPTOSUITE_NAME, PROOF_TYPE};
use ecsd_crypto::{hash_statements, HmacKey, KeyPair};

use crate::canonical::pointer::parse_pointer;
use crate::canonical::{Canonicalizer, HmacLabeler};
use crate::discloser::ProofDiscloser;
use crate::proof_set::{attach_proof, split_proofs};
use crate::resolver::KeyResolver;
use crate::signer::{ProofSigner, SigningInput};
use crate::verifier::{ProofVerifier, VerificationResult};

const MANDATORY: &str = "mandatory";

/// Entry point for the `ecdsa-sd-2023` cryptosuite.
pub struct Cryptosuite {
    config: SuiteConfig,
    canonicalizer: Arc<dyn Canonicalizer>,
}

impl Cryptosuite {
    /// Fails with [`ProofError::CryptosuiteMismatch`] when the configured
    /// suite is not `ecdsa-sd-2023`.
    pub fn new(config: SuiteConfig, canonicalizer: Arc<dyn Canonicalizer>) -> Result<Self, ProofError> {
        if config.cryptosuite != CRYPTOSUITE_NAME {
            return Err(ProofError::CryptosuiteMismatch {
                expected: CRYPTOSUITE_NAME.into(),
                actual: config.cryptosuite,
            });
        }
        Ok(Self {
            config,
            canonicalizer,
        })
    }

    pub fn name(&self) -> &str {
        &self.config.cryptosuite
    }

    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// Proof options for a new base proof, `created` set to now.
    pub fn proof_options(&self, verification_method: &str) -> Value {
        json!({
            "type": PROOF_TYPE,
            "cryptosuite": self.config.cryptosuite,
            "created": Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            "verificationMethod": verification_method,
            "proofPurpose": self.config.proof_purpose,
        })
    }

    fn check_suite(&self, proof_options: &Value) -> Result<(), ProofError> {
        let actual = proof_options
            .get("cryptosuite")
            .and_then(Value::as_str)
            .unwrap_or("");
        if actual != self.config.cryptosuite {
            return Err(ProofError::CryptosuiteMismatch {
                expected: self.config.cryptosuite.clone(),
                actual: actual.to_string(),
            });
        }
        Ok(())
    }

    /// Canonicalize `document` under a fresh HMAC key, split it by
    /// `mandatory_pointers`, and hash the proof options and the mandatory
    /// statements.
    pub async fn create_verify_data(
        &self,
        document: &Value,
        proof_options: &Value,
        mandatory_pointers: &[String],
    ) -> Result<SigningInput, ProofError> {
        self.check_suite(proof_options)?;
        for pointer in mandatory_pointers {
            parse_pointer(pointer)?;
        }

        let hmac_key = HmacKey::generate();
        let labeler = HmacLabeler::new(hmac_key.clone());
        let groups = BTreeMap::from([(MANDATORY.to_string(), mandatory_pointers.to_vec())]);
        let (proof_hash, grouped) = tokio::join!(
            self.canonicalizer.hash_proof_options(document, proof_options),
            self.canonicalizer
                .canonicalize_and_group(document, &labeler, &groups),
        );
        let grouped = grouped?;
        let proof_hash = proof_hash?;

        let group = grouped.group(MANDATORY)?;
        let mandatory: Vec<String> = group.matching.values().cloned().collect();
        let non_mandatory: Vec<String> = group.non_matching.values().cloned().collect();

        Ok(SigningInput {
            proof_hash,
            mandatory_pointers: mandatory_pointers.to_vec(),
            mandatory_hash: hash_statements(&mandatory),
            non_mandatory,
            hmac_key,
        })
    }

    pub async fn create_proof_value(
        &self,
        input: SigningInput,
        keypair: &KeyPair,
    ) -> Result<String, ProofError> {
        ProofSigner::new(keypair.clone(), &self.config)
            .create_proof_value(input)
            .await
    }

    /// Add a base proof to `document`.
    pub async fn sign(
        &self,
        document: &Value,
        keypair: &KeyPair,
        verification_method: &str,
        mandatory_pointers: &[String],
    ) -> Result<Value, ProofError> {
        let (unsecured, _) = split_proofs(document)?;
        let mut proof = self.proof_options(verification_method);
        let input = self
            .create_verify_data(&unsecured, &proof, mandatory_pointers)
            .await?;
        let proof_value = self.create_proof_value(input, keypair).await?;
        if let Value::Object(map) = &mut proof {
            map.insert("proofValue".into(), Value::String(proof_value));
        }
        attach_proof(document, proof)
    }

    /// Derive a selective-disclosure document from a base-secured one.
    pub async fn derive(
        &self,
        document: &Value,
        selective_pointers: &[String],
        proof_id: Option<&str>,
    ) -> Result<Value, ProofError> {
        ProofDiscloser::new(Arc::clone(&self.canonicalizer), self.config.clone())
            .derive(document, selective_pointers, proof_id)
            .await
    }

    /// Verify a secured document (base or derived), with per-check detail.
    pub async fn verify_with_report(
        &self,
        document: &Value,
        resolver: Arc<dyn KeyResolver>,
    ) -> Result<VerificationResult, ProofError> {
        ProofVerifier::new(Arc::clone(&self.canonicalizer), resolver, self.config.clone())
            .verify(document)
            .await
    }

    pub async fn verify(
        &self,
        document: &Value,
        resolver: Arc<dyn KeyResolver>,
    ) -> Result<bool, ProofError> {
        Ok(self.verify_with_report(document, resolver).await?.verified)
    }
}
