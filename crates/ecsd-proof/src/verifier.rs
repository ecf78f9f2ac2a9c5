use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use ecsd_core::{
    DerivedProofParams, ProofError, ProofParams, SuiteConfig, VerificationEvent,
    VerificationState, VerificationStateMachine, VerifyData,
};
use ecsd_crypto::{hash_statements, verify_bytes, HmacKey, PublicKey};

use crate::canonical::{Canonicalizer, HmacLabeler, LabelMapLabeler};
use crate::proof_set::{is_suite_proof, proof_value, split_proofs, verification_method};
use crate::proof_value::parse_proof_value;
use crate::resolver::KeyResolver;
use crate::statements::verify_statements;

const MANDATORY: &str = "mandatory";

/// Result of proof verification.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationResult {
    /// Whether every signature checked out.
    pub verified: bool,
    /// Individual check results.
    pub checks: Vec<VerificationCheck>,
    /// Indexes (among non-mandatory statements) whose signature failed.
    pub failed_statements: Vec<usize>,
}

/// An individual verification check.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationCheck {
    /// Name of the check.
    pub name: String,
    /// Whether the check passed.
    pub passed: bool,
    /// Optional detail message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl VerificationCheck {
    fn new(name: &str, passed: bool, failure: impl FnOnce() -> String) -> Self {
        Self {
            name: name.into(),
            passed,
            detail: if passed { None } else { Some(failure()) },
        }
    }
}

/// Statements split by the proof's mandatory selection.
#[derive(Debug)]
struct Partition {
    mandatory: Vec<String>,
    non_mandatory: Vec<String>,
}

/// Verifies base and derived proofs.
pub struct ProofVerifier {
    canonicalizer: Arc<dyn Canonicalizer>,
    resolver: Arc<dyn KeyResolver>,
    config: SuiteConfig,
}

impl ProofVerifier {
    pub fn new(
        canonicalizer: Arc<dyn Canonicalizer>,
        resolver: Arc<dyn KeyResolver>,
        config: SuiteConfig,
    ) -> Self {
        Self {
            canonicalizer,
            resolver,
            config,
        }
    }

    /// Verify the single suite proof carried by a secured document.
    pub async fn verify(&self, document: &Value) -> Result<VerificationResult, ProofError> {
        let (unsecured, proofs) = split_proofs(document)?;
        let mut matching = proofs
            .iter()
            .filter(|proof| is_suite_proof(proof, &self.config.cryptosuite));
        let proof = matching.next().ok_or_else(|| {
            ProofError::Logic(format!(
                "no \"{}\" proof found on the document",
                self.config.cryptosuite
            ))
        })?;
        if matching.next().is_some() {
            return Err(ProofError::Logic(
                "Multiple matching proofs; verify each proof separately.".into(),
            ));
        }
        self.verify_proof(&unsecured, proof).await
    }

    /// Verify `proof` against an unsecured document.
    ///
    /// Malformed proof values and signature-count mismatches are errors;
    /// a well-formed proof with a bad signature yields `verified == false`.
    pub async fn verify_proof(
        &self,
        document: &Value,
        proof: &Value,
    ) -> Result<VerificationResult, ProofError> {
        let mut state = VerificationState::Parsing;
        match self.run(document, proof, &mut state).await {
            Ok(result) => Ok(result),
            Err(e) => {
                if !state.is_final() {
                    state = VerificationStateMachine::transition(state, VerificationEvent::Fail)?;
                }
                tracing::warn!(state = %state, error = %e, "proof verification failed");
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        document: &Value,
        proof: &Value,
        state: &mut VerificationState,
    ) -> Result<VerificationResult, ProofError> {
        let suite = proof.get("cryptosuite").and_then(Value::as_str).unwrap_or("");
        if suite != self.config.cryptosuite {
            return Err(ProofError::CryptosuiteMismatch {
                expected: self.config.cryptosuite.clone(),
                actual: suite.to_string(),
            });
        }
        let params = parse_proof_value(proof_value(proof)?)?;
        let verification_method = verification_method(proof)?;
        *state = VerificationStateMachine::transition(*state, VerificationEvent::Parsed)?;

        // Proof hash runs alongside canonicalization; its error surfaces
        // only once partitioning is done.
        let (proof_hash, partition) = tokio::join!(
            self.canonicalizer.hash_proof_options(document, proof),
            self.partition(document, &params),
        );
        let partition = partition?;
        *state = VerificationStateMachine::transition(*state, VerificationEvent::Canonicalized)?;
        let proof_hash = proof_hash?;

        let mut checks = Vec::new();
        let signatures = params.signatures();
        let count_ok = signatures.len() == partition.non_mandatory.len();
        checks.push(VerificationCheck::new("statement_count", count_ok, || {
            format!(
                "{} signatures for {} non-mandatory statements",
                signatures.len(),
                partition.non_mandatory.len()
            )
        }));
        if !count_ok {
            return Err(ProofError::Verification(format!(
                "signature count {} does not match non-mandatory statement count {}",
                signatures.len(),
                partition.non_mandatory.len()
            )));
        }
        *state = VerificationStateMachine::transition(*state, VerificationEvent::Partitioned)?;

        let statement_results = match PublicKey::from_multikey_bytes(params.public_key()) {
            Ok(key) => {
                verify_statements(
                    &key,
                    &partition.non_mandatory,
                    signatures,
                    self.config.worker_count(),
                )
                .await?
            }
            Err(e) => {
                tracing::debug!(error = %e, "statement public key is unusable");
                vec![false; signatures.len()]
            }
        };
        let failed_statements: Vec<usize> = statement_results
            .iter()
            .enumerate()
            .filter(|(_, ok)| !**ok)
            .map(|(i, _)| i)
            .collect();
        checks.push(VerificationCheck::new(
            "statement_signatures",
            failed_statements.is_empty(),
            || format!("{} statement signature(s) failed", failed_statements.len()),
        ));
        *state =
            VerificationStateMachine::transition(*state, VerificationEvent::StatementsChecked)?;

        let issuer_key = self.resolver.resolve(verification_method).await?;
        let mandatory_hash = hash_statements(&partition.mandatory);
        let verify_data = VerifyData::new(proof_hash, params.public_key().to_vec(), mandatory_hash)?;
        let base_ok = verify_bytes(&verify_data.to_bytes(), params.base_signature(), &issuer_key);
        checks.push(VerificationCheck::new("base_signature", base_ok, || {
            "base signature does not match the verify data".into()
        }));

        let verified = base_ok && failed_statements.is_empty();
        let event = if verified {
            VerificationEvent::Accept
        } else {
            VerificationEvent::Reject
        };
        *state = VerificationStateMachine::transition(*state, event)?;

        tracing::info!(
            verified,
            derived = params.is_derived(),
            statements = partition.mandatory.len() + partition.non_mandatory.len(),
            "proof verified"
        );

        Ok(VerificationResult {
            verified,
            checks,
            failed_statements,
        })
    }

    async fn partition(
        &self,
        document: &Value,
        params: &ProofParams,
    ) -> Result<Partition, ProofError> {
        match params {
            ProofParams::Base(base) => {
                let labeler = HmacLabeler::new(HmacKey::from_bytes(&base.hmac_key)?);
                let groups =
                    BTreeMap::from([(MANDATORY.to_string(), base.mandatory_pointers.clone())]);
                let grouped = self
                    .canonicalizer
                    .canonicalize_and_group(document, &labeler, &groups)
                    .await?;
                let group = grouped.group(MANDATORY)?;
                Ok(Partition {
                    mandatory: group.matching.values().cloned().collect(),
                    non_mandatory: group.non_matching.values().cloned().collect(),
                })
            }
            ProofParams::Derived(derived) => {
                let labeler = LabelMapLabeler::new(derived.label_map.clone());
                let statements = self.canonicalizer.canonicalize(document, &labeler).await?;
                split_by_indexes(statements, derived)
            }
        }
    }
}

fn split_by_indexes(
    statements: Vec<String>,
    derived: &DerivedProofParams,
) -> Result<Partition, ProofError> {
    if let Some(&out_of_range) = derived
        .mandatory_indexes
        .iter()
        .find(|&&i| i >= statements.len())
    {
        return Err(ProofError::validation(
            "mandatoryIndexes",
            format!(
                "index {} is out of range for {} statements",
                out_of_range,
                statements.len()
            ),
        ));
    }
    let mandatory_indexes: BTreeSet<usize> = derived.mandatory_indexes.iter().copied().collect();
    let mut partition = Partition {
        mandatory: Vec::new(),
        non_mandatory: Vec::new(),
    };
    for (index, statement) in statements.into_iter().enumerate() {
        if mandatory_indexes.contains(&index) {
            partition.mandatory.push(statement);
        } else {
            partition.non_mandatory.push(statement);
        }
    }
    Ok(partition)
}
