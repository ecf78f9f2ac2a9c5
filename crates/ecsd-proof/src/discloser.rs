use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde_json::Value;

use ecsd_core::{BaseProofParams, DerivedProofParams, LabelMap, ProofError, SuiteConfig};
use ecsd_crypto::HmacKey;

use crate::canonical::{Canonicalizer, HmacLabeler, StatementGroup};
use crate::proof_set::{find_matching_proof, proof_value, split_proofs};
use crate::proof_value::{parse_base_proof_value, serialize_derived_proof_value};

const MANDATORY: &str = "mandatory";
const SELECTIVE: &str = "selective";
const COMBINED: &str = "combined";

/// Inputs of a derived proof plus the document it reveals.
#[derive(Debug, Clone)]
pub struct DisclosureData {
    pub params: DerivedProofParams,
    pub reveal_document: Value,
}

/// Derives selective-disclosure proofs from base proofs (the holder role).
pub struct ProofDiscloser {
    canonicalizer: Arc<dyn Canonicalizer>,
    config: SuiteConfig,
}

impl ProofDiscloser {
    pub fn new(canonicalizer: Arc<dyn Canonicalizer>, config: SuiteConfig) -> Self {
        Self {
            canonicalizer,
            config,
        }
    }

    /// Derive a secured document that reveals the mandatory statements and
    /// whatever `selective_pointers` selects.
    pub async fn derive(
        &self,
        document: &Value,
        selective_pointers: &[String],
        proof_id: Option<&str>,
    ) -> Result<Value, ProofError> {
        let (unsecured, proofs) = split_proofs(document)?;
        let proof = find_matching_proof(&proofs, &self.config.cryptosuite, proof_id)?;
        let base = parse_base_proof_value(proof_value(&proof)?)?;

        let disclosure = self
            .create_disclosure_data(&unsecured, base, selective_pointers)
            .await?;

        let mut derived_proof = proof;
        if let Value::Object(map) = &mut derived_proof {
            map.insert(
                "proofValue".into(),
                Value::String(serialize_derived_proof_value(&disclosure.params)?),
            );
        }
        let mut revealed = disclosure.reveal_document;
        if let Value::Object(map) = &mut revealed {
            map.insert("proof".into(), derived_proof);
        }

        tracing::info!(
            revealed_signatures = disclosure.params.signatures.len(),
            mandatory_statements = disclosure.params.mandatory_indexes.len(),
            "derived proof created"
        );
        Ok(revealed)
    }

    /// Compute the derived proof inputs for an unsecured document and its
    /// decoded base proof.
    pub async fn create_disclosure_data(
        &self,
        document: &Value,
        base: BaseProofParams,
        selective_pointers: &[String],
    ) -> Result<DisclosureData, ProofError> {
        let nothing_selected = || ProofError::Logic("Nothing selected for disclosure.".into());
        if base.mandatory_pointers.is_empty() && selective_pointers.is_empty() {
            return Err(nothing_selected());
        }

        let labeler = HmacLabeler::new(HmacKey::from_bytes(&base.hmac_key)?);
        let combined_pointers: Vec<String> = base
            .mandatory_pointers
            .iter()
            .chain(selective_pointers)
            .cloned()
            .collect();
        let groups = BTreeMap::from([
            (MANDATORY.to_string(), base.mandatory_pointers.clone()),
            (SELECTIVE.to_string(), selective_pointers.to_vec()),
            (COMBINED.to_string(), combined_pointers.clone()),
        ]);
        let grouped = self
            .canonicalizer
            .canonicalize_and_group(document, &labeler, &groups)
            .await?;
        let mandatory = grouped.group(MANDATORY)?;
        let selective = grouped.group(SELECTIVE)?;
        let combined = grouped.group(COMBINED)?;
        if combined.matching.is_empty() {
            return Err(nothing_selected());
        }

        let mandatory_indexes = relative_mandatory_indexes(combined, mandatory);
        let signatures = filter_signatures(
            &base.signatures,
            grouped.statements.len(),
            mandatory,
            selective,
        )?;

        let reveal_document = self
            .canonicalizer
            .select(document, &combined_pointers)?
            .ok_or_else(nothing_selected)?;

        // The verifier canonicalizes the revealed document on its own, so
        // map its canonical ids back to the blinded labels we signed with.
        let combined_statements: Vec<String> = combined.matching.values().cloned().collect();
        let reveal_ids = self
            .canonicalizer
            .canonical_id_map(&combined_statements)
            .await?;
        let label_map = remap_labels(&reveal_ids, &grouped.label_map)?;

        tracing::debug!(
            statements = grouped.statements.len(),
            revealed = combined.matching.len(),
            mandatory = mandatory_indexes.len(),
            "disclosure data computed"
        );

        Ok(DisclosureData {
            params: DerivedProofParams {
                base_signature: base.base_signature,
                public_key: base.public_key,
                signatures,
                label_map,
                mandatory_indexes,
            },
            reveal_document,
        })
    }
}

/// Positions, within the revealed statements, of the mandatory ones.
fn relative_mandatory_indexes(combined: &StatementGroup, mandatory: &StatementGroup) -> Vec<usize> {
    combined
        .matching
        .keys()
        .enumerate()
        .filter(|(_, absolute)| mandatory.matching.contains_key(absolute))
        .map(|(relative, _)| relative)
        .collect()
}

/// Walk every absolute statement index. Mandatory statements carry no
/// signature; every other statement consumes the next base signature, which
/// is kept when that statement is selectively disclosed.
fn filter_signatures(
    signatures: &[Vec<u8>],
    total: usize,
    mandatory: &StatementGroup,
    selective: &StatementGroup,
) -> Result<Vec<Vec<u8>>, ProofError> {
    let non_mandatory = total - mandatory.matching.len();
    if signatures.len() != non_mandatory {
        return Err(ProofError::Verification(format!(
            "base proof carries {} signatures for {} non-mandatory statements",
            signatures.len(),
            non_mandatory
        )));
    }

    let mut remaining = signatures.iter();
    let mut kept = Vec::new();
    for absolute in 0..total {
        if mandatory.matching.contains_key(&absolute) {
            continue;
        }
        let signature = remaining.next().ok_or_else(|| {
            ProofError::Verification("ran out of base signatures".into())
        })?;
        if selective.matching.contains_key(&absolute) {
            kept.push(signature.clone());
        }
    }
    Ok(kept)
}

/// Compose revealed-document canonical ids with the signer's blinded
/// labels: `c14nN` (as the verifier will see it) → blinded label.
fn remap_labels(
    reveal_ids: &BTreeMap<String, String>,
    signer_labels: &LabelMap,
) -> Result<LabelMap, ProofError> {
    let blinded_to_canonical: HashMap<&str, &str> = signer_labels
        .iter()
        .map(|(canonical, blinded)| (blinded.as_str(), canonical.as_str()))
        .collect();

    let mut label_map = LabelMap::new();
    for (blinded, reveal_id) in reveal_ids {
        let canonical = blinded_to_canonical.get(blinded.as_str()).ok_or_else(|| {
            ProofError::Canonicalization(format!(
                "revealed blank node \"{}\" was not labeled by the base proof",
                blinded
            ))
        })?;
        label_map.insert(reveal_id.clone(), signer_labels[*canonical].clone());
    }
    Ok(label_map)
}
