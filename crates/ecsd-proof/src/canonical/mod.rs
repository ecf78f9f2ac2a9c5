//! Canonicalization: turning documents into ordered statement lists under a
//! chosen blank-node labeling, grouping statements by JSON pointer, and
//! hashing proof options.

pub mod json;
pub mod labeling;
pub mod nquads;
pub mod pointer;

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use ecsd_core::{LabelMap, ProofError};
use ecsd_crypto::{hash_statements, Hash};

pub use labeling::{HmacLabeler, IdentityLabeler, LabelFunction, LabelMapLabeler};

/// Statements of one pointer group, keyed by absolute index in the full
/// canonical statement list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatementGroup {
    pub matching: BTreeMap<usize, String>,
    pub non_matching: BTreeMap<usize, String>,
}

/// Result of [`Canonicalizer::canonicalize_and_group`].
#[derive(Debug, Clone, Default)]
pub struct GroupedStatements {
    /// Every statement of the document, sorted and relabeled.
    pub statements: Vec<String>,
    /// Canonical id → emitted label.
    pub label_map: LabelMap,
    pub groups: BTreeMap<String, StatementGroup>,
}

impl GroupedStatements {
    pub fn group(&self, name: &str) -> Result<&StatementGroup, ProofError> {
        self.groups.get(name).ok_or_else(|| {
            ProofError::Canonicalization(format!("missing statement group \"{}\"", name))
        })
    }
}

/// Canonicalization backend used by the signer, discloser, and verifier.
#[async_trait]
pub trait Canonicalizer: Send + Sync {
    /// Canonical statements of `document`, relabeled by `labeler`, sorted
    /// and de-duplicated.
    async fn canonicalize(
        &self,
        document: &Value,
        labeler: &dyn LabelFunction,
    ) -> Result<Vec<String>, ProofError>;

    /// Canonicalize and split the statements into one group per named
    /// pointer list.
    async fn canonicalize_and_group(
        &self,
        document: &Value,
        labeler: &dyn LabelFunction,
        groups: &BTreeMap<String, Vec<String>>,
    ) -> Result<GroupedStatements, ProofError>;

    /// Canonical id (`c14nN`) for every blank-node label used in
    /// `statements`.
    async fn canonical_id_map(
        &self,
        statements: &[String],
    ) -> Result<BTreeMap<String, String>, ProofError>;

    /// Select the parts of `document` named by `pointers`.
    fn select(&self, document: &Value, pointers: &[String]) -> Result<Option<Value>, ProofError>;

    /// Hash of the canonical proof options (`proofValue` removed, the
    /// document's `@context` added).
    async fn hash_proof_options(
        &self,
        document: &Value,
        proof_options: &Value,
    ) -> Result<Hash, ProofError>;
}

/// Reference canonicalizer over plain JSON documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCanonicalizer;

struct Labeled {
    statements: Vec<String>,
    label_map: LabelMap,
    /// Input blank-node label → emitted label.
    relabeling: BTreeMap<String, String>,
}

impl JsonCanonicalizer {
    pub fn new() -> Self {
        Self
    }

    fn label(
        quads: &[nquads::Quad],
        labeler: &dyn LabelFunction,
    ) -> Result<Labeled, ProofError> {
        let ids = labeling::canonical_id_map(quads);
        let canonical_ids: Vec<String> = ids.values().cloned().collect();
        let label_map = labeler.label_map(&canonical_ids)?;

        let mut relabeling = BTreeMap::new();
        for (input, canonical) in &ids {
            let label = label_map.get(canonical).ok_or_else(|| {
                ProofError::Canonicalization(format!("no label assigned to \"{}\"", canonical))
            })?;
            relabeling.insert(input.clone(), label.clone());
        }
        let statements = Self::relabel(quads, &relabeling)?;
        Ok(Labeled {
            statements,
            label_map,
            relabeling,
        })
    }

    fn relabel(
        quads: &[nquads::Quad],
        relabeling: &BTreeMap<String, String>,
    ) -> Result<Vec<String>, ProofError> {
        let mut statements = quads
            .iter()
            .map(|quad| {
                quad.relabel(|label| {
                    relabeling.get(label).cloned().ok_or_else(|| {
                        ProofError::Canonicalization(format!(
                            "blank node \"{}\" has no label",
                            label
                        ))
                    })
                })
                .map(|q| q.to_nquad())
            })
            .collect::<Result<Vec<_>, _>>()?;
        statements.sort();
        statements.dedup();
        Ok(statements)
    }
}

#[async_trait]
impl Canonicalizer for JsonCanonicalizer {
    async fn canonicalize(
        &self,
        document: &Value,
        labeler: &dyn LabelFunction,
    ) -> Result<Vec<String>, ProofError> {
        let quads = json::to_quads(document)?;
        Ok(Self::label(&quads, labeler)?.statements)
    }

    async fn canonicalize_and_group(
        &self,
        document: &Value,
        labeler: &dyn LabelFunction,
        groups: &BTreeMap<String, Vec<String>>,
    ) -> Result<GroupedStatements, ProofError> {
        let skolemized = json::skolemize(document);
        let quads = json::to_quads(&skolemized)?;
        let labeled = Self::label(&quads, labeler)?;
        let positions: HashMap<&str, usize> = labeled
            .statements
            .iter()
            .enumerate()
            .map(|(i, s)| (s.as_str(), i))
            .collect();

        let mut grouped = BTreeMap::new();
        for (name, pointers) in groups {
            let selected = match pointer::select_by_pointers(&skolemized, pointers)? {
                Some(selection) => Self::relabel(&json::to_quads(&selection)?, &labeled.relabeling)?,
                None => Vec::new(),
            };
            let mut matches = BTreeSet::new();
            for statement in &selected {
                let index = positions.get(statement.as_str()).ok_or_else(|| {
                    ProofError::Canonicalization(format!(
                        "selected statement is not part of the document: {}",
                        statement.trim_end()
                    ))
                })?;
                matches.insert(*index);
            }

            let mut group = StatementGroup::default();
            for (index, statement) in labeled.statements.iter().enumerate() {
                if matches.contains(&index) {
                    group.matching.insert(index, statement.clone());
                } else {
                    group.non_matching.insert(index, statement.clone());
                }
            }
            tracing::trace!(
                group = %name,
                matching = group.matching.len(),
                non_matching = group.non_matching.len(),
                "statement group built"
            );
            grouped.insert(name.clone(), group);
        }

        Ok(GroupedStatements {
            statements: labeled.statements,
            label_map: labeled.label_map,
            groups: grouped,
        })
    }

    async fn canonical_id_map(
        &self,
        statements: &[String],
    ) -> Result<BTreeMap<String, String>, ProofError> {
        let quads = statements
            .iter()
            .map(|s| nquads::parse_nquad(s))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(labeling::canonical_id_map(&quads))
    }

    fn select(&self, document: &Value, pointers: &[String]) -> Result<Option<Value>, ProofError> {
        pointer::select_by_pointers(document, pointers)
    }

    async fn hash_proof_options(
        &self,
        document: &Value,
        proof_options: &Value,
    ) -> Result<Hash, ProofError> {
        let mut options = proof_options
            .as_object()
            .cloned()
            .ok_or_else(|| ProofError::validation("proof", "must be a JSON object"))?;
        options.remove("proofValue");
        if let Some(context) = document.get("@context") {
            options.insert("@context".into(), context.clone());
        }
        let quads = json::to_quads(&Value::Object(options))?;
        let statements = Self::label(&quads, &IdentityLabeler)?.statements;
        Ok(hash_statements(&statements))
    }
}
