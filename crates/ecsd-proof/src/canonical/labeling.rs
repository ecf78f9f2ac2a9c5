//! Canonical blank-node identifiers and the label functions applied on top
//! of them.
//!
//! Canonical ids come from iterated colour refinement: every blank node
//! starts with the same colour, and each round hashes a node's previous
//! colour with the sorted statements it appears in (itself written as
//! `_:a`, neighbours as their current colour). Rounds stop once the number
//! of colour classes no longer grows. Nodes are then ordered by colour and
//! numbered `c14n0`, `c14n1`, ...

use std::collections::{BTreeMap, BTreeSet};

use ecsd_core::{LabelMap, ProofError};
use ecsd_crypto::HmacKey;

use super::nquads::Quad;

/// Maps canonical ids (`c14nN`) to the labels written into statements.
pub trait LabelFunction: Send + Sync {
    fn label_map(&self, canonical_ids: &[String]) -> Result<LabelMap, ProofError>;
}

/// Blinds each canonical id with HMAC-SHA-256 (`'u' || base64url(hmac)`).
#[derive(Clone)]
pub struct HmacLabeler {
    key: HmacKey,
}

impl HmacLabeler {
    pub fn new(key: HmacKey) -> Self {
        Self { key }
    }
}

impl LabelFunction for HmacLabeler {
    fn label_map(&self, canonical_ids: &[String]) -> Result<LabelMap, ProofError> {
        canonical_ids
            .iter()
            .map(|id| Ok((id.clone(), self.key.blind_label(id)?)))
            .collect()
    }
}

/// Replays a label map carried by a derived proof.
#[derive(Debug, Clone)]
pub struct LabelMapLabeler {
    label_map: LabelMap,
}

impl LabelMapLabeler {
    pub fn new(label_map: LabelMap) -> Self {
        Self { label_map }
    }
}

impl LabelFunction for LabelMapLabeler {
    fn label_map(&self, canonical_ids: &[String]) -> Result<LabelMap, ProofError> {
        canonical_ids
            .iter()
            .map(|id| {
                let label = self.label_map.get(id).ok_or_else(|| {
                    ProofError::validation("labelMap", format!("no entry for \"{}\"", id))
                })?;
                Ok((id.clone(), label.clone()))
            })
            .collect()
    }
}

/// Keeps canonical ids as they are.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityLabeler;

impl LabelFunction for IdentityLabeler {
    fn label_map(&self, canonical_ids: &[String]) -> Result<LabelMap, ProofError> {
        Ok(canonical_ids
            .iter()
            .map(|id| (id.clone(), id.clone()))
            .collect())
    }
}

/// Input blank-node label → canonical id (`c14nN`, without `_:`).
///
/// Statements are treated as a set: repeats (e.g. `["a", "a"]` in JSON)
/// do not change the ids.
pub fn canonical_id_map(quads: &[Quad]) -> BTreeMap<String, String> {
    let unique: BTreeSet<&Quad> = quads.iter().collect();
    let quads: Vec<&Quad> = unique.into_iter().collect();
    let quads = quads.as_slice();

    let mut mentions: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (i, quad) in quads.iter().enumerate() {
        for label in quad.blank_labels() {
            let entry = mentions.entry(label).or_default();
            if entry.last() != Some(&i) {
                entry.push(i);
            }
        }
    }

    let mut colours: BTreeMap<&str, String> =
        mentions.keys().map(|label| (*label, String::new())).collect();
    let mut classes = usize::from(!colours.is_empty());
    for _ in 0..=mentions.len() {
        let next: BTreeMap<&str, String> = mentions
            .iter()
            .map(|(label, quad_indexes)| {
                (*label, refine(label, quad_indexes, quads, &colours))
            })
            .collect();
        let next_classes = next.values().collect::<BTreeSet<_>>().len();
        colours = next;
        if next_classes == classes {
            break;
        }
        classes = next_classes;
    }

    let mut ordered: Vec<(&String, &str)> = colours.iter().map(|(l, c)| (c, *l)).collect();
    ordered.sort();
    ordered
        .into_iter()
        .enumerate()
        .map(|(i, (_, label))| (label.to_string(), format!("c14n{}", i)))
        .collect()
}

fn refine(
    label: &str,
    quad_indexes: &[usize],
    quads: &[&Quad],
    colours: &BTreeMap<&str, String>,
) -> String {
    let mut lines: Vec<String> = quad_indexes
        .iter()
        .filter_map(|&i| {
            quads[i]
                .relabel(|other| {
                    Ok(if other == label {
                        "a".to_string()
                    } else {
                        format!("z{}", colours.get(other).map(String::as_str).unwrap_or(""))
                    })
                })
                .ok()
        })
        .map(|q| q.to_nquad())
        .collect();
    lines.sort();

    let own = colours.get(label).map(String::as_str).unwrap_or("");
    let mut input = String::with_capacity(own.len() + lines.iter().map(String::len).sum::<usize>());
    input.push_str(own);
    for line in &lines {
        input.push_str(line);
    }
    hex::encode(ecsd_crypto::hash(input.as_bytes()))
}
