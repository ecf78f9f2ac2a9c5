//! Flattening of JSON documents into statements.
//!
//! Objects become nodes: an `id` names the node (an IRI, or a blank node
//! when it is a `urn:bnid:` skolem id), otherwise the node is a fresh
//! blank node. `type` values become `rdf:type` IRIs. Every other key
//! becomes a predicate under [`VOCAB`]. Keys starting with `@` are
//! processing directives and produce no statements.

use serde_json::{Map, Value};

use ecsd_core::ProofError;

use super::nquads::{Quad, Term};

/// Namespace for predicates and relative `type` values.
pub const VOCAB: &str = "urn:ecsd:vocab:";
/// Prefix of skolemized blank-node ids.
pub const SKOLEM_PREFIX: &str = "urn:bnid:";

pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
pub const XSD_DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";
pub const XSD_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";

/// Convert a JSON object into statements. Blank nodes are labelled
/// `b0`, `b1`, ... in traversal order.
pub fn to_quads(document: &Value) -> Result<Vec<Quad>, ProofError> {
    let root = document
        .as_object()
        .ok_or_else(|| ProofError::validation("document", "must be a JSON object"))?;
    let mut flattener = Flattener::default();
    let subject = flattener.node_term(root)?;
    flattener.emit_node(root, &subject)?;
    Ok(flattener.quads)
}

/// Give every object without an `id` a `urn:bnid:` id so that selections
/// taken from the result keep node identity.
pub fn skolemize(document: &Value) -> Value {
    let mut out = document.clone();
    let mut counter = 0usize;
    skolemize_in_place(&mut out, &mut counter);
    out
}

fn skolemize_in_place(value: &mut Value, counter: &mut usize) {
    match value {
        Value::Object(map) => {
            if !map.contains_key("id") {
                map.insert("id".into(), Value::String(format!("{}b{}", SKOLEM_PREFIX, counter)));
                *counter += 1;
            }
            for (key, child) in map.iter_mut() {
                if !key.starts_with('@') {
                    skolemize_in_place(child, counter);
                }
            }
        }
        Value::Array(items) => items
            .iter_mut()
            .for_each(|item| skolemize_in_place(item, counter)),
        _ => {}
    }
}

#[derive(Default)]
struct Flattener {
    quads: Vec<Quad>,
    next_blank: usize,
}

impl Flattener {
    fn node_term(&mut self, node: &Map<String, Value>) -> Result<Term, ProofError> {
        match node.get("id") {
            Some(Value::String(id)) => Ok(match id.strip_prefix(SKOLEM_PREFIX) {
                Some(label) if !label.is_empty() => Term::Blank(label.to_string()),
                _ => Term::Iri(id.clone()),
            }),
            Some(_) => Err(ProofError::validation("id", "must be a string")),
            None => {
                let label = format!("b{}", self.next_blank);
                self.next_blank += 1;
                Ok(Term::Blank(label))
            }
        }
    }

    fn emit_node(&mut self, node: &Map<String, Value>, subject: &Term) -> Result<(), ProofError> {
        for (key, value) in node {
            if key == "id" || key.starts_with('@') {
                continue;
            }
            if key == "type" {
                self.emit_value(subject, RDF_TYPE, true, value)?;
            } else {
                self.emit_value(subject, &predicate_iri(key), false, value)?;
            }
        }
        Ok(())
    }

    fn emit_value(
        &mut self,
        subject: &Term,
        predicate: &str,
        is_type: bool,
        value: &Value,
    ) -> Result<(), ProofError> {
        let object = match value {
            Value::Null => return Ok(()),
            Value::Array(items) => {
                for item in items {
                    self.emit_value(subject, predicate, is_type, item)?;
                }
                return Ok(());
            }
            Value::Object(node) => {
                let object = self.node_term(node)?;
                self.quads
                    .push(Quad::new(subject.clone(), predicate, object.clone()));
                return self.emit_node(node, &object);
            }
            Value::String(s) if is_type => Term::Iri(type_iri(s)),
            Value::String(s) => Term::Literal {
                value: s.clone(),
                datatype: None,
            },
            Value::Number(n) => Term::Literal {
                value: n.to_string(),
                datatype: Some(if n.is_f64() { XSD_DOUBLE } else { XSD_INTEGER }.into()),
            },
            Value::Bool(b) => Term::Literal {
                value: b.to_string(),
                datatype: Some(XSD_BOOLEAN.into()),
            },
        };
        self.quads
            .push(Quad::new(subject.clone(), predicate, object));
        Ok(())
    }
}

fn type_iri(value: &str) -> String {
    if value.contains(':') {
        value.to_string()
    } else {
        format!("{}{}", VOCAB, percent_encode(value))
    }
}

fn predicate_iri(key: &str) -> String {
    format!("{}{}", VOCAB, percent_encode(key))
}

fn percent_encode(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for byte in term.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~') {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{:02X}", byte));
        }
    }
    out
}
