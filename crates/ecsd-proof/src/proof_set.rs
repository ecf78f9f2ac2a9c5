//! Locating proofs on a secured document.

use serde_json::Value;

use ecsd_core::{ProofError, PROOF_TYPE};

/// Split a secured document into the unsecured document and its proofs.
/// `proof` may be a single object or an array.
pub fn split_proofs(document: &Value) -> Result<(Value, Vec<Value>), ProofError> {
    let mut unsecured = document
        .as_object()
        .cloned()
        .ok_or_else(|| ProofError::validation("document", "must be a JSON object"))?;
    let proofs = match unsecured.remove("proof") {
        None => Vec::new(),
        Some(Value::Array(proofs)) => proofs,
        Some(proof @ Value::Object(_)) => vec![proof],
        Some(_) => {
            return Err(ProofError::validation(
                "proof",
                "must be an object or an array of objects",
            ))
        }
    };
    Ok((Value::Object(unsecured), proofs))
}

/// Whether `proof` is a data integrity proof of `cryptosuite`.
pub fn is_suite_proof(proof: &Value, cryptosuite: &str) -> bool {
    proof.get("type").and_then(Value::as_str) == Some(PROOF_TYPE)
        && proof.get("cryptosuite").and_then(Value::as_str) == Some(cryptosuite)
}

/// Pick the single base proof to derive from.
pub fn find_matching_proof(
    proofs: &[Value],
    cryptosuite: &str,
    proof_id: Option<&str>,
) -> Result<Value, ProofError> {
    let mut matches = proofs.iter().filter(|proof| {
        is_suite_proof(proof, cryptosuite)
            && proof_id.map_or(true, |id| proof.get("id").and_then(Value::as_str) == Some(id))
    });
    let first = matches.next().ok_or_else(|| {
        ProofError::Logic(
            "No matching base proof found from which to derive a disclosure proof.".into(),
        )
    })?;
    if matches.next().is_some() {
        return Err(ProofError::Logic(
            "Multiple matching proofs; a 'proofId' must be specified.".into(),
        ));
    }
    Ok(first.clone())
}

/// Append `proof` to whatever proofs `document` already carries.
pub fn attach_proof(document: &Value, proof: Value) -> Result<Value, ProofError> {
    let (mut secured, mut proofs) = split_proofs(document)?;
    proofs.push(proof);
    let proof = if proofs.len() == 1 {
        proofs.remove(0)
    } else {
        Value::Array(proofs)
    };
    if let Value::Object(map) = &mut secured {
        map.insert("proof".into(), proof);
    }
    Ok(secured)
}

pub fn proof_value(proof: &Value) -> Result<&str, ProofError> {
    string_field(proof, "proofValue")
}

pub fn verification_method(proof: &Value) -> Result<&str, ProofError> {
    string_field(proof, "verificationMethod")
}

fn string_field<'a>(proof: &'a Value, field: &str) -> Result<&'a str, ProofError> {
    proof
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| ProofError::validation(field, "must be a string"))
}
