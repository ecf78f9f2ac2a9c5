//! Binary proof-value codec.
//!
//! A proof value is `'u' || base64url-nopad(header || cbor(components))`
//! where `header` distinguishes base payloads from derived payloads and
//! `components` is a fixed-arity CBOR array. Every field is validated
//! before encoding and after decoding.

use multibase::Base;
use serde_cbor::Value;
use std::collections::BTreeMap;

use ecsd_core::types::{BaseProofParams, DerivedProofParams, LabelMap, ProofParams, VerifyData};
use ecsd_core::types::{CompressedLabelMap, HASH_LENGTH};
use ecsd_core::ProofError;

/// Header of a base proof payload.
pub const BASE_PROOF_HEADER: [u8; 3] = [0xd9, 0x5d, 0x00];
/// Header of a derived proof payload.
pub const DERIVED_PROOF_HEADER: [u8; 3] = [0xd9, 0x5d, 0x01];

/// CBOR tag for a typed byte array; accepted around byte strings on decode.
const TYPED_BYTES_TAG: u64 = 64;
const BASE_COMPONENTS: usize = 5;
const DERIVED_COMPONENTS: usize = 5;
const CANONICAL_ID_PREFIX: &str = "c14n";

/// Encode base proof params as a proof-value string.
pub fn serialize_base_proof_value(params: &BaseProofParams) -> Result<String, ProofError> {
    params.validate()?;
    let components = Value::Array(vec![
        Value::Bytes(params.base_signature.clone()),
        Value::Bytes(params.public_key.clone()),
        Value::Bytes(params.hmac_key.clone()),
        byte_array(&params.signatures),
        Value::Array(
            params
                .mandatory_pointers
                .iter()
                .map(|p| Value::Text(p.clone()))
                .collect(),
        ),
    ]);
    encode(&BASE_PROOF_HEADER, &components)
}

/// Encode derived proof params as a proof-value string.
pub fn serialize_derived_proof_value(params: &DerivedProofParams) -> Result<String, ProofError> {
    params.validate()?;
    let compressed = compress_label_map(&params.label_map)?;
    let label_map = compressed
        .into_iter()
        .map(|(k, v)| (Value::Integer(i128::from(k)), Value::Bytes(v)))
        .collect::<BTreeMap<_, _>>();
    let components = Value::Array(vec![
        Value::Bytes(params.base_signature.clone()),
        Value::Bytes(params.public_key.clone()),
        byte_array(&params.signatures),
        Value::Map(label_map),
        Value::Array(
            params
                .mandatory_indexes
                .iter()
                .map(|&i| Value::Integer(i as i128))
                .collect(),
        ),
    ]);
    encode(&DERIVED_PROOF_HEADER, &components)
}

/// Decode a base proof value. Fails with a format error for derived payloads.
pub fn parse_base_proof_value(proof_value: &str) -> Result<BaseProofParams, ProofError> {
    let payload = decode_envelope(proof_value)?;
    if header_of(&payload)? != BASE_PROOF_HEADER {
        return Err(ProofError::Format(
            "\"proofValue\" must be a base proof".into(),
        ));
    }
    decode_base(&payload[BASE_PROOF_HEADER.len()..])
}

/// Decode a derived proof value. Fails with a format error for base payloads.
pub fn parse_derived_proof_value(proof_value: &str) -> Result<DerivedProofParams, ProofError> {
    let payload = decode_envelope(proof_value)?;
    if header_of(&payload)? != DERIVED_PROOF_HEADER {
        return Err(ProofError::Format(
            "\"proofValue\" must be a derived proof".into(),
        ));
    }
    decode_derived(&payload[DERIVED_PROOF_HEADER.len()..])
}

/// Decode either kind of proof value, choosing by header.
pub fn parse_proof_value(proof_value: &str) -> Result<ProofParams, ProofError> {
    let payload = decode_envelope(proof_value)?;
    let header = header_of(&payload)?;
    let body = &payload[header.len()..];
    if header == BASE_PROOF_HEADER {
        decode_base(body).map(ProofParams::Base)
    } else if header == DERIVED_PROOF_HEADER {
        decode_derived(body).map(ProofParams::Derived)
    } else {
        Err(ProofError::Format(format!(
            "unknown proof header 0x{}",
            hex::encode(header)
        )))
    }
}

/// `proofHash || publicKey || mandatoryHash`.
pub fn serialize_verify_data(
    proof_hash: [u8; HASH_LENGTH],
    public_key: &[u8],
    mandatory_hash: [u8; HASH_LENGTH],
) -> Result<Vec<u8>, ProofError> {
    Ok(VerifyData::new(proof_hash, public_key.to_vec(), mandatory_hash)?.to_bytes())
}

/// Strip `c14n` from every key and the multibase tag from every value.
pub fn compress_label_map(label_map: &LabelMap) -> Result<CompressedLabelMap, ProofError> {
    let mut compressed = CompressedLabelMap::new();
    for (key, value) in label_map {
        let index = parse_canonical_id(key).ok_or_else(|| {
            ProofError::validation(
                "labelMap",
                format!("key \"{}\" must match c14n<non-negative integer>", key),
            )
        })?;
        compressed.insert(index, decode_label(value)?);
    }
    Ok(compressed)
}

/// Exact inverse of [`compress_label_map`].
pub fn decompress_label_map(compressed: &CompressedLabelMap) -> LabelMap {
    compressed
        .iter()
        .map(|(index, bytes)| {
            (
                format!("{}{}", CANONICAL_ID_PREFIX, index),
                multibase::encode(Base::Base64Url, bytes),
            )
        })
        .collect()
}

/// Check every key and value of an expanded label map.
pub fn validate_label_map(label_map: &LabelMap) -> Result<(), ProofError> {
    compress_label_map(label_map).map(|_| ())
}

/// Parse a canonical blank-node id (`c14n<N>`, canonical decimal `N`).
pub fn parse_canonical_id(id: &str) -> Option<u64> {
    let digits = id.strip_prefix(CANONICAL_ID_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if digits.len() > 1 && digits.starts_with('0') {
        return None;
    }
    digits.parse().ok()
}

fn decode_label(value: &str) -> Result<Vec<u8>, ProofError> {
    let invalid = || {
        ProofError::validation(
            "labelMap",
            format!("value \"{}\" must be a 'u'-tagged base64url string", value),
        )
    };
    if !value.starts_with('u') {
        return Err(invalid());
    }
    let (base, bytes) = multibase::decode(value).map_err(|_| invalid())?;
    if base != Base::Base64Url || multibase::encode(Base::Base64Url, &bytes) != value {
        return Err(invalid());
    }
    Ok(bytes)
}

fn encode(header: &[u8; 3], components: &Value) -> Result<String, ProofError> {
    let body = serde_cbor::to_vec(components)
        .map_err(|e| ProofError::Format(format!("cbor encoding failed: {}", e)))?;
    let mut payload = Vec::with_capacity(header.len() + body.len());
    payload.extend_from_slice(header);
    payload.extend_from_slice(&body);
    Ok(multibase::encode(Base::Base64Url, payload))
}

fn decode_envelope(proof_value: &str) -> Result<Vec<u8>, ProofError> {
    if !proof_value.starts_with('u') {
        return Err(ProofError::Format(
            "\"proofValue\" must be a multibase-encoded base64url value ('u' prefix)".into(),
        ));
    }
    let (base, payload) = multibase::decode(proof_value)
        .map_err(|e| ProofError::Format(format!("\"proofValue\" is not valid base64url: {}", e)))?;
    if base != Base::Base64Url {
        return Err(ProofError::Format(
            "\"proofValue\" must be base64url without padding".into(),
        ));
    }
    Ok(payload)
}

fn header_of(payload: &[u8]) -> Result<[u8; 3], ProofError> {
    match payload.get(..3) {
        Some(&[a, b, c]) => Ok([a, b, c]),
        _ => Err(ProofError::Format(
            "\"proofValue\" is too short to carry a proof header".into(),
        )),
    }
}

fn decode_components(body: &[u8], arity: usize) -> Result<Vec<Value>, ProofError> {
    let value: Value = serde_cbor::from_slice(body)
        .map_err(|e| ProofError::Format(format!("cbor decoding failed: {}", e)))?;
    match value {
        Value::Array(components) if components.len() == arity => Ok(components),
        Value::Array(components) => Err(ProofError::Format(format!(
            "proof payload must have {} components, got {}",
            arity,
            components.len()
        ))),
        _ => Err(ProofError::Format("proof payload must be an array".into())),
    }
}

fn decode_base(body: &[u8]) -> Result<BaseProofParams, ProofError> {
    let mut components = decode_components(body, BASE_COMPONENTS)?.into_iter();
    let mut next = || components.next().unwrap_or(Value::Null);
    let params = BaseProofParams {
        base_signature: as_bytes(next(), "baseSignature")?,
        public_key: as_bytes(next(), "publicKey")?,
        hmac_key: as_bytes(next(), "hmacKey")?,
        signatures: as_byte_array(next(), "signatures")?,
        mandatory_pointers: as_array(next(), "mandatoryPointers")?
            .into_iter()
            .map(|v| as_text(v, "mandatoryPointers"))
            .collect::<Result<_, _>>()?,
    };
    params.validate()?;
    Ok(params)
}

fn decode_derived(body: &[u8]) -> Result<DerivedProofParams, ProofError> {
    let mut components = decode_components(body, DERIVED_COMPONENTS)?.into_iter();
    let mut next = || components.next().unwrap_or(Value::Null);
    let base_signature = as_bytes(next(), "baseSignature")?;
    let public_key = as_bytes(next(), "publicKey")?;
    let signatures = as_byte_array(next(), "signatures")?;
    let compressed = as_compressed_label_map(next())?;
    let mandatory_indexes = as_array(next(), "mandatoryIndexes")?
        .into_iter()
        .map(|v| as_index(v, "mandatoryIndexes"))
        .collect::<Result<_, _>>()?;
    let params = DerivedProofParams {
        base_signature,
        public_key,
        signatures,
        label_map: decompress_label_map(&compressed),
        mandatory_indexes,
    };
    params.validate()?;
    validate_label_map(&params.label_map)?;
    Ok(params)
}

fn byte_array(items: &[Vec<u8>]) -> Value {
    Value::Array(items.iter().map(|b| Value::Bytes(b.clone())).collect())
}

fn as_bytes(value: Value, field: &str) -> Result<Vec<u8>, ProofError> {
    match value {
        Value::Bytes(bytes) => Ok(bytes),
        Value::Tag(TYPED_BYTES_TAG, inner) => as_bytes(*inner, field),
        _ => Err(ProofError::validation(field, "must be a byte string")),
    }
}

fn as_array(value: Value, field: &str) -> Result<Vec<Value>, ProofError> {
    match value {
        Value::Array(items) => Ok(items),
        _ => Err(ProofError::validation(field, "must be an array")),
    }
}

fn as_byte_array(value: Value, field: &str) -> Result<Vec<Vec<u8>>, ProofError> {
    as_array(value, field)?
        .into_iter()
        .map(|v| as_bytes(v, field))
        .collect()
}

fn as_text(value: Value, field: &str) -> Result<String, ProofError> {
    match value {
        Value::Text(text) => Ok(text),
        _ => Err(ProofError::validation(field, "must be an array of strings")),
    }
}

fn as_index(value: Value, field: &str) -> Result<usize, ProofError> {
    match value {
        Value::Integer(i) => usize::try_from(i)
            .map_err(|_| ProofError::validation(field, "must be non-negative integers")),
        _ => Err(ProofError::validation(field, "must be an array of integers")),
    }
}

fn as_compressed_label_map(value: Value) -> Result<CompressedLabelMap, ProofError> {
    let entries = match value {
        Value::Map(entries) => entries,
        _ => return Err(ProofError::validation("labelMap", "must be a map")),
    };
    let mut compressed = CompressedLabelMap::new();
    for (key, value) in entries {
        let index = match key {
            Value::Integer(i) => u64::try_from(i).map_err(|_| {
                ProofError::validation("labelMap", "keys must be non-negative integers")
            })?,
            _ => {
                return Err(ProofError::validation(
                    "labelMap",
                    "compressed keys must be integers",
                ))
            }
        };
        compressed.insert(index, as_bytes(value, "labelMap")?);
    }
    Ok(compressed)
}
