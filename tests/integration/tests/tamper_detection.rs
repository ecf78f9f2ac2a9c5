//! Integration test: tampered proofs and documents.
//!
//! Every single-field modification of a derived proof must either verify
//! as false or raise an error; it must never verify as true.

use serde_json::{json, Value};

use ecsd_core::{DerivedProofParams, ProofError};
use ecsd_integration_tests::{
    credential, label, pointers, proof_value, suite, with_proof_value, Issuer,
};
use ecsd_proof::{
    parse_base_proof_value, parse_derived_proof_value, serialize_base_proof_value,
    serialize_derived_proof_value,
};

struct Fixture {
    issuer: Issuer,
    signed: Value,
    derived: Value,
}

async fn fixture() -> Fixture {
    let issuer = Issuer::generate();
    let suite = suite();
    let signed = suite
        .sign(
            &credential(),
            &issuer.keypair,
            &issuer.verification_method,
            &pointers(&["/issuer", "/credentialSubject/id"]),
        )
        .await
        .expect("signing should succeed");
    let derived = suite
        .derive(
            &signed,
            &pointers(&["/credentialSubject/name", "/credentialSubject/alumniOf"]),
            None,
        )
        .await
        .expect("derivation should succeed");
    Fixture {
        issuer,
        signed,
        derived,
    }
}

fn derived_params(document: &Value) -> DerivedProofParams {
    parse_derived_proof_value(&proof_value(document)).unwrap()
}

fn with_params(document: &Value, params: &DerivedProofParams) -> Value {
    with_proof_value(document, serialize_derived_proof_value(params).unwrap())
}

async fn verifies(fixture: &Fixture, document: &Value) -> Result<bool, ProofError> {
    suite().verify(document, fixture.issuer.resolver()).await
}

async fn assert_not_accepted(fixture: &Fixture, document: &Value, what: &str) {
    match verifies(fixture, document).await {
        Ok(true) => panic!("tampered {} still verified", what),
        Ok(false) | Err(_) => {}
    }
}

#[tokio::test]
async fn test_untampered_fixture_verifies() {
    let f = fixture().await;
    assert!(verifies(&f, &f.signed).await.unwrap());
    assert!(verifies(&f, &f.derived).await.unwrap());
}

// =========================================================================
// Derived proof fields
// =========================================================================

#[tokio::test]
async fn test_flipped_base_signature_bit() {
    let f = fixture().await;
    let mut params = derived_params(&f.derived);
    params.base_signature[17] ^= 0x01;
    let tampered = with_params(&f.derived, &params);
    assert!(!verifies(&f, &tampered).await.unwrap());
}

#[tokio::test]
async fn test_flipped_public_key_bit() {
    let f = fixture().await;
    for byte in [0usize, 2, 20, 34] {
        let mut params = derived_params(&f.derived);
        params.public_key[byte] ^= 0x01;
        let tampered = with_params(&f.derived, &params);
        assert!(
            !verifies(&f, &tampered).await.unwrap(),
            "public key byte {}",
            byte
        );
    }
}

#[tokio::test]
async fn test_flipped_statement_signature_bit() {
    let f = fixture().await;
    let mut params = derived_params(&f.derived);
    assert!(!params.signatures.is_empty());
    let last = params.signatures.len() - 1;
    params.signatures[last][5] ^= 0x01;
    let tampered = with_params(&f.derived, &params);

    let report = suite()
        .verify_with_report(&tampered, f.issuer.resolver())
        .await
        .unwrap();
    assert!(!report.verified);
    assert_eq!(report.failed_statements, vec![last]);
    assert!(report
        .checks
        .iter()
        .any(|c| c.name == "statement_signatures" && !c.passed));
    assert!(report
        .checks
        .iter()
        .any(|c| c.name == "base_signature" && c.passed));
}

#[tokio::test]
async fn test_replaced_label_map_entry() {
    let f = fixture().await;
    let mut params = derived_params(&f.derived);
    let key = params.label_map.keys().next().cloned().unwrap();
    params.label_map.insert(key, label(&[0xaa; 32]));
    let tampered = with_params(&f.derived, &params);
    assert_not_accepted(&f, &tampered, "label map").await;
}

#[tokio::test]
async fn test_changed_mandatory_indexes() {
    let f = fixture().await;
    let original = derived_params(&f.derived);

    let mut dropped = original.clone();
    dropped.mandatory_indexes.pop();
    assert_not_accepted(&f, &with_params(&f.derived, &dropped), "mandatory indexes").await;

    let mut shifted = original.clone();
    if let Some(first) = shifted.mandatory_indexes.first_mut() {
        *first += 1;
    }
    shifted.mandatory_indexes.dedup();
    assert_not_accepted(&f, &with_params(&f.derived, &shifted), "mandatory indexes").await;
}

// =========================================================================
// Revealed document
// =========================================================================

#[tokio::test]
async fn test_modified_disclosed_value() {
    let f = fixture().await;
    let mut tampered = f.derived.clone();
    tampered["credentialSubject"]["name"] = json!("Mallory");
    assert!(!verifies(&f, &tampered).await.unwrap());
}

#[tokio::test]
async fn test_modified_mandatory_value() {
    let f = fixture().await;
    let mut tampered = f.derived.clone();
    tampered["issuer"] = json!("did:example:forged");
    let report = suite()
        .verify_with_report(&tampered, f.issuer.resolver())
        .await
        .unwrap();
    assert!(!report.verified);
    assert!(report
        .checks
        .iter()
        .any(|c| c.name == "base_signature" && !c.passed));
}

#[tokio::test]
async fn test_modified_proof_options() {
    let f = fixture().await;
    let mut tampered = f.derived.clone();
    tampered["proof"]["created"] = json!("1999-01-01T00:00:00Z");
    assert!(!verifies(&f, &tampered).await.unwrap());
}

#[tokio::test]
async fn test_modified_base_proof_statement() {
    let f = fixture().await;
    let mut tampered = f.signed.clone();
    tampered["credentialSubject"]["birthYear"] = json!(1990);
    assert!(!verifies(&f, &tampered).await.unwrap());
}

#[tokio::test]
async fn test_revealed_extra_statement() {
    let f = fixture().await;
    let mut tampered = f.derived.clone();
    tampered["credentialSubject"]["birthYear"] = json!(1995);
    let result = verifies(&f, &tampered).await;
    assert!(matches!(result, Err(ProofError::Verification(_))));
}

// =========================================================================
// Count invariant and malformed input
// =========================================================================

#[tokio::test]
async fn test_extra_signature_is_count_error() {
    let f = fixture().await;
    let mut params = derived_params(&f.derived);
    params.signatures.push(vec![0x42; 64]);
    let result = verifies(&f, &with_params(&f.derived, &params)).await;
    assert!(matches!(result, Err(ProofError::Verification(_))));
}

#[tokio::test]
async fn test_base_proof_missing_signature_is_count_error() {
    let f = fixture().await;
    let mut base = parse_base_proof_value(&proof_value(&f.signed)).unwrap();
    base.signatures.pop();
    let tampered = with_proof_value(&f.signed, serialize_base_proof_value(&base).unwrap());
    let result = verifies(&f, &tampered).await;
    assert!(matches!(result, Err(ProofError::Verification(_))));

    let err = suite()
        .derive(&tampered, &pointers(&["/credentialSubject/name"]), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ProofError::Verification(_)));
}

#[tokio::test]
async fn test_missing_multibase_prefix() {
    let f = fixture().await;
    let value = proof_value(&f.derived);
    let tampered = with_proof_value(&f.derived, value[1..].to_string());
    let result = verifies(&f, &tampered).await;
    assert!(matches!(result, Err(ProofError::Format(_))));
}

#[tokio::test]
async fn test_base_proof_where_derived_expected() {
    let f = fixture().await;
    let err = parse_derived_proof_value(&proof_value(&f.signed)).unwrap_err();
    assert!(matches!(err, ProofError::Format(_)));
    let err = parse_base_proof_value(&proof_value(&f.derived)).unwrap_err();
    assert!(matches!(err, ProofError::Format(_)));
}

#[tokio::test]
async fn test_derive_from_derived_proof_fails() {
    let f = fixture().await;
    let err = suite()
        .derive(&f.derived, &pointers(&["/credentialSubject/name"]), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ProofError::Format(_)));
}

#[tokio::test]
async fn test_garbage_proof_value() {
    let f = fixture().await;
    let tampered = with_proof_value(&f.derived, "u!!!not-base64".into());
    let result = verifies(&f, &tampered).await;
    assert!(matches!(result, Err(e) if e.is_malformed_input()));
}

#[tokio::test]
async fn test_other_cryptosuite_proof_ignored() {
    let f = fixture().await;
    let mut other = f.derived.clone();
    other["proof"]["cryptosuite"] = json!("bbs-2023");
    let result = verifies(&f, &other).await;
    assert!(matches!(result, Err(ProofError::Logic(_))));
}
