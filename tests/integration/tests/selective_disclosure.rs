//! Integration test: issuer → holder → verifier selective disclosure.
//!
//! Signs with ecsd-proof's cryptosuite, derives disclosures, and verifies
//! them against issuer keys resolved through ecsd-proof resolvers.

use std::sync::Arc;

use serde_json::json;

use ecsd_core::{ProofError, SuiteConfig};
use ecsd_crypto::KeyPair;
use ecsd_integration_tests::{credential, pointers, proof_value, suite, suite_with, Issuer};
use ecsd_proof::proof_set::attach_proof;
use ecsd_proof::{
    parse_base_proof_value, parse_derived_proof_value, Canonicalizer, DidKeyResolver,
    JsonCanonicalizer, LabelMapLabeler,
};

// =========================================================================
// Base proofs
// =========================================================================

#[tokio::test]
async fn test_base_proof_verifies() {
    let issuer = Issuer::generate();
    let suite = suite();
    let signed = suite
        .sign(
            &credential(),
            &issuer.keypair,
            &issuer.verification_method,
            &pointers(&["/issuer"]),
        )
        .await
        .expect("signing should succeed");

    assert_eq!(signed["proof"]["type"], "DataIntegrityProof");
    assert_eq!(signed["proof"]["cryptosuite"], "ecdsa-sd-2023");
    assert_eq!(signed["proof"]["proofPurpose"], "assertionMethod");
    assert!(proof_value(&signed).starts_with('u'));

    let base = parse_base_proof_value(&proof_value(&signed)).unwrap();
    assert_eq!(base.mandatory_pointers, pointers(&["/issuer"]));

    let report = suite
        .verify_with_report(&signed, issuer.resolver())
        .await
        .unwrap();
    assert!(report.verified);
    assert!(report.checks.iter().all(|c| c.passed));
    assert_eq!(
        report.checks.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
        vec!["statement_count", "statement_signatures", "base_signature"]
    );
}

#[tokio::test]
async fn test_base_proof_with_did_key() {
    let keypair = KeyPair::generate();
    let vm = keypair.public_key().to_did_key_verification_method();
    let suite = suite();
    let signed = suite.sign(&credential(), &keypair, &vm, &[]).await.unwrap();
    assert!(suite.verify(&signed, Arc::new(DidKeyResolver)).await.unwrap());
}

#[tokio::test]
async fn test_unknown_issuer_is_an_error() {
    let issuer = Issuer::generate();
    let stranger = Issuer::generate();
    let suite = suite();
    let signed = suite
        .sign(&credential(), &issuer.keypair, "did:example:other#key-9", &[])
        .await
        .unwrap();
    assert!(suite.verify(&signed, stranger.resolver()).await.is_err());
}

#[tokio::test]
async fn test_wrong_issuer_key_is_false() {
    let issuer = Issuer::generate();
    let impostor = Issuer::generate();
    let suite = suite();
    let signed = suite
        .sign(
            &credential(),
            &impostor.keypair,
            &issuer.verification_method,
            &[],
        )
        .await
        .unwrap();
    assert!(!suite.verify(&signed, issuer.resolver()).await.unwrap());
}

// =========================================================================
// Derived proofs
// =========================================================================

#[tokio::test]
async fn test_sign_derive_verify() {
    let issuer = Issuer::generate();
    let suite = suite();
    let signed = suite
        .sign(
            &credential(),
            &issuer.keypair,
            &issuer.verification_method,
            &pointers(&["/issuer", "/validFrom"]),
        )
        .await
        .unwrap();

    let derived = suite
        .derive(
            &signed,
            &pointers(&["/credentialSubject/alumniOf/name", "/credentialSubject/awards/1"]),
            None,
        )
        .await
        .expect("derivation should succeed");

    assert_eq!(derived["issuer"], "did:example:university");
    assert_eq!(derived["credentialSubject"]["id"], "did:example:alice");
    assert_eq!(
        derived["credentialSubject"]["alumniOf"],
        json!({"type": "University", "name": "Example University"})
    );
    assert_eq!(
        derived["credentialSubject"]["awards"],
        json!([{"title": "Best Thesis", "year": 2019}])
    );
    assert!(derived["credentialSubject"].get("name").is_none());
    assert!(derived["credentialSubject"].get("birthYear").is_none());

    let report = suite
        .verify_with_report(&derived, issuer.resolver())
        .await
        .unwrap();
    assert!(report.verified, "checks: {:?}", report.checks);
    assert!(report.failed_statements.is_empty());
}

#[tokio::test]
async fn test_mandatory_only_disclosure() {
    let issuer = Issuer::generate();
    let suite = suite();
    let document = json!({
        "credentialSubject": {"id": "did:example:alice", "name": "Alice"}
    });
    let signed = suite
        .sign(
            &document,
            &issuer.keypair,
            &issuer.verification_method,
            &pointers(&["/credentialSubject/id"]),
        )
        .await
        .unwrap();

    let derived = suite.derive(&signed, &[], None).await.unwrap();
    let params = parse_derived_proof_value(&proof_value(&derived)).unwrap();
    assert_eq!(params.mandatory_indexes, vec![0]);
    assert!(params.signatures.is_empty());
    assert_eq!(params.label_map.len(), 1);
    assert_eq!(
        derived["credentialSubject"],
        json!({"id": "did:example:alice"})
    );

    assert!(suite.verify(&derived, issuer.resolver()).await.unwrap());
}

#[tokio::test]
async fn test_disclosure_is_minimal() {
    let issuer = Issuer::generate();
    let suite = suite();
    let signed = suite
        .sign(
            &credential(),
            &issuer.keypair,
            &issuer.verification_method,
            &pointers(&["/issuer"]),
        )
        .await
        .unwrap();
    let derived = suite
        .derive(&signed, &pointers(&["/credentialSubject/birthYear"]), None)
        .await
        .unwrap();
    let params = parse_derived_proof_value(&proof_value(&derived)).unwrap();

    let mut unsecured = derived.clone();
    unsecured.as_object_mut().unwrap().remove("proof");
    let statements = JsonCanonicalizer
        .canonicalize(&unsecured, &LabelMapLabeler::new(params.label_map.clone()))
        .await
        .unwrap();

    // Every revealed statement is either mandatory or carries a signature.
    assert_eq!(
        statements.len(),
        params.mandatory_indexes.len() + params.signatures.len()
    );
    assert!(statements.iter().all(|s| !s.contains("Alice Santos")));
    assert!(statements.iter().any(|s| s.contains("1995")));
}

#[tokio::test]
async fn test_derive_from_base_preserves_base_signature() {
    let issuer = Issuer::generate();
    let suite = suite();
    let signed = suite
        .sign(&credential(), &issuer.keypair, &issuer.verification_method, &[])
        .await
        .unwrap();
    let derived = suite
        .derive(&signed, &pointers(&["/credentialSubject/name"]), None)
        .await
        .unwrap();

    let base = parse_base_proof_value(&proof_value(&signed)).unwrap();
    let params = parse_derived_proof_value(&proof_value(&derived)).unwrap();
    assert_eq!(params.base_signature, base.base_signature);
    assert_eq!(params.public_key, base.public_key);
    assert!(params.mandatory_indexes.is_empty());
}

#[tokio::test]
async fn test_whole_document_disclosure() {
    let issuer = Issuer::generate();
    let suite = suite();
    let signed = suite
        .sign(&credential(), &issuer.keypair, &issuer.verification_method, &[])
        .await
        .unwrap();
    let derived = suite.derive(&signed, &pointers(&[""]), None).await.unwrap();

    let mut revealed = derived.clone();
    revealed.as_object_mut().unwrap().remove("proof");
    assert_eq!(revealed, credential());
    assert!(suite.verify(&derived, issuer.resolver()).await.unwrap());
}

#[tokio::test]
async fn test_verification_independent_of_parallelism() {
    let issuer = Issuer::generate();
    let signed = suite()
        .sign(&credential(), &issuer.keypair, &issuer.verification_method, &[])
        .await
        .unwrap();
    for parallelism in [1, 2, 7, 64] {
        let suite = suite_with(SuiteConfig {
            parallelism,
            ..SuiteConfig::default()
        });
        assert!(suite.verify(&signed, issuer.resolver()).await.unwrap());
        let derived = suite
            .derive(&signed, &pointers(&["/credentialSubject/awards"]), None)
            .await
            .unwrap();
        assert!(suite.verify(&derived, issuer.resolver()).await.unwrap());
    }
}

#[tokio::test]
async fn test_repeated_array_values_under_blank_node() {
    let issuer = Issuer::generate();
    let suite = suite();
    for i in 0..12 {
        let document = json!({
            "issuer": "did:example:university",
            "credentialSubject": {
                "name": format!("n{}", i),
                "tags": ["a", "a"],
                "extra": {"k": format!("v{}", i)}
            }
        });
        let signed = suite
            .sign(
                &document,
                &issuer.keypair,
                &issuer.verification_method,
                &pointers(&["/issuer"]),
            )
            .await
            .unwrap();
        assert!(suite.verify(&signed, issuer.resolver()).await.unwrap());

        let derived = suite
            .derive(&signed, &pointers(&["/credentialSubject"]), None)
            .await
            .unwrap();
        assert_eq!(derived["credentialSubject"]["tags"], json!(["a", "a"]));
        assert!(
            suite.verify(&derived, issuer.resolver()).await.unwrap(),
            "document {} failed to verify after disclosure",
            i
        );
    }
}

#[tokio::test]
async fn test_iri_with_reserved_characters() {
    let issuer = Issuer::generate();
    let suite = suite();
    let document = json!({
        "issuer": "did:example:university",
        "type": "urn:type:a<b>",
        "credentialSubject": {
            "link": {"id": "urn:a>b c"},
            "name": "Alice"
        }
    });
    let signed = suite
        .sign(
            &document,
            &issuer.keypair,
            &issuer.verification_method,
            &pointers(&["/issuer"]),
        )
        .await
        .unwrap();
    assert!(suite.verify(&signed, issuer.resolver()).await.unwrap());

    let derived = suite
        .derive(&signed, &pointers(&["/credentialSubject"]), None)
        .await
        .expect("derivation should succeed");
    assert_eq!(derived["credentialSubject"]["link"]["id"], "urn:a>b c");
    assert!(suite.verify(&derived, issuer.resolver()).await.unwrap());
}

// =========================================================================
// Proof selection and preconditions
// =========================================================================

#[tokio::test]
async fn test_nothing_selected() {
    let issuer = Issuer::generate();
    let suite = suite();
    let signed = suite
        .sign(&credential(), &issuer.keypair, &issuer.verification_method, &[])
        .await
        .unwrap();
    let err = suite.derive(&signed, &[], None).await.unwrap_err();
    assert!(matches!(err, ProofError::Logic(_)));
    assert_eq!(err.to_string(), "Nothing selected for disclosure.");
}

#[tokio::test]
async fn test_no_base_proof() {
    let err = suite()
        .derive(&credential(), &pointers(&["/issuer"]), None)
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "No matching base proof found from which to derive a disclosure proof."
    );
}

#[tokio::test]
async fn test_multiple_base_proofs_need_proof_id() {
    let issuer = Issuer::generate();
    let suite = suite();
    let document = credential();

    let mut secured = document.clone();
    for id in ["urn:proof:1", "urn:proof:2"] {
        let mut options = suite.proof_options(&issuer.verification_method);
        options["id"] = json!(id);
        let input = suite
            .create_verify_data(&document, &options, &pointers(&["/issuer"]))
            .await
            .unwrap();
        let value = suite.create_proof_value(input, &issuer.keypair).await.unwrap();
        options["proofValue"] = json!(value);
        secured = attach_proof(&secured, options).unwrap();
    }
    assert_eq!(secured["proof"].as_array().unwrap().len(), 2);

    let err = suite
        .derive(&secured, &pointers(&["/credentialSubject/name"]), None)
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Multiple matching proofs; a 'proofId' must be specified."
    );

    let derived = suite
        .derive(
            &secured,
            &pointers(&["/credentialSubject/name"]),
            Some("urn:proof:2"),
        )
        .await
        .unwrap();
    assert_eq!(derived["proof"]["id"], "urn:proof:2");
    assert!(suite.verify(&derived, issuer.resolver()).await.unwrap());
}

#[tokio::test]
async fn test_unresolvable_pointer() {
    let issuer = Issuer::generate();
    let err = suite()
        .sign(
            &credential(),
            &issuer.keypair,
            &issuer.verification_method,
            &pointers(&["/credentialSubject/email"]),
        )
        .await
        .unwrap_err();
    assert!(err.is_malformed_input());
}
