//! Shared fixtures for the cross-crate integration tests.

use std::sync::Arc;

use serde_json::{json, Value};

use ecsd_core::SuiteConfig;
use ecsd_crypto::KeyPair;
use ecsd_proof::{Cryptosuite, JsonCanonicalizer, StaticKeyResolver};

/// An issuer key pair and the verification method that names it.
pub struct Issuer {
    pub keypair: KeyPair,
    pub verification_method: String,
}

impl Issuer {
    pub fn generate() -> Self {
        Self {
            keypair: KeyPair::generate(),
            verification_method: "did:example:issuer#key-1".into(),
        }
    }

    /// Resolver that trusts exactly this issuer.
    pub fn resolver(&self) -> Arc<StaticKeyResolver> {
        let resolver = StaticKeyResolver::new();
        resolver.add(self.verification_method.clone(), self.keypair.public_key());
        Arc::new(resolver)
    }
}

pub fn suite() -> Cryptosuite {
    suite_with(SuiteConfig::default())
}

pub fn suite_with(config: SuiteConfig) -> Cryptosuite {
    match Cryptosuite::new(config, Arc::new(JsonCanonicalizer::new())) {
        Ok(suite) => suite,
        Err(e) => panic!("fixture cryptosuite rejected: {}", e),
    }
}

/// A credential with nested and repeated structure.
pub fn credential() -> Value {
    json!({
        "@context": ["https://www.w3.org/ns/credentials/v2"],
        "type": ["VerifiableCredential", "AlumniCredential"],
        "issuer": "did:example:university",
        "validFrom": "2026-01-01T00:00:00Z",
        "credentialSubject": {
            "id": "did:example:alice",
            "name": "Alice Santos",
            "birthYear": 1995,
            "alumniOf": {
                "type": "University",
                "name": "Example University",
                "graduated": true
            },
            "awards": [
                {"title": "Dean's List", "year": 2017},
                {"title": "Best Thesis", "year": 2019}
            ]
        }
    })
}

pub fn pointers(list: &[&str]) -> Vec<String> {
    list.iter().map(|p| p.to_string()).collect()
}

/// The `proofValue` of a document carrying exactly one proof.
pub fn proof_value(document: &Value) -> String {
    document["proof"]["proofValue"]
        .as_str()
        .map(str::to_string)
        .unwrap_or_default()
}

/// Copy of `document` with its proof value replaced.
pub fn with_proof_value(document: &Value, proof_value: String) -> Value {
    let mut out = document.clone();
    out["proof"]["proofValue"] = Value::String(proof_value);
    out
}

/// `'u'`-tagged base64url label over arbitrary bytes.
pub fn label(bytes: &[u8]) -> String {
    multibase::encode(multibase::Base::Base64Url, bytes)
}
