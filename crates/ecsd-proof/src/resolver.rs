use async_trait::async_trait;
use dashmap::DashMap;

use ecsd_core::ProofError;
use ecsd_crypto::PublicKey;

/// Resolves a proof's `verificationMethod` to the issuer's public key.
#[async_trait]
pub trait KeyResolver: Send + Sync {
    async fn resolve(&self, verification_method: &str) -> Result<PublicKey, ProofError>;
}

/// In-memory table of trusted verification methods.
#[derive(Default)]
pub struct StaticKeyResolver {
    /// Verification method id → public key.
    keys: DashMap<String, PublicKey>,
}

impl StaticKeyResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trust a verification method.
    pub fn add(&self, verification_method: impl Into<String>, public_key: PublicKey) {
        self.keys.insert(verification_method.into(), public_key);
    }

    /// Stop trusting a verification method.
    pub fn remove(&self, verification_method: &str) -> bool {
        self.keys.remove(verification_method).is_some()
    }

    pub fn contains(&self, verification_method: &str) -> bool {
        self.keys.contains_key(verification_method)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[async_trait]
impl KeyResolver for StaticKeyResolver {
    async fn resolve(&self, verification_method: &str) -> Result<PublicKey, ProofError> {
        self.keys
            .get(verification_method)
            .map(|entry| *entry.value())
            .ok_or_else(|| {
                ProofError::Logic(format!(
                    "unknown verification method \"{}\"",
                    verification_method
                ))
            })
    }
}

/// Decodes `did:key` verification methods (`did:key:z...#z...`) directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct DidKeyResolver;

#[async_trait]
impl KeyResolver for DidKeyResolver {
    async fn resolve(&self, verification_method: &str) -> Result<PublicKey, ProofError> {
        let invalid = |reason: &str| {
            ProofError::validation(
                "verificationMethod",
                format!("\"{}\" {}", verification_method, reason),
            )
        };
        let rest = verification_method
            .strip_prefix("did:key:")
            .ok_or_else(|| invalid("is not a did:key"))?;
        let (key, fragment) = match rest.split_once('#') {
            Some((key, fragment)) => (key, Some(fragment)),
            None => (rest, None),
        };
        if fragment.is_some_and(|f| f != key) {
            return Err(invalid("has a fragment that does not match its key"));
        }
        PublicKey::from_multibase(key).map_err(|e| invalid(&e.to_string()))
    }
}
