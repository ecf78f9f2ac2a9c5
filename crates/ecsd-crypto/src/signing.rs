use p256::ecdsa::signature::{Signer, Verifier};

use crate::error::CryptoError;
use crate::keys::{KeyPair, PublicKey};

/// Length of a P-256 ECDSA signature in fixed-size `r || s` form.
pub const SIGNATURE_LENGTH: usize = 64;

/// P-256 ECDSA signature (64 bytes, `r || s`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    inner: p256::ecdsa::Signature,
}

impl Signature {
    /// Get the raw bytes (64 bytes).
    pub fn to_bytes(&self) -> [u8; SIGNATURE_LENGTH] {
        let mut bytes = [0u8; SIGNATURE_LENGTH];
        bytes.copy_from_slice(&self.inner.to_bytes());
        bytes
    }

    /// Create from raw bytes (64 bytes). Rejects zero or out-of-range scalars.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != SIGNATURE_LENGTH {
            return Err(CryptoError::InvalidInput(format!(
                "signature must be {} bytes, got {}",
                SIGNATURE_LENGTH,
                bytes.len()
            )));
        }
        let inner = p256::ecdsa::Signature::from_slice(bytes)
            .map_err(|e| CryptoError::InvalidInput(format!("invalid signature: {}", e)))?;
        Ok(Self { inner })
    }

    /// Encode as hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }
}

/// Sign a message with ECDSA P-256 / SHA-256 (RFC 6979 deterministic nonces).
pub fn sign(message: &[u8], keypair: &KeyPair) -> Signature {
    let inner: p256::ecdsa::Signature = keypair.signing_key().sign(message);
    Signature { inner }
}

/// Verify an ECDSA P-256 / SHA-256 signature.
pub fn verify(message: &[u8], signature: &Signature, pubkey: &PublicKey) -> Result<(), CryptoError> {
    pubkey
        .verifying_key()
        .verify(message, &signature.inner)
        .map_err(|_| CryptoError::SignatureVerificationFailed)
}

/// Verify raw signature bytes. Malformed bytes count as a failed
/// verification rather than a distinct error.
pub fn verify_bytes(message: &[u8], signature: &[u8], pubkey: &PublicKey) -> bool {
    match Signature::from_bytes(signature) {
        Ok(signature) => verify(message, &signature, pubkey).is_ok(),
        Err(e) => {
            tracing::debug!(error = %e, "rejecting malformed signature bytes");
            false
        }
    }
}
