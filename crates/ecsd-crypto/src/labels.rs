use hmac::{Hmac, Mac};
use multibase::Base;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CryptoError;

type HmacSha256 = Hmac<Sha256>;

/// Length of an HMAC label-blinding key.
pub const HMAC_KEY_LENGTH: usize = 32;

/// Secret key of the keyed pseudorandom function that blinds canonical
/// blank-node identifiers. Zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct HmacKey {
    bytes: [u8; HMAC_KEY_LENGTH],
}

impl HmacKey {
    /// Generate a fresh random key using OS-provided entropy.
    pub fn generate() -> Self {
        let mut bytes = [0u8; HMAC_KEY_LENGTH];
        OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Import an exported key (32 bytes).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let bytes: [u8; HMAC_KEY_LENGTH] =
            bytes.try_into().map_err(|_| CryptoError::InvalidKeyLength {
                expected: HMAC_KEY_LENGTH,
                actual: bytes.len(),
            })?;
        Ok(Self { bytes })
    }

    /// Export the raw key bytes.
    pub fn export(&self) -> Vec<u8> {
        self.bytes.to_vec()
    }

    /// HMAC-SHA-256 of `data` under this key.
    pub fn digest(&self, data: &[u8]) -> Result<[u8; 32], CryptoError> {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(&self.bytes)
            .map_err(|e| CryptoError::InvalidInput(format!("hmac key: {}", e)))?;
        mac.update(data);
        Ok(mac.finalize().into_bytes().into())
    }

    /// Blinded label for a canonical blank-node identifier:
    /// `'u' || base64url-nopad(HMAC(key, id))`.
    pub fn blind_label(&self, canonical_id: &str) -> Result<String, CryptoError> {
        let digest = self.digest(canonical_id.as_bytes())?;
        Ok(multibase::encode(Base::Base64Url, digest))
    }
}

impl std::fmt::Debug for HmacKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("HmacKey(..)")
    }
}
