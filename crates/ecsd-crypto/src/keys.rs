use multibase::Base;
use p256::ecdsa::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use zeroize::Zeroize;

use crate::error::CryptoError;

/// Multicodec header of a P-256 public key (`p256-pub`, varint 0x1200).
pub const P256_MULTIKEY_HEADER: [u8; 2] = [0x80, 0x24];
/// Multicodec header of a P-256 secret key (`p256-priv`, varint 0x1306).
pub const P256_SECRET_MULTIKEY_HEADER: [u8; 2] = [0x86, 0x26];
/// Length of a multikey-encoded compressed P-256 public key.
pub const PUBLIC_KEY_LENGTH: usize = 35;
/// Length of a raw P-256 secret scalar.
pub const SECRET_KEY_LENGTH: usize = 32;

/// P-256 ECDSA key pair. Used both as a long-term identity key and as the
/// single-use statement key of a base proof.
#[derive(Clone)]
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    /// Generate a new random key pair using OS-provided entropy.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::random(&mut OsRng),
        }
    }

    /// Create a key pair from a raw 32-byte secret scalar.
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != SECRET_KEY_LENGTH {
            return Err(CryptoError::InvalidKeyLength {
                expected: SECRET_KEY_LENGTH,
                actual: bytes.len(),
            });
        }
        let signing_key = SigningKey::from_slice(bytes)
            .map_err(|e| CryptoError::KeyGenerationError(format!("invalid secret key: {}", e)))?;
        Ok(Self { signing_key })
    }

    /// Get the public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            verifying_key: *self.signing_key.verifying_key(),
        }
    }

    /// Get the raw secret scalar (32 bytes).
    /// Use with caution; prefer the sign() functions.
    pub fn secret_bytes(&self) -> [u8; SECRET_KEY_LENGTH] {
        self.signing_key.to_bytes().into()
    }

    /// Encode the secret key as a base58btc multibase multikey (`z...`).
    pub fn secret_to_multibase(&self) -> String {
        let mut bytes = Vec::with_capacity(2 + SECRET_KEY_LENGTH);
        bytes.extend_from_slice(&P256_SECRET_MULTIKEY_HEADER);
        let mut secret = self.secret_bytes();
        bytes.extend_from_slice(&secret);
        secret.zeroize();
        let encoded = multibase::encode(Base::Base58Btc, &bytes);
        bytes.zeroize();
        encoded
    }

    /// Decode a secret key written by [`KeyPair::secret_to_multibase`].
    pub fn secret_from_multibase(encoded: &str) -> Result<Self, CryptoError> {
        let (_, mut bytes) = multibase::decode(encoded)
            .map_err(|e| CryptoError::InvalidEncoding(format!("secret key: {}", e)))?;
        let result = match bytes.strip_prefix(&P256_SECRET_MULTIKEY_HEADER) {
            Some(secret) => Self::from_secret_bytes(secret),
            None => Err(CryptoError::InvalidEncoding(
                "secret key is not a P-256 multikey".into(),
            )),
        };
        bytes.zeroize();
        result
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key().to_multibase())
            .finish_non_exhaustive()
    }
}

/// P-256 public key for verification operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicKey {
    verifying_key: VerifyingKey,
}

impl PublicKey {
    /// Decode from multikey bytes: `0x80 0x24 || SEC1-compressed point`.
    pub fn from_multikey_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != PUBLIC_KEY_LENGTH {
            return Err(CryptoError::InvalidKeyLength {
                expected: PUBLIC_KEY_LENGTH,
                actual: bytes.len(),
            });
        }
        let point = bytes
            .strip_prefix(&P256_MULTIKEY_HEADER)
            .ok_or_else(|| CryptoError::InvalidPublicKey("missing P-256 multikey header".into()))?;
        let verifying_key = VerifyingKey::from_sec1_bytes(point)
            .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;
        Ok(Self { verifying_key })
    }

    /// Encode as multikey bytes (35 bytes).
    pub fn to_multikey_bytes(&self) -> Vec<u8> {
        let point = self.verifying_key.to_encoded_point(true);
        let mut bytes = Vec::with_capacity(PUBLIC_KEY_LENGTH);
        bytes.extend_from_slice(&P256_MULTIKEY_HEADER);
        bytes.extend_from_slice(point.as_bytes());
        bytes
    }

    /// Encode as a base58btc multibase multikey (`zDn...`).
    pub fn to_multibase(&self) -> String {
        multibase::encode(Base::Base58Btc, self.to_multikey_bytes())
    }

    /// Decode from a multibase multikey string.
    pub fn from_multibase(encoded: &str) -> Result<Self, CryptoError> {
        let (_, bytes) = multibase::decode(encoded)
            .map_err(|e| CryptoError::InvalidEncoding(format!("public key: {}", e)))?;
        Self::from_multikey_bytes(&bytes)
    }

    /// `did:key` verification method for this key (`did:key:z...#z...`).
    pub fn to_did_key_verification_method(&self) -> String {
        let encoded = self.to_multibase();
        format!("did:key:{}#{}", encoded, encoded)
    }

    /// Encode the multikey bytes as hex.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_multikey_bytes())
    }

    pub(crate) fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }
}
