pub mod error;
pub mod hashing;
pub mod keys;
pub mod labels;
pub mod signing;

pub use error::CryptoError;
pub use hashing::{hash, hash_statements, Hash};
pub use keys::{KeyPair, PublicKey};
pub use labels::HmacKey;
pub use signing::{sign, verify, verify_bytes, Signature};
