use sha2::{Digest, Sha256};

/// SHA-256 digest (32 bytes).
pub type Hash = [u8; 32];

/// Hash arbitrary data using SHA-256.
pub fn hash(data: &[u8]) -> Hash {
    Sha256::digest(data).into()
}

/// Hash an ordered statement list: SHA-256 over the UTF-8 bytes of the
/// statements concatenated in order (each statement keeps its own
/// terminating newline).
pub fn hash_statements<S: AsRef<str>>(statements: &[S]) -> Hash {
    let mut hasher = Sha256::new();
    for statement in statements {
        hasher.update(statement.as_ref().as_bytes());
    }
    hasher.finalize().into()
}
