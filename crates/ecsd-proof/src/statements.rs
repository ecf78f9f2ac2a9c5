//! Per-statement signing and verification on the blocking thread pool.
//!
//! Statements are split into contiguous chunks, one per worker. Every
//! worker reports `(index, result)` pairs that are written back by index,
//! so output order never depends on completion order.

use std::sync::Arc;

use futures::future::try_join_all;

use ecsd_core::ProofError;
use ecsd_crypto::{sign, verify_bytes, KeyPair, PublicKey};

fn chunk_size(len: usize, workers: usize) -> usize {
    len.div_ceil(workers.max(1)).max(1)
}

fn join_error(e: tokio::task::JoinError) -> ProofError {
    ProofError::Crypto(format!("statement worker failed: {}", e))
}

/// Sign every statement with the single-use statement key.
pub async fn sign_statements(
    key: &KeyPair,
    statements: &[String],
    workers: usize,
) -> Result<Vec<Vec<u8>>, ProofError> {
    if statements.is_empty() {
        return Ok(Vec::new());
    }
    let key = Arc::new(key.clone());
    let size = chunk_size(statements.len(), workers);
    let handles = statements.chunks(size).enumerate().map(|(chunk, items)| {
        let key = Arc::clone(&key);
        let items = items.to_vec();
        let offset = chunk * size;
        tokio::task::spawn_blocking(move || {
            items
                .iter()
                .enumerate()
                .map(|(i, statement)| {
                    (offset + i, sign(statement.as_bytes(), &key).to_bytes().to_vec())
                })
                .collect::<Vec<_>>()
        })
    });
    let results = try_join_all(handles).await.map_err(join_error)?;

    let mut signatures = vec![Vec::new(); statements.len()];
    for (index, signature) in results.into_iter().flatten() {
        signatures[index] = signature;
    }
    tracing::debug!(count = signatures.len(), workers, "statements signed");
    Ok(signatures)
}

/// Check `signatures[i]` against `statements[i]`. Malformed signatures are
/// reported as `false`.
pub async fn verify_statements(
    key: &PublicKey,
    statements: &[String],
    signatures: &[Vec<u8>],
    workers: usize,
) -> Result<Vec<bool>, ProofError> {
    if statements.len() != signatures.len() {
        return Err(ProofError::Verification(format!(
            "{} signatures for {} statements",
            signatures.len(),
            statements.len()
        )));
    }
    if statements.is_empty() {
        return Ok(Vec::new());
    }
    let key = *key;
    let size = chunk_size(statements.len(), workers);
    let handles = statements
        .chunks(size)
        .zip(signatures.chunks(size))
        .enumerate()
        .map(|(chunk, (items, sigs))| {
            let items = items.to_vec();
            let sigs = sigs.to_vec();
            let offset = chunk * size;
            tokio::task::spawn_blocking(move || {
                items
                    .iter()
                    .zip(&sigs)
                    .enumerate()
                    .map(|(i, (statement, signature))| {
                        (offset + i, verify_bytes(statement.as_bytes(), signature, &key))
                    })
                    .collect::<Vec<_>>()
            })
        });
    let results = try_join_all(handles).await.map_err(join_error)?;

    let mut verified = vec![false; statements.len()];
    for (index, ok) in results.into_iter().flatten() {
        verified[index] = ok;
    }
    Ok(verified)
}
