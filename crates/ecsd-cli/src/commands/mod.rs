pub mod derive;
pub mod init;
pub mod keygen;
pub mod sign;
pub mod verify;

use anyhow::Context;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ecsd_proof::{Cryptosuite, JsonCanonicalizer};

use crate::config::EcsdConfig;

/// Read a JSON document from a file, or stdin for `-`.
pub fn read_json(path: &Path) -> anyhow::Result<serde_json::Value> {
    let text = if path == Path::new("-") {
        std::io::read_to_string(std::io::stdin())?
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("could not read {}", path.display()))?
    };
    serde_json::from_str(&text).with_context(|| format!("invalid JSON in {}", path.display()))
}

/// Pretty-print JSON to a file, or stdout when no path is given.
pub fn write_json(value: &serde_json::Value, output: Option<&PathBuf>) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            std::fs::write(path, text + "\n")
                .with_context(|| format!("could not write {}", path.display()))?;
            tracing::info!(path = %path.display(), "document written");
        }
        None => println!("{}", text),
    }
    Ok(())
}

pub fn cryptosuite(config: &EcsdConfig) -> anyhow::Result<Cryptosuite> {
    Ok(Cryptosuite::new(
        config.suite.clone(),
        Arc::new(JsonCanonicalizer::new()),
    )?)
}
