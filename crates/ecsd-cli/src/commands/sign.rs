//! `ecsd sign` — Add a base proof to a document.

use anyhow::Context;
use clap::Args;
use std::path::{Path, PathBuf};
use zeroize::Zeroize;

use ecsd_crypto::KeyPair;

use super::{cryptosuite, read_json, write_json};
use crate::config::EcsdConfig;

#[derive(Args, Debug)]
pub struct SignArgs {
    /// Unsecured document (path, or `-` for stdin).
    #[arg(short, long)]
    pub input: PathBuf,

    /// Issuer secret key file written by `ecsd keygen`.
    #[arg(short, long, default_value = "issuer.key")]
    pub key: PathBuf,

    /// JSON pointers the holder must always disclose, comma-separated.
    #[arg(short, long, value_delimiter = ',')]
    pub mandatory: Vec<String>,

    /// Verification method to record (defaults to the key's did:key).
    #[arg(long)]
    pub verification_method: Option<String>,

    /// Output file (stdout when omitted).
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn load_keypair(path: &Path) -> anyhow::Result<KeyPair> {
    let mut encoded = std::fs::read_to_string(path)
        .with_context(|| format!("could not read key file {}", path.display()))?;
    let keypair = KeyPair::secret_from_multibase(encoded.trim());
    encoded.zeroize();
    Ok(keypair?)
}

pub async fn run(args: &SignArgs, config: &EcsdConfig) -> anyhow::Result<()> {
    let document = read_json(&args.input)?;
    let keypair = load_keypair(&args.key)?;
    let verification_method = args
        .verification_method
        .clone()
        .unwrap_or_else(|| keypair.public_key().to_did_key_verification_method());

    let suite = cryptosuite(config)?;
    let signed = suite
        .sign(&document, &keypair, &verification_method, &args.mandatory)
        .await?;
    write_json(&signed, args.output.as_ref())
}
