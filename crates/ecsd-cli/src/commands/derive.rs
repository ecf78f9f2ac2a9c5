//! `ecsd derive` — Derive a selective-disclosure document.

use clap::Args;
use std::path::PathBuf;

use super::{cryptosuite, read_json, write_json};
use crate::config::EcsdConfig;

#[derive(Args, Debug)]
pub struct DeriveArgs {
    /// Document carrying a base proof (path, or `-` for stdin).
    #[arg(short, long)]
    pub input: PathBuf,

    /// JSON pointers to reveal in addition to the mandatory ones, comma-separated.
    #[arg(short, long, value_delimiter = ',', alias = "reveal")]
    pub selective: Vec<String>,

    /// Id of the base proof to derive from, when the document has several.
    #[arg(long)]
    pub proof_id: Option<String>,

    /// Output file (stdout when omitted).
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub async fn run(args: &DeriveArgs, config: &EcsdConfig) -> anyhow::Result<()> {
    let document = read_json(&args.input)?;
    let suite = cryptosuite(config)?;
    let derived = suite
        .derive(&document, &args.selective, args.proof_id.as_deref())
        .await?;
    write_json(&derived, args.output.as_ref())
}
