//! `ecsd verify` — Verify a base or derived proof.

use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

use ecsd_proof::DidKeyResolver;

use super::{cryptosuite, read_json};
use crate::config::EcsdConfig;

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Secured document (path, or `-` for stdin).
    #[arg(short, long)]
    pub input: PathBuf,

    /// Print the verification report as JSON.
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: &VerifyArgs, config: &EcsdConfig) -> anyhow::Result<()> {
    let document = read_json(&args.input)?;
    let suite = cryptosuite(config)?;
    let result = suite
        .verify_with_report(&document, Arc::new(DidKeyResolver))
        .await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        if result.verified {
            println!("Proof is VALID");
        } else {
            println!("Proof is INVALID");
        }
        println!();
        for check in &result.checks {
            let icon = if check.passed { "PASS" } else { "FAIL" };
            print!("  [{}] {}", icon, check.name);
            if let Some(ref detail) = check.detail {
                print!(": {}", detail);
            }
            println!();
        }
        if !result.failed_statements.is_empty() {
            println!("  Failed statements: {:?}", result.failed_statements);
        }
    }

    if !result.verified {
        anyhow::bail!("proof verification failed");
    }
    Ok(())
}
