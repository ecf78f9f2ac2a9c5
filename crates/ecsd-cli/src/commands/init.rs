//! `ecsd init` — Write a default configuration file.

use clap::Args;
use std::path::Path;

use crate::config::EcsdConfig;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing configuration file.
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: &InitArgs, path: &Path) -> anyhow::Result<()> {
    if path.exists() && !args.force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }
    EcsdConfig::default().save(path)?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}
