//! ecsd CLI — Sign, derive, and verify `ecdsa-sd-2023` selective-disclosure
//! proofs over JSON documents.
//!
//! Subcommands: init, keygen, sign, derive, verify.

mod commands;
mod config;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use config::EcsdConfig;

/// ecsd — ECDSA selective-disclosure proofs.
#[derive(Parser, Debug)]
#[command(name = "ecsd", version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, global = true, default_value = "ecsd.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error). Takes precedence over
    /// RUST_LOG and the config file.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a default configuration file.
    Init(commands::init::InitArgs),
    /// Generate an issuer key pair.
    Keygen(commands::keygen::KeygenArgs),
    /// Add a base proof to a document.
    Sign(commands::sign::SignArgs),
    /// Derive a selective-disclosure document from a base proof.
    Derive(commands::derive::DeriveArgs),
    /// Verify a base or derived proof.
    Verify(commands::verify::VerifyArgs),
}

/// `--log-level`, then RUST_LOG, then the configured level.
fn log_filter(config: &EcsdConfig, override_level: Option<&str>) -> EnvFilter {
    match override_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
    }
}

fn init_tracing(config: &EcsdConfig, override_level: Option<&str>) {
    let filter = log_filter(config, override_level);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);
    if config.logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = EcsdConfig::load(&cli.config)?;
    init_tracing(&config, cli.log_level.as_deref());

    match &cli.command {
        Commands::Init(args) => commands::init::run(args, &cli.config),
        Commands::Keygen(args) => commands::keygen::run(args),
        Commands::Sign(args) => commands::sign::run(args, &config).await,
        Commands::Derive(args) => commands::derive::run(args, &config).await,
        Commands::Verify(args) => commands::verify::run(args, &config).await,
    }
}
