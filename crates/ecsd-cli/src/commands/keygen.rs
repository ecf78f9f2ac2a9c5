//! `ecsd keygen` — Generate an issuer key pair.

use clap::Args;
use std::path::PathBuf;

use ecsd_crypto::KeyPair;

#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Where to write the secret key (multibase multikey).
    #[arg(short, long, default_value = "issuer.key")]
    pub out: PathBuf,

    /// Overwrite an existing key file.
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: &KeygenArgs) -> anyhow::Result<()> {
    if args.out.exists() && !args.force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            args.out.display()
        );
    }
    let keypair = KeyPair::generate();
    std::fs::write(&args.out, keypair.secret_to_multibase() + "\n")?;

    let public_key = keypair.public_key();
    println!("Key pair generated!");
    println!("  Secret key:          {}", args.out.display());
    println!("  Public key:          {}", public_key.to_multibase());
    println!(
        "  Verification method: {}",
        public_key.to_did_key_verification_method()
    );
    Ok(())
}
