//! Generates an RSA key pair, JWKS and Istio `RequestAuthentication` for an
//! issuer.
//!
//! Usage: `generate-jwks <issuer> [key_id]`

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use jwks_forge::{GenerateOptions, Issuer, KeyId, cli, generate_jwks_for_issuer, save_bundle};
use zeroize::Zeroizing;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Generate RSA key material, a JWKS and an Istio RequestAuthentication for an issuer",
    after_help = "Examples:\n  generate-jwks anyong\n  generate-jwks my-company custom-key-id"
)]
struct Args {
    /// JWT issuer the keys are generated for
    issuer: String,

    /// Key id to publish instead of a generated one
    key_id: Option<String>,

    /// Directory the artifacts are written to
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// RSA key length in bits
    #[arg(long)]
    key_size: Option<usize>,

    /// Encrypt the private key PEM with this password
    #[arg(long)]
    password: Option<String>,

    /// Configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args: Args = cli::parse_args();
    let settings = cli::init(args.config.as_deref()).context("Failed to load configuration")?;

    let issuer = Issuer::parse(args.issuer)?;
    let key_id = args.key_id.map(KeyId::parse).transpose()?;
    let output_dir = args.output_dir.unwrap_or(settings.output_dir);
    let options = GenerateOptions {
        key_id,
        key_size: args.key_size.unwrap_or(settings.key_size),
        password: args
            .password
            .or(settings.private_key_password)
            .map(Zeroizing::new),
    };

    println!("Generating JWKS for issuer '{issuer}'...");
    let bundle = generate_jwks_for_issuer(&issuer, &options)
        .with_context(|| format!("Failed to generate keys for issuer '{issuer}'"))?;
    println!("✓ Generated {}-bit RSA key pair", options.key_size);
    println!("✓ Generated JWK, Key ID: {}", bundle.key_id);

    let paths = save_bundle(&bundle, &output_dir)
        .with_context(|| format!("Failed to write artifacts to {}", output_dir.display()))?;

    println!("\n✅ JWKS generation complete!");
    println!("\nGenerated JWKS:");
    println!("{}", bundle.jwks.to_pretty_json()?);

    println!("\nFiles:");
    println!("- jwks_file: {}", paths.jwks_file.display());
    println!("- private_key_file: {}", paths.private_key_file.display());
    println!("- auth_config_file: {}", paths.auth_config_file.display());

    println!("\nKey ID: {}", bundle.key_id);
    println!("Issuer: {}", bundle.issuer);
    println!("Algorithm: {}", bundle.algorithm);
    println!("Key type: {}", bundle.key_type);

    Ok(())
}
