//! Mints a sample JWT signed with a key written by `generate-jwks`.

use std::path::PathBuf;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Parser;
use jwks_forge::token::decode_unverified;
use jwks_forge::{Issuer, KeyId, MintConfig, TokenRequest, UserRole, cli, mint_token};
use zeroize::Zeroizing;

#[derive(Parser, Debug)]
#[command(version, about = "Mint a JWT for Istio RequestAuthentication testing")]
struct Args {
    /// Issuer (`iss`) of the token
    #[arg(long)]
    issuer: Option<String>,

    /// Key id placed in the token header; read from the issuer's JWKS when omitted
    #[arg(long)]
    key_id: Option<String>,

    /// Private key PEM; derived from the output directory when omitted
    #[arg(long)]
    private_key: Option<PathBuf>,

    /// Password of an encrypted private key PEM
    #[arg(long)]
    password: Option<String>,

    /// Directory `generate-jwks` wrote its artifacts to
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// User id, used for both `sub` and `UserId`
    #[arg(long)]
    user_id: Option<String>,

    /// User role; numeric values are encoded as numbers
    #[arg(long)]
    user_role: Option<String>,

    /// Namespace claim (`NS`)
    #[arg(long)]
    ns: Option<String>,

    /// Hours until the token expires
    #[arg(long)]
    expiry_hours: Option<i64>,

    /// Configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

fn format_remaining(seconds: i64) -> String {
    if seconds <= 0 {
        return "expired".to_string();
    }
    let (h, rem) = (seconds / 3600, seconds % 3600);
    format!("{h}h {:02}m {:02}s", rem / 60, rem % 60)
}

fn main() -> anyhow::Result<()> {
    let args: Args = cli::parse_args();
    let settings = cli::init(args.config.as_deref()).context("Failed to load configuration")?;
    let minter = settings.minter;

    let issuer = Issuer::parse(args.issuer.unwrap_or(minter.issuer))?;
    let output_dir = args.output_dir.unwrap_or(settings.output_dir);
    let key_id = args.key_id.or(minter.key_id).map(KeyId::parse).transpose()?;
    let private_key_path = args.private_key.or(minter.private_key_path);

    let mut config = MintConfig::resolve(&output_dir, &issuer, key_id, private_key_path)?;
    config.private_key_password = args
        .password
        .or(settings.private_key_password)
        .map(Zeroizing::new);

    let user_role = args
        .user_role
        .unwrap_or(minter.user_role)
        .parse::<UserRole>()?;
    let request = TokenRequest {
        user_id: args.user_id.unwrap_or(minter.user_id),
        user_role,
        ns: args.ns.unwrap_or(minter.ns),
        expiry_hours: args.expiry_hours.unwrap_or(minter.expiry_hours),
    };

    println!("=== JWT Token Generator ===");
    println!("Issuer: {issuer}");
    println!("Key ID: {}", config.key_id);
    println!("User ID: {}", request.user_id);
    println!("User Role: {}", request.user_role);
    println!();

    let token = mint_token(&config, &request).context("Failed to mint token")?;
    println!("Generated JWT Token:");
    println!("{token}");
    println!();

    let payload: serde_json::Value = decode_unverified(&token)?;
    println!("Token payload:");
    println!("{}", serde_json::to_string_pretty(&payload)?);
    println!();

    if let Some(exp) = payload.get("exp").and_then(serde_json::Value::as_i64) {
        if let Some(expires_at) = DateTime::<Utc>::from_timestamp(exp, 0) {
            println!("Expires at: {expires_at}");
        }
        println!(
            "Remaining validity: {}",
            format_remaining(exp - Utc::now().timestamp())
        );
    }

    Ok(())
}
