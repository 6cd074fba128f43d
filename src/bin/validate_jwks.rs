//! Checks that a JWKS file has the shape Istio expects for RSA keys.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use jwks_forge::{cli, validate};

#[derive(Parser, Debug)]
#[command(version, about = "Validate the structure of a JWKS file")]
struct Args {
    /// JWKS JSON file to check
    file: PathBuf,

    /// Configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Reads `path` and reports `(status, line)`: status 0 when the JWKS is
/// well formed, 1 otherwise.
fn check(path: &Path) -> anyhow::Result<(u8, String)> {
    let text =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;

    let (ok, message) = validate::validation_report(&value);
    tracing::debug!(ok, file = %path.display(), "validated JWKS");
    Ok(if ok {
        (0, format!("✓ {message}"))
    } else {
        (1, format!("✗ {message}"))
    })
}

fn main() -> anyhow::Result<ExitCode> {
    let args: Args = cli::parse_args();
    cli::init(args.config.as_deref()).context("Failed to load configuration")?;

    let (status, line) = check(&args.file)?;
    println!("{line}");
    Ok(ExitCode::from(status))
}
