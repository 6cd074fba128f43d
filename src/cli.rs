//! Shared start-up for the binaries.

use std::path::Path;

use clap::Parser;

use crate::config::{self, Settings};
use crate::error::Result;
use crate::telemetry;

/// Parses the command line, exiting with [`exit_code`] on failure.
pub fn parse_args<T: Parser>() -> T {
    T::try_parse().unwrap_or_else(|err| {
        let _ = err.print();
        std::process::exit(exit_code(&err));
    })
}

/// Status for a failed parse: 1 for usage errors, 0 for `--help` and
/// `--version`, whose output goes to stdout.
pub fn exit_code(err: &clap::Error) -> i32 {
    if err.use_stderr() { 1 } else { 0 }
}

/// Loads settings and installs the tracing subscriber they describe.
pub fn init(config_path: Option<&Path>) -> Result<Settings> {
    let settings = config::load_config(config_path)?;
    telemetry::init(&settings.telemetry);
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Parser, Debug)]
    #[command(version)]
    struct Args {
        issuer: String,
    }

    fn code_for(argv: &[&str]) -> i32 {
        exit_code(&Args::try_parse_from(argv).unwrap_err())
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(code_for(&["tool"]), 1);
        assert_eq!(code_for(&["tool", "a", "b"]), 1);
        assert_eq!(code_for(&["tool", "--bogus", "a"]), 1);
        assert_eq!(code_for(&["tool", "--help"]), 0);
        assert_eq!(code_for(&["tool", "--version"]), 0);
        assert!(Args::try_parse_from(["tool", "anyong"]).is_ok());
    }
}
