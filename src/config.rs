//! Configuration management for the command-line tools.
//!
//! Settings come from an optional YAML file (`jwks-forge.yaml` in the working
//! directory unless a path is given) layered under `JWKS_FORGE_*` environment
//! variables. Command-line flags are applied on top by the binaries.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::Result;
use crate::key::DEFAULT_KEY_SIZE;

/// Base name of the configuration file looked up when no path is given.
pub const DEFAULT_CONFIG_NAME: &str = "jwks-forge";
/// Prefix of the environment variables that override file settings.
pub const ENV_PREFIX: &str = "JWKS_FORGE";

/// Application configuration settings.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory the generation step writes to and the minter reads from.
    pub output_dir: PathBuf,
    /// RSA modulus size in bits.
    pub key_size: usize,
    /// Password protecting generated private keys. Unencrypted when unset.
    pub private_key_password: Option<String>,
    pub minter: MinterSettings,
    pub telemetry: TelemetryConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./output"),
            key_size: DEFAULT_KEY_SIZE,
            private_key_password: None,
            minter: MinterSettings::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

/// Defaults for `mint-jwt`.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct MinterSettings {
    pub issuer: String,
    /// Key id of the signing key. Discovered from the issuer's JWKS when unset.
    pub key_id: Option<String>,
    /// Path of the signing key PEM. Derived from the output directory when unset.
    pub private_key_path: Option<PathBuf>,
    pub user_id: String,
    /// Parsed as a number when it looks like one.
    pub user_role: String,
    pub ns: String,
    pub expiry_hours: i64,
}

impl Default for MinterSettings {
    fn default() -> Self {
        Self {
            issuer: "anyong".to_string(),
            key_id: None,
            private_key_path: None,
            user_id: "user-123".to_string(),
            user_role: "1".to_string(),
            ns: "test".to_string(),
            expiry_hours: 24,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LoggingFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    Warn,
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub format: LoggingFormat,
    pub level: LogLevel,
}

/// Loads settings from `path` (which must exist) or from the default
/// configuration file if present, then applies environment overrides.
///
/// Runs before the subscriber is installed, so failures are only reported
/// through the returned error.
pub fn load_config(path: Option<&Path>) -> Result<Settings> {
    let file = match path {
        Some(path) => config::File::from(path).required(true),
        None => config::File::with_name(DEFAULT_CONFIG_NAME).required(false),
    };

    let cfg = config::Config::builder()
        .add_source(file)
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    Ok(cfg.try_deserialize::<Settings>()?)
}
