//! Error types shared by every stage of the pipeline.

use std::path::PathBuf;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while generating, writing or minting.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An issuer or key id that is unsafe to use in a filename or YAML scalar.
    #[error("invalid {kind} {value:?}: only ASCII letters, digits, '.', '_' and '-' are allowed")]
    InvalidIdentifier { kind: &'static str, value: String },

    /// The private key PEM the minter needs has not been generated yet.
    #[error(
        "private key file not found: {}\nrun generate-jwks for this issuer first to create it",
        path.display()
    )]
    PrivateKeyNotFound { path: PathBuf },

    /// The JWKS file used to discover the signing key has not been generated yet.
    #[error(
        "JWKS file not found: {}\nrun generate-jwks for this issuer first to create it",
        path.display()
    )]
    JwksNotFound { path: PathBuf },

    /// A JWKS file needed for key discovery has no usable key.
    #[error("JWKS at {} contains no keys", path.display())]
    EmptyJwks { path: PathBuf },

    /// A token lifetime that is not positive or does not fit in a timestamp.
    #[error("invalid token lifetime of {hours} hours")]
    InvalidExpiry { hours: i64 },

    /// The token header names a key id the JWKS does not contain.
    #[error("no key with kid {kid:?} in JWKS")]
    UnknownKeyId { kid: String },

    /// The token header carries no key id.
    #[error("token header has no kid")]
    MissingKeyId,

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("RSA error: {0}")]
    Rsa(#[from] rsa::Error),

    #[error("PKCS#8 error: {0}")]
    Pkcs8(#[from] pkcs8::Error),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(#[from] ::config::ConfigError),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
