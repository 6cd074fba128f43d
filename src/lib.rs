//! RSA key generation, JWKS export and sample JWT minting for Istio
//! `RequestAuthentication`.
//!
//! The pipeline is straight-line:
//!
//! 1. [`key`] generates an RSA key pair and exports the private half as PEM.
//! 2. [`jwks`] turns the public half into a JWK / JWKS.
//! 3. [`bundle`] ties both to an [`Issuer`].
//! 4. [`istio`] renders the `RequestAuthentication` manifest.
//! 5. [`output`] writes the three artifacts to disk.
//! 6. [`token`] later signs JWTs with the written private key.
//!
//! [`validate`] checks the shape of any JWKS document.

pub mod bundle;
pub mod cli;
pub mod config;
pub mod error;
pub mod ident;
pub mod istio;
pub mod jwks;
pub mod key;
pub mod output;
pub mod telemetry;
pub mod token;
pub mod validate;

pub use bundle::{GenerateOptions, JwksBundle, generate_jwks_for_issuer};
pub use error::{Error, Result};
pub use ident::{Issuer, KeyId};
pub use jwks::{Jwk, Jwks};
pub use output::{ArtifactPaths, load_existing_jwks, save_bundle};
pub use token::{Claims, MintConfig, TokenRequest, UserRole, mint_token, verify_token};
pub use validate::{ShapeError, validate_jwks};
