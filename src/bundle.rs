//! Assembles everything generated for one issuer.

use zeroize::Zeroizing;

use crate::error::Result;
use crate::ident::{Issuer, KeyId};
use crate::jwks::{Jwk, Jwks};
use crate::key::{self, KeyPair};

/// Options for [`generate_jwks_for_issuer`].
#[derive(Clone)]
pub struct GenerateOptions {
    /// Pinned key id; a fresh one is generated when `None`.
    pub key_id: Option<KeyId>,
    /// RSA modulus size in bits.
    pub key_size: usize,
    /// Password for the exported private key PEM.
    pub password: Option<Zeroizing<String>>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            key_id: None,
            key_size: key::DEFAULT_KEY_SIZE,
            password: None,
        }
    }
}

impl std::fmt::Debug for GenerateOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerateOptions")
            .field("key_id", &self.key_id)
            .field("key_size", &self.key_size)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Key material and metadata produced for one issuer.
#[derive(Clone)]
pub struct JwksBundle {
    pub issuer: Issuer,
    /// Holds exactly the one generated key.
    pub jwks: Jwks,
    pub private_key_pem: Zeroizing<String>,
    pub key_id: KeyId,
    pub algorithm: String,
    pub key_type: String,
}

impl std::fmt::Debug for JwksBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwksBundle")
            .field("issuer", &self.issuer)
            .field("jwks", &self.jwks)
            .field("key_id", &self.key_id)
            .field("algorithm", &self.algorithm)
            .field("key_type", &self.key_type)
            .finish_non_exhaustive()
    }
}

/// Generates a new key pair for `issuer` and wraps its public half in a JWKS.
///
/// Every call produces a new key pair; only the key id can be pinned.
#[tracing::instrument(skip(options), fields(key_size = options.key_size))]
pub fn generate_jwks_for_issuer(issuer: &Issuer, options: &GenerateOptions) -> Result<JwksBundle> {
    let pair = KeyPair::generate(options.key_size)?;

    let jwk = Jwk::from_public_key(&pair.public_key, options.key_id.as_ref());
    tracing::info!(kid = %jwk.kid, "generated JWK");

    let password = options.password.as_deref().map(String::as_str);
    let private_key_pem = key::encode_private_key_pem(&pair.private_key, password)?;

    // Generated kids are base64url and always pass the filename check.
    let key_id = KeyId::parse(jwk.kid.clone())?;
    let algorithm = jwk.alg.clone();
    let key_type = jwk.kty.clone();

    Ok(JwksBundle {
        issuer: issuer.clone(),
        jwks: Jwks::single(jwk),
        private_key_pem,
        key_id,
        algorithm,
        key_type,
    })
}
