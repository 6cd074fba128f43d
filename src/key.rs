//! RSA key material.
//!
//! Generates the signing key pair and moves the private half in and out of
//! PKCS#8 PEM, optionally password protected.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::rngs::OsRng;
use rsa::pkcs8::{DecodePrivateKey, EncodePrivateKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use zeroize::Zeroizing;

use crate::error::Result;

/// Default modulus size in bits.
pub const DEFAULT_KEY_SIZE: usize = 2048;

/// A freshly generated RSA key pair. The public exponent is always 65537.
#[derive(Clone)]
pub struct KeyPair {
    pub private_key: RsaPrivateKey,
    pub public_key: RsaPublicKey,
}

impl KeyPair {
    /// Generates a new key pair with a modulus of `bits` bits.
    ///
    /// Invalid sizes are reported by the RSA primitive itself.
    #[tracing::instrument]
    pub fn generate(bits: usize) -> Result<Self> {
        let mut rng = OsRng;
        let private_key = RsaPrivateKey::new(&mut rng, bits)?;
        let public_key = RsaPublicKey::from(&private_key);
        tracing::debug!(bits, "generated RSA key pair");

        Ok(Self {
            private_key,
            public_key,
        })
    }
}

/// Serializes a private key to PKCS#8 PEM.
///
/// A non-empty `password` produces an `ENCRYPTED PRIVATE KEY` block
/// (PBES2 with scrypt and AES-256-CBC); otherwise the PEM is unencrypted.
#[tracing::instrument(skip_all, fields(encrypted))]
pub fn encode_private_key_pem(
    private_key: &RsaPrivateKey,
    password: Option<&str>,
) -> Result<Zeroizing<String>> {
    let pem = match password.filter(|p| !p.is_empty()) {
        Some(password) => {
            tracing::Span::current().record("encrypted", true);
            private_key.to_pkcs8_encrypted_pem(&mut OsRng, password.as_bytes(), LineEnding::LF)?
        }
        None => {
            tracing::Span::current().record("encrypted", false);
            private_key.to_pkcs8_pem(LineEnding::LF)?
        }
    };
    Ok(pem)
}

/// Parses a PKCS#8 PEM private key, decrypting it when `password` is set.
#[tracing::instrument(skip_all)]
pub fn decode_private_key_pem(pem: &str, password: Option<&str>) -> Result<RsaPrivateKey> {
    let key = match password.filter(|p| !p.is_empty()) {
        Some(password) => RsaPrivateKey::from_pkcs8_encrypted_pem(pem, password.as_bytes())?,
        None => RsaPrivateKey::from_pkcs8_pem(pem)?,
    };
    Ok(key)
}

/// Returns the base64url (unpadded) encodings of the modulus and exponent,
/// each taken from its minimal big-endian byte representation.
pub fn public_components(public_key: &RsaPublicKey) -> (String, String) {
    let n = URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be());
    let e = URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be());
    (n, e)
}
