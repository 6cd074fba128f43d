//! JSON Web Key (Set) types.
//!
//! Converts the public half of a key pair into the JWK published to Istio
//! and wraps keys into the JWKS document.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rsa::RsaPublicKey;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ident::KeyId;
use crate::key;

/// Default JWS algorithm advertised for generated keys.
pub const DEFAULT_ALG: &str = "RS256";
/// Default key use advertised for generated keys.
pub const DEFAULT_USE: &str = "sig";
/// Key type of every key this crate produces.
pub const KTY_RSA: &str = "RSA";

/// Length of a generated key id.
pub const GENERATED_KID_LEN: usize = 16;

/// A JSON Web Key Set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwks {
    /// List of keys, in insertion order.
    pub keys: Vec<Jwk>,
}

/// A JSON Web Key.
///
/// Field order matches the serialized form: `kty, kid, use, alg, n, e`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    /// Key type (e.g., "RSA").
    pub kty: String,
    /// Key ID.
    pub kid: String,
    /// Key use (e.g., "sig").
    pub r#use: String,
    /// Algorithm (e.g., "RS256").
    pub alg: String,
    /// Modulus (Base64URL encoded).
    pub n: String,
    /// Exponent (Base64URL encoded).
    pub e: String,
}

impl Jwk {
    /// Encodes an RSA public key as a JWK with the default `use` and `alg`.
    ///
    /// A missing `kid` is replaced by [`generate_kid`].
    pub fn from_public_key(public_key: &RsaPublicKey, kid: Option<&KeyId>) -> Self {
        Self::from_public_key_with(public_key, kid, DEFAULT_USE, DEFAULT_ALG)
    }

    /// Like [`Jwk::from_public_key`] but with an explicit `use` and `alg`.
    pub fn from_public_key_with(
        public_key: &RsaPublicKey,
        kid: Option<&KeyId>,
        key_use: &str,
        alg: &str,
    ) -> Self {
        let (n, e) = key::public_components(public_key);
        let kid = kid.map_or_else(generate_kid, |k| k.as_str().to_string());

        Self {
            kty: KTY_RSA.to_string(),
            kid,
            r#use: key_use.to_string(),
            alg: alg.to_string(),
            n,
            e,
        }
    }
}

impl Jwks {
    /// Wraps a single key.
    pub fn single(jwk: Jwk) -> Self {
        Self { keys: vec![jwk] }
    }

    /// Builds a one-key set from already encoded RSA components of an
    /// existing key.
    pub fn from_components(n: &str, e: &str, kid: &str, alg: &str, key_use: &str) -> Self {
        Self::single(Jwk {
            kty: KTY_RSA.to_string(),
            kid: kid.to_string(),
            r#use: key_use.to_string(),
            alg: alg.to_string(),
            n: n.to_string(),
            e: e.to_string(),
        })
    }

    /// Looks up a key by id.
    pub fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|k| k.kid == kid)
    }

    /// Compact single-line JSON, as embedded in the Istio manifest.
    pub fn to_compact_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Two-space indented JSON, as written to `jwks_<issuer>.json`.
    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Generates a short key id: the base64url encoding of a random UUID's
/// hyphenated text, cut to [`GENERATED_KID_LEN`] characters.
///
/// Short ids are only unlikely to collide; pass an explicit kid when
/// uniqueness matters.
pub fn generate_kid() -> String {
    let uuid = Uuid::new_v4().hyphenated().to_string();
    let mut kid = URL_SAFE_NO_PAD.encode(uuid.as_bytes());
    kid.truncate(GENERATED_KID_LEN);
    kid
}
