//! Minting and checking the sample JWTs.
//!
//! Tokens are signed with the private key written by the generation step
//! and carry the claims the gateway filter reads (`UserId`, `UserRole`,
//! `NS`) next to the registered ones.

use std::convert::Infallible;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::Utc;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, decode_header, encode,
};
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::{Error, Result};
use crate::ident::{Issuer, KeyId};
use crate::jwks::Jwks;
use crate::key;
use crate::output;

const SECONDS_PER_HOUR: i64 = 3600;

/// The role claim. Numeric roles stay numbers on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserRole {
    Number(i64),
    Name(String),
}

impl FromStr for UserRole {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(s.parse()
            .map_or_else(|_| UserRole::Name(s.to_string()), UserRole::Number))
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Number(n) => write!(f, "{n}"),
            UserRole::Name(s) => f.write_str(s),
        }
    }
}

/// JWT claims for the tokens minted here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Issuer; ties the token to one JWKS.
    pub iss: String,
    /// Subject, same as `UserId`.
    pub sub: String,
    #[serde(rename = "UserId")]
    pub user_id: String,
    #[serde(rename = "UserRole")]
    pub user_role: UserRole,
    /// Namespace hint for the gateway.
    #[serde(rename = "NS")]
    pub ns: String,
    /// Issued at (UNIX timestamp).
    pub iat: i64,
    /// Expiration time (UNIX timestamp).
    pub exp: i64,
    /// Not before (UNIX timestamp), same as `iat`.
    pub nbf: i64,
}

/// Who the token is for.
#[derive(Debug, Clone)]
pub struct TokenRequest {
    pub user_id: String,
    pub user_role: UserRole,
    pub ns: String,
    pub expiry_hours: i64,
}

/// Which key signs tokens, and for which issuer.
#[derive(Clone)]
pub struct MintConfig {
    pub issuer: Issuer,
    /// Must match the `kid` published in the issuer's JWKS.
    pub key_id: KeyId,
    pub private_key_path: PathBuf,
    pub private_key_password: Option<Zeroizing<String>>,
}

impl fmt::Debug for MintConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MintConfig")
            .field("issuer", &self.issuer)
            .field("key_id", &self.key_id)
            .field("private_key_path", &self.private_key_path)
            .finish_non_exhaustive()
    }
}

impl MintConfig {
    /// Finds the signing key for `issuer` among the artifacts in
    /// `output_dir`, using the first key of `jwks_<issuer>.json`.
    #[tracing::instrument]
    pub fn discover(output_dir: &Path, issuer: &Issuer) -> Result<Self> {
        let jwks_path = output::jwks_path(output_dir, issuer);
        let jwks = output::load_existing_jwks(&jwks_path)?
            .ok_or_else(|| Error::JwksNotFound {
                path: jwks_path.clone(),
            })?;
        let jwk = jwks
            .keys
            .first()
            .ok_or(Error::EmptyJwks { path: jwks_path })?;

        let key_id = KeyId::parse(jwk.kid.clone())?;
        let private_key_path = output::private_key_path(output_dir, issuer, &key_id);
        tracing::debug!(
            kid = %key_id,
            path = %private_key_path.display(),
            "discovered signing key"
        );

        Ok(Self {
            issuer: issuer.clone(),
            key_id,
            private_key_path,
            private_key_password: None,
        })
    }

    /// Resolves the signing key from explicit overrides, falling back to
    /// [`MintConfig::discover`].
    ///
    /// A `key_id` without a `private_key_path` selects the PEM written for
    /// that kid, so the signing key always matches the header `kid`.
    pub fn resolve(
        output_dir: &Path,
        issuer: &Issuer,
        key_id: Option<KeyId>,
        private_key_path: Option<PathBuf>,
    ) -> Result<Self> {
        let (key_id, private_key_path) = match (key_id, private_key_path) {
            (Some(key_id), Some(path)) => (key_id, path),
            (Some(key_id), None) => {
                let path = output::private_key_path(output_dir, issuer, &key_id);
                (key_id, path)
            }
            (None, path) => {
                let found = Self::discover(output_dir, issuer)?;
                (found.key_id, path.unwrap_or(found.private_key_path))
            }
        };

        Ok(Self {
            issuer: issuer.clone(),
            key_id,
            private_key_path,
            private_key_password: None,
        })
    }
}

/// Builds the claims for `request` as of `now` (UNIX seconds).
///
/// `expiry_hours` must be positive and `exp` must fit in an `i64`.
pub fn build_claims(issuer: &Issuer, request: &TokenRequest, now: i64) -> Result<Claims> {
    let hours = request.expiry_hours;
    let exp = Some(hours)
        .filter(|h| *h > 0)
        .and_then(|h| h.checked_mul(SECONDS_PER_HOUR))
        .and_then(|secs| now.checked_add(secs))
        .ok_or(Error::InvalidExpiry { hours })?;

    let claims = Claims {
        iss: issuer.to_string(),
        sub: request.user_id.clone(),
        user_id: request.user_id.clone(),
        user_role: request.user_role.clone(),
        ns: request.ns.clone(),
        iat: now,
        exp,
        nbf: now,
    };
    tracing::debug!("created claims - {:?}", claims);
    Ok(claims)
}

/// A loaded private key together with the key id it is published under.
pub struct Signer {
    kid: KeyId,
    encoding_key: EncodingKey,
}

impl Signer {
    /// Loads the private key named by `config`.
    ///
    /// A missing file is reported as [`Error::PrivateKeyNotFound`].
    #[tracing::instrument]
    pub fn load(config: &MintConfig) -> Result<Self> {
        let path = &config.private_key_path;
        let pem = fs::read_to_string(path).map(Zeroizing::new).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                Error::PrivateKeyNotFound { path: path.clone() }
            } else {
                Error::io(path, e)
            }
        })?;

        let password = config.private_key_password.as_deref().map(String::as_str);
        Self::from_pem(config.key_id.clone(), &pem, password)
    }

    /// Builds a signer from PKCS#8 PEM text.
    pub fn from_pem(kid: KeyId, pem: &str, password: Option<&str>) -> Result<Self> {
        // jsonwebtoken cannot read encrypted PEM, so hand it a decrypted copy.
        let private_key = key::decode_private_key_pem(pem, password)?;
        let plain = private_key.to_pkcs8_pem(LineEnding::LF)?;
        let encoding_key = EncodingKey::from_rsa_pem(plain.as_bytes())?;
        Ok(Self { kid, encoding_key })
    }

    pub fn kid(&self) -> &KeyId {
        &self.kid
    }

    /// Signs `claims` with RS256, tagging the header with this key's id.
    pub fn sign(&self, claims: &Claims) -> Result<String> {
        let mut header = Header::new(Algorithm::RS256);
        header.typ = Some("JWT".to_string());
        header.kid = Some(self.kid.to_string());
        Ok(encode(&header, claims, &self.encoding_key)?)
    }
}

/// Mints a token for `request`, valid from now for `expiry_hours`.
#[tracing::instrument(skip(config), fields(issuer = %config.issuer, kid = %config.key_id))]
pub fn mint_token(config: &MintConfig, request: &TokenRequest) -> Result<String> {
    let signer = Signer::load(config)?;
    let claims = build_claims(&config.issuer, request, Utc::now().timestamp())?;
    let token = signer.sign(&claims)?;
    tracing::info!(kid = %signer.kid(), exp = claims.exp, "minted token");
    Ok(token)
}

/// Decodes a token's payload without checking its signature. For display only.
pub fn decode_unverified<T: DeserializeOwned>(token: &str) -> Result<T> {
    let decoded = jsonwebtoken::dangerous::insecure_decode::<T>(token)?;
    Ok(decoded.claims)
}

/// Verifies a token against `jwks`: looks the key up by the header `kid`,
/// then checks the RS256 signature, `exp`, `nbf` and the issuer.
#[tracing::instrument(skip(token, jwks))]
pub fn verify_token(token: &str, jwks: &Jwks, issuer: &Issuer) -> Result<Claims> {
    let header = decode_header(token)?;
    let kid = header.kid.ok_or(Error::MissingKeyId)?;
    let jwk = jwks
        .find(&kid)
        .ok_or_else(|| Error::UnknownKeyId { kid: kid.clone() })?;

    let decoding_key = DecodingKey::from_rsa_components(&jwk.n, &jwk.e)?;
    let mut validation = Validation::new(Algorithm::RS256);
    validation.validate_nbf = true;
    validation.set_issuer(&[issuer.as_str()]);

    let decoded = decode::<Claims>(token, &decoding_key, &validation)?;
    tracing::debug!(%kid, "verified token");
    Ok(decoded.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::{GenerateOptions, JwksBundle, generate_jwks_for_issuer};
    use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
    use serde_json::{Value, json};
    use tempfile::TempDir;

    fn request(expiry_hours: i64) -> TokenRequest {
        TokenRequest {
            user_id: "user-123".to_string(),
            user_role: UserRole::Number(1),
            ns: "test".to_string(),
            expiry_hours,
        }
    }

    fn saved_bundle(dir: &Path, issuer: &str) -> JwksBundle {
        let issuer = Issuer::parse(issuer).unwrap();
        let bundle = generate_jwks_for_issuer(&issuer, &GenerateOptions::default()).unwrap();
        output::save_bundle(&bundle, dir).unwrap();
        bundle
    }

    #[test]
    fn test_build_claims() {
        let issuer = Issuer::parse("anyong").unwrap();
        let claims = build_claims(&issuer, &request(24), 1_700_000_000).unwrap();

        assert_eq!(claims.iss, "anyong");
        assert_eq!(claims.sub, "user-123");
        assert_eq!(claims.user_id, "user-123");
        assert_eq!(claims.iat, claims.nbf);
        assert_eq!(claims.exp - claims.iat, 24 * 3600);

        let serialized = serde_json::to_value(&claims).unwrap();
        assert_eq!(serialized["UserId"], json!("user-123"));
        assert_eq!(serialized["UserRole"], json!(1));
        assert_eq!(serialized["NS"], json!("test"));
    }

    #[test]
    fn test_build_claims_rejects_bad_lifetimes() {
        let issuer = Issuer::parse("anyong").unwrap();
        for hours in [0, -1, i64::MAX / 1000, i64::MAX] {
            assert!(matches!(
                build_claims(&issuer, &request(hours), 1_700_000_000),
                Err(Error::InvalidExpiry { hours: h }) if h == hours
            ));
        }

        // Fits after multiplying, overflows when added to `now`.
        let hours = i64::MAX / SECONDS_PER_HOUR;
        assert!(matches!(
            build_claims(&issuer, &request(hours), 1_700_000_000),
            Err(Error::InvalidExpiry { .. })
        ));
        assert!(build_claims(&issuer, &request(hours), 0).is_ok());
    }

    #[test]
    fn test_user_role_parsing() {
        assert_eq!("1".parse::<UserRole>().unwrap(), UserRole::Number(1));
        assert_eq!(
            "admin".parse::<UserRole>().unwrap(),
            UserRole::Name("admin".to_string())
        );
        assert_eq!(
            serde_json::to_value(UserRole::Name("guest".into())).unwrap(),
            json!("guest")
        );
    }

    #[test]
    fn test_mint_and_verify() {
        let tmp = TempDir::new().unwrap();
        let bundle = saved_bundle(tmp.path(), "anyong");
        let config = MintConfig::discover(tmp.path(), &bundle.issuer).unwrap();
        assert_eq!(config.key_id, bundle.key_id);

        let token = mint_token(&config, &request(1)).unwrap();
        assert_eq!(token.split('.').count(), 3);

        let payload: Value = decode_unverified(&token).unwrap();
        assert_eq!(payload["sub"], json!("user-123"));
        assert_eq!(
            payload["exp"].as_i64().unwrap() - payload["iat"].as_i64().unwrap(),
            3600
        );

        let claims = verify_token(&token, &bundle.jwks, &bundle.issuer).unwrap();
        assert_eq!(claims.sub, "user-123");
        assert_eq!(claims.ns, "test");
    }

    #[test]
    fn test_header_fields() {
        let tmp = TempDir::new().unwrap();
        let bundle = saved_bundle(tmp.path(), "hdr");
        let config = MintConfig::discover(tmp.path(), &bundle.issuer).unwrap();
        let token = mint_token(&config, &request(1)).unwrap();

        let header_segment = token.split('.').next().unwrap();
        let header: Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(header_segment).unwrap()).unwrap();
        assert_eq!(header["alg"], json!("RS256"));
        assert_eq!(header["typ"], json!("JWT"));
        assert_eq!(header["kid"], json!(bundle.key_id.as_str()));
    }

    #[test]
    fn test_verify_rejects_other_key_and_issuer() {
        let tmp = TempDir::new().unwrap();
        let bundle = saved_bundle(tmp.path(), "anyong");
        let config = MintConfig::discover(tmp.path(), &bundle.issuer).unwrap();
        let token = mint_token(&config, &request(1)).unwrap();

        let wrong_issuer = Issuer::parse("someone-else").unwrap();
        assert!(matches!(
            verify_token(&token, &bundle.jwks, &wrong_issuer),
            Err(Error::Jwt(_))
        ));

        // Same kid, different modulus.
        let mut forged = bundle.jwks.clone();
        let other = generate_jwks_for_issuer(&bundle.issuer, &GenerateOptions::default()).unwrap();
        forged.keys[0].n = other.jwks.keys[0].n.clone();
        assert!(matches!(
            verify_token(&token, &forged, &bundle.issuer),
            Err(Error::Jwt(_))
        ));

        let mut renamed = bundle.jwks.clone();
        renamed.keys[0].kid = "different".to_string();
        assert!(matches!(
            verify_token(&token, &renamed, &bundle.issuer),
            Err(Error::UnknownKeyId { .. })
        ));
    }

    #[test]
    fn test_expired_token_fails_verification() {
        let tmp = TempDir::new().unwrap();
        let bundle = saved_bundle(tmp.path(), "expired");
        let config = MintConfig::discover(tmp.path(), &bundle.issuer).unwrap();

        let signer = Signer::load(&config).unwrap();
        let claims =
            build_claims(&bundle.issuer, &request(1), Utc::now().timestamp() - 3 * 3600).unwrap();
        let token = signer.sign(&claims).unwrap();

        assert!(matches!(
            verify_token(&token, &bundle.jwks, &bundle.issuer),
            Err(Error::Jwt(_))
        ));
    }

    #[test]
    fn test_missing_private_key() {
        let tmp = TempDir::new().unwrap();
        let config = MintConfig {
            issuer: Issuer::parse("anyong").unwrap(),
            key_id: KeyId::parse("OGU5MjA5ODYtZDAz").unwrap(),
            private_key_path: tmp.path().join("private_key_anyong_OGU5MjA5ODYtZDAz.pem"),
            private_key_password: None,
        };

        let err = mint_token(&config, &request(24)).unwrap_err();
        assert!(matches!(err, Error::PrivateKeyNotFound { .. }));
        assert!(err.to_string().contains("run generate-jwks"));
    }

    #[test]
    fn test_resolve_pinned_kid_uses_its_own_key() {
        let tmp = TempDir::new().unwrap();
        let issuer = Issuer::parse("pinned").unwrap();
        let pinned = |kid: &str| GenerateOptions {
            key_id: Some(KeyId::parse(kid).unwrap()),
            ..Default::default()
        };

        let old = generate_jwks_for_issuer(&issuer, &pinned("old-kid")).unwrap();
        output::save_bundle(&old, tmp.path()).unwrap();
        // Replaces the JWKS; the old PEM stays on disk under its own kid.
        let new = generate_jwks_for_issuer(&issuer, &pinned("new-kid")).unwrap();
        output::save_bundle(&new, tmp.path()).unwrap();

        let config =
            MintConfig::resolve(tmp.path(), &issuer, Some(old.key_id.clone()), None).unwrap();
        assert_eq!(config.key_id, old.key_id);
        assert_eq!(
            config.private_key_path,
            output::private_key_path(tmp.path(), &issuer, &old.key_id)
        );

        let token = mint_token(&config, &request(1)).unwrap();
        assert_eq!(decode_header(&token).unwrap().kid.as_deref(), Some("old-kid"));
        assert!(verify_token(&token, &old.jwks, &issuer).is_ok());
        assert!(verify_token(&token, &new.jwks, &issuer).is_err());

        // Without overrides the current JWKS wins.
        let config = MintConfig::resolve(tmp.path(), &issuer, None, None).unwrap();
        assert_eq!(config.key_id, new.key_id);
        let token = mint_token(&config, &request(1)).unwrap();
        assert!(verify_token(&token, &new.jwks, &issuer).is_ok());

        // An explicit path is taken as given.
        let path = tmp.path().join("elsewhere.pem");
        let config = MintConfig::resolve(tmp.path(), &issuer, None, Some(path.clone())).unwrap();
        assert_eq!(config.key_id, new.key_id);
        assert_eq!(config.private_key_path, path);
    }

    #[test]
    fn test_discover_without_jwks() {
        let tmp = TempDir::new().unwrap();
        let issuer = Issuer::parse("ghost").unwrap();
        assert!(matches!(
            MintConfig::discover(tmp.path(), &issuer),
            Err(Error::JwksNotFound { .. })
        ));
    }

    #[test]
    fn test_encrypted_key_signs() {
        let issuer = Issuer::parse("locked").unwrap();
        let options = GenerateOptions {
            password: Some(Zeroizing::new("pw".to_string())),
            ..Default::default()
        };
        let bundle = generate_jwks_for_issuer(&issuer, &options).unwrap();

        let signer =
            Signer::from_pem(bundle.key_id.clone(), &bundle.private_key_pem, Some("pw")).unwrap();
        let claims = build_claims(&issuer, &request(1), Utc::now().timestamp()).unwrap();
        let token = signer.sign(&claims).unwrap();

        assert_eq!(verify_token(&token, &bundle.jwks, &issuer).unwrap(), claims);
    }
}
