//! Shape-only validation of JWKS documents.
//!
//! Checks that a JSON value looks like an RSA JWKS. Base64url well-formedness
//! and key soundness are not checked.

use serde_json::Value;

/// Fields every key must carry, checked in this order.
const REQUIRED_FIELDS: [&str; 4] = ["n", "e", "kid", "alg"];

/// Why a document is not a well-shaped RSA JWKS.
///
/// Key indexes in messages are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShapeError {
    #[error("JWKS must be a JSON object")]
    NotAnObject,
    #[error("JWKS must contain a 'keys' field")]
    MissingKeys,
    #[error("'keys' must be an array")]
    KeysNotArray,
    #[error("key {index} must be of type RSA")]
    NotRsa { index: usize },
    #[error("key {index} is missing the '{field}' field")]
    MissingField { index: usize, field: &'static str },
}

/// Message reported for a document that passes [`validate_jwks`].
pub const VALID_MESSAGE: &str = "JWKS format is valid";

/// Checks the structure of a JWKS, stopping at the first problem.
pub fn validate_jwks(value: &Value) -> Result<(), ShapeError> {
    let object = value.as_object().ok_or(ShapeError::NotAnObject)?;
    let keys = object.get("keys").ok_or(ShapeError::MissingKeys)?;
    let keys = keys.as_array().ok_or(ShapeError::KeysNotArray)?;

    for (i, key) in keys.iter().enumerate() {
        let index = i + 1;
        if key.get("kty").and_then(Value::as_str) != Some("RSA") {
            return Err(ShapeError::NotRsa { index });
        }
        if let Some(field) = REQUIRED_FIELDS.into_iter().find(|f| key.get(*f).is_none()) {
            return Err(ShapeError::MissingField { index, field });
        }
    }
    Ok(())
}

/// Validation result as an `(ok, message)` pair, for reporting.
pub fn validation_report(value: &Value) -> (bool, String) {
    match validate_jwks(value) {
        Ok(()) => (true, VALID_MESSAGE.to_string()),
        Err(e) => (false, e.to_string()),
    }
}
