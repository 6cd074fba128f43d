//! Issuer and key id newtypes.
//!
//! Both end up in filenames and inside quoted YAML scalars, so both are
//! restricted to a small allow-list of characters at construction time.

use std::fmt;

use crate::error::{Error, Result};

const MAX_LEN: usize = 128;

fn check(kind: &'static str, value: &str) -> Result<()> {
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-');

    if value.is_empty()
        || value.len() > MAX_LEN
        || value == "."
        || value == ".."
        || !value.chars().all(allowed)
    {
        tracing::warn!(kind, value, "rejected identifier");
        return Err(Error::InvalidIdentifier {
            kind,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// A JWT issuer that is safe to use as a filename component and YAML scalar.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Issuer(String);

impl Issuer {
    pub fn parse(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        check("issuer", &value)?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Issuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A key id (`kid`) that is safe to use as a filename component.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyId(String);

impl KeyId {
    pub fn parse(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        check("key id", &value)?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_plain_identifiers() {
        for ok in ["anyong", "my-company", "test_issuer", "v1.2", "OGU5MjA5ODYtZDAz"] {
            assert_eq!(Issuer::parse(ok).unwrap().as_str(), ok);
            assert_eq!(KeyId::parse(ok).unwrap().as_str(), ok);
        }
    }

    #[test]
    fn test_rejects_path_and_yaml_hazards() {
        for bad in ["", ".", "..", "../etc", "a/b", "a\\b", "\"quoted\"", "it's", "a b", "x:y"] {
            let err = Issuer::parse(bad).unwrap_err();
            assert!(
                matches!(err, Error::InvalidIdentifier { kind: "issuer", .. }),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_rejects_overlong() {
        let long = "a".repeat(MAX_LEN + 1);
        assert!(KeyId::parse(long).is_err());
        assert!(KeyId::parse("a".repeat(MAX_LEN)).is_ok());
    }
}
