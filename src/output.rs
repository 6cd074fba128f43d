//! Writing generated artifacts to disk and reading them back.
//!
//! Each issuer gets three files in the output directory:
//!
//! - `jwks_<issuer>.json`: the public JWKS
//! - `private_key_<issuer>_<kid>.pem`: the RSA private key (keep secret)
//! - `jwt-auth-<issuer>.yml`: the Istio `RequestAuthentication`
//!
//! Files are staged next to their targets and renamed into place once all
//! three are written. Existing files for the same issuer are overwritten.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::bundle::JwksBundle;
use crate::error::{Error, Result};
use crate::ident::{Issuer, KeyId};
use crate::istio;
use crate::jwks::Jwks;

/// Paths of the three files written for an issuer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub jwks_file: PathBuf,
    pub private_key_file: PathBuf,
    pub auth_config_file: PathBuf,
}

impl ArtifactPaths {
    pub fn new(output_dir: &Path, issuer: &Issuer, key_id: &KeyId) -> Self {
        Self {
            jwks_file: jwks_path(output_dir, issuer),
            private_key_file: private_key_path(output_dir, issuer, key_id),
            auth_config_file: output_dir.join(format!("jwt-auth-{issuer}.yml")),
        }
    }
}

/// Location of the JWKS file for `issuer`.
pub fn jwks_path(output_dir: &Path, issuer: &Issuer) -> PathBuf {
    output_dir.join(format!("jwks_{issuer}.json"))
}

/// Location of the private key PEM for `issuer` and `key_id`.
pub fn private_key_path(output_dir: &Path, issuer: &Issuer, key_id: &KeyId) -> PathBuf {
    output_dir.join(format!("private_key_{issuer}_{key_id}.pem"))
}

/// A fully written file waiting to be renamed onto its target.
struct Staged {
    file: NamedTempFile,
    target: PathBuf,
}

fn stage(output_dir: &Path, target: PathBuf, contents: &[u8], public: bool) -> Result<Staged> {
    let mut file = tempfile::Builder::new()
        .prefix(".jwks-forge-")
        .tempfile_in(output_dir)
        .map_err(|e| Error::io(output_dir, e))?;

    file.write_all(contents)
        .and_then(|()| file.flush())
        .map_err(|e| Error::io(file.path(), e))?;

    // Temp files start out owner-only, which suits the private key but not
    // the public artifacts.
    #[cfg(unix)]
    if public {
        use std::os::unix::fs::PermissionsExt;
        file.as_file()
            .set_permissions(fs::Permissions::from_mode(0o644))
            .map_err(|e| Error::io(file.path(), e))?;
    }
    #[cfg(not(unix))]
    let _ = public;

    Ok(Staged { file, target })
}

/// Writes the bundle's JWKS, private key and Istio manifest into
/// `output_dir`, creating the directory (and parents) if needed.
///
/// Nothing is renamed onto a target until all three files are staged, so a
/// failure while writing leaves earlier artifacts untouched. The renames
/// themselves are not rolled back if a later one fails.
#[tracing::instrument(skip(bundle), fields(issuer = %bundle.issuer, kid = %bundle.key_id))]
pub fn save_bundle(bundle: &JwksBundle, output_dir: &Path) -> Result<ArtifactPaths> {
    fs::create_dir_all(output_dir).map_err(|e| Error::io(output_dir, e))?;

    let paths = ArtifactPaths::new(output_dir, &bundle.issuer, &bundle.key_id);

    let jwks_json = bundle.jwks.to_pretty_json()?;
    let auth_config = istio::render_request_authentication(bundle)?;

    let staged = [
        stage(output_dir, paths.jwks_file.clone(), jwks_json.as_bytes(), true)?,
        stage(
            output_dir,
            paths.private_key_file.clone(),
            bundle.private_key_pem.as_bytes(),
            false,
        )?,
        stage(output_dir, paths.auth_config_file.clone(), auth_config.as_bytes(), true)?,
    ];

    for Staged { file, target } in staged {
        file.persist(&target)
            .map_err(|e| Error::io(&target, e.error))?;
        tracing::info!(path = %target.display(), "wrote artifact");
    }

    Ok(paths)
}

/// Reads a JWKS file written earlier. A missing file yields `None`.
#[tracing::instrument]
pub fn load_existing_jwks(path: &Path) -> Result<Option<Jwks>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!("no existing JWKS");
            return Ok(None);
        }
        Err(e) => return Err(Error::io(path, e)),
    };
    Ok(Some(serde_json::from_str(&contents)?))
}
