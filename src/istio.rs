//! Istio `RequestAuthentication` manifest rendering.

use crate::bundle::JwksBundle;
use crate::error::Result;

/// Namespace the manifest is installed into.
pub const NAMESPACE: &str = "istio-system";
/// Header the decoded token payload is forwarded in.
pub const PAYLOAD_HEADER: &str = "x-jwt-payload";

/// Renders a `RequestAuthentication` that trusts tokens from the bundle's
/// issuer, with the JWKS inlined as compact JSON.
///
/// The issuer is already restricted to YAML-safe characters, so it is
/// interpolated as-is.
#[tracing::instrument(skip_all, fields(issuer = %bundle.issuer))]
pub fn render_request_authentication(bundle: &JwksBundle) -> Result<String> {
    let issuer = bundle.issuer.as_str();
    let jwks_json = bundle.jwks.to_compact_json()?;

    Ok(format!(
        r#"apiVersion: security.istio.io/v1beta1
kind: RequestAuthentication
metadata:
  name: "jwt-{issuer}"
  namespace: {NAMESPACE}
spec:
  selector:
    matchLabels:
      tier: api
  jwtRules:
    - issuer: "{issuer}"
      jwks: '{jwks_json}'
      outputPayloadToHeader: {PAYLOAD_HEADER}
      fromHeaders:
        - name: Authorization
          prefix: "Bearer "
"#
    ))
}
