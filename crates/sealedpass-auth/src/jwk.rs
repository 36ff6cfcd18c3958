//! JSON Web Key model for EC keys.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// An EC JSON Web Key, public or private.
///
/// Only the members the relying party needs are modelled; unknown members
/// are ignored on input.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    /// Key type ("EC")
    pub kty: String,
    /// Curve name (e.g. "P-521")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,
    /// x coordinate, base64url
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    /// y coordinate, base64url
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
    /// Private scalar, base64url. Present only on private keys.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<String>,
    /// Key ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    /// Intended use ("sig" or "enc")
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,
    /// Algorithm the key is bound to (e.g. "ES512", "ECDH-ES+A256KW")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
}

impl Jwk {
    /// Parse a single JWK from JSON text.
    pub fn from_json(json: &str) -> Result<Self, AuthError> {
        serde_json::from_str(json).map_err(|e| AuthError::InvalidJwk(e.to_string()))
    }

    /// Copy of this key with the private scalar removed.
    pub fn to_public(&self) -> Self {
        Self {
            d: None,
            ..self.clone()
        }
    }

    pub fn is_private(&self) -> bool {
        self.d.is_some()
    }

    pub(crate) fn require<'a>(
        field: &'a Option<String>,
        name: &'static str,
    ) -> Result<&'a str, AuthError> {
        match field.as_deref() {
            Some(v) if !v.is_empty() => Ok(v),
            _ => Err(AuthError::InvalidJwk(format!("missing {}", name))),
        }
    }
}

impl fmt::Debug for Jwk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Jwk")
            .field("kty", &self.kty)
            .field("crv", &self.crv)
            .field("kid", &self.kid)
            .field("use", &self.key_use)
            .field("alg", &self.alg)
            .field("d", &self.d.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

/// A JWK Set (RFC 7517 §5).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwkSet {
    pub keys: Vec<Jwk>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRIVATE_JWK: &str = r#"{
        "kty": "EC",
        "d": "AFOzlND2sq43ykty",
        "use": "sig",
        "crv": "P-521",
        "kid": "sig-2022-06-04T09:22:28Z",
        "x": "AAj_CAKL9NmP6agP",
        "y": "AZeoe0v-EwqD3oo1",
        "alg": "ES512"
    }"#;

    #[test]
    fn parses_use_member() {
        let jwk = Jwk::from_json(PRIVATE_JWK).unwrap();
        assert_eq!(jwk.key_use.as_deref(), Some("sig"));
        assert_eq!(jwk.alg.as_deref(), Some("ES512"));
        assert!(jwk.is_private());
    }

    #[test]
    fn public_copy_drops_scalar() {
        let jwk = Jwk::from_json(PRIVATE_JWK).unwrap();
        let public = jwk.to_public();
        assert!(!public.is_private());
        let json = serde_json::to_value(&public).unwrap();
        assert!(json.get("d").is_none());
        assert_eq!(json["use"], "sig");
        assert_eq!(json["kid"], "sig-2022-06-04T09:22:28Z");
    }

    #[test]
    fn debug_redacts_scalar() {
        let jwk = Jwk::from_json(PRIVATE_JWK).unwrap();
        let debug = format!("{:?}", jwk);
        assert!(!debug.contains("AFOzlND2sq43ykty"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn rejects_non_object() {
        assert!(matches!(
            Jwk::from_json("[1,2]"),
            Err(AuthError::InvalidJwk(_))
        ));
    }
}
