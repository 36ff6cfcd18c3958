//! Compact JWS creation and inspection.

use std::fmt;

use sealedpass_crypto::{base64url_decode, base64url_encode, EcPublicKey, SignatureAlgorithm};
use serde::Serialize;
use serde_json::Value;

use crate::error::AuthError;
use crate::keystore::SigningKey;

/// A compact JWS: `header.payload.signature`.
///
/// Holding a `CompactJws` says nothing about the validity of its
/// signature; it only guarantees the three-segment shape.
#[derive(Clone, PartialEq, Eq)]
pub struct CompactJws(String);

impl CompactJws {
    /// Accept `token` if it has exactly three non-empty dot-separated segments.
    pub fn parse(token: impl Into<String>) -> Result<Self, AuthError> {
        let token = token.into();
        let segments = token.split('.').count();
        if segments != 3 {
            return Err(AuthError::JwsFormat(format!(
                "expected 3 segments, got {}",
                segments
            )));
        }
        if token.split('.').any(str::is_empty) {
            return Err(AuthError::JwsFormat("empty segment".to_string()));
        }
        Ok(Self(token))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Decoded protected header.
    pub fn header(&self) -> Result<Value, AuthError> {
        decode_json_segment(self.segment(0))
    }

    /// Decoded payload claims. The signature is NOT verified.
    pub fn unverified_claims(&self) -> Result<Value, AuthError> {
        decode_json_segment(self.segment(1))
    }

    /// `header.payload`, the bytes the signature covers.
    pub fn signing_input(&self) -> &str {
        match self.0.rfind('.') {
            Some(idx) => &self.0[..idx],
            None => &self.0,
        }
    }

    pub fn signature(&self) -> Result<Vec<u8>, AuthError> {
        base64url_decode(self.segment(2)).map_err(|e| AuthError::JwsFormat(e.to_string()))
    }

    fn segment(&self, index: usize) -> &str {
        self.0.split('.').nth(index).unwrap_or_default()
    }
}

// Tokens are bearer credentials; keep them out of logs.
impl fmt::Debug for CompactJws {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CompactJws(<{} bytes>)", self.0.len())
    }
}

/// Serialize `header` and `claims` and sign them with `key`.
pub fn sign_compact<H: Serialize, C: Serialize>(
    header: &H,
    claims: &C,
    key: &SigningKey,
) -> Result<CompactJws, AuthError> {
    let header_b64 = base64url_encode(&serde_json::to_vec(header)?);
    let claims_b64 = base64url_encode(&serde_json::to_vec(claims)?);
    let signing_input = format!("{}.{}", header_b64, claims_b64);

    let signature = key.sign(signing_input.as_bytes())?;
    Ok(CompactJws(format!(
        "{}.{}",
        signing_input,
        base64url_encode(&signature)
    )))
}

/// Verify `token` with `public_key` under `alg` and return its claims.
///
/// The header's `alg` must equal `alg`; any other value is rejected before
/// the signature is checked.
pub fn verify_compact(
    token: &CompactJws,
    alg: SignatureAlgorithm,
    public_key: &EcPublicKey,
) -> Result<Value, AuthError> {
    let header = token.header()?;
    let header_alg = header
        .get("alg")
        .and_then(Value::as_str)
        .ok_or_else(|| AuthError::JwsFormat("missing alg in header".to_string()))?;
    if header_alg != alg.jwa_name() {
        return Err(AuthError::UnsupportedAlgorithm(format!(
            "alg: expected {}, got {}",
            alg, header_alg
        )));
    }

    let signature = token.signature()?;
    if !sealedpass_crypto::verify(alg, public_key, token.signing_input().as_bytes(), &signature) {
        return Err(AuthError::AssertionRejected(
            "signature verification failed".to_string(),
        ));
    }
    token.unverified_claims()
}

fn decode_json_segment(segment: &str) -> Result<Value, AuthError> {
    let bytes = base64url_decode(segment).map_err(|e| AuthError::JwsFormat(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| AuthError::JwsFormat(e.to_string()))
}
