//! private_key_jwt client assertions (RFC 7523 §2.2, OIDC Core §9).
//!
//! The assertion authenticates the client itself, so `iss` and `sub` are
//! both the client id. Assertions are short-lived and carry a fresh `jti`;
//! callers build a new one for every token request.

use std::time::Duration;

use chrono::{DateTime, Utc};
use sealedpass_crypto::{EcPublicKey, SignatureAlgorithm};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;
use crate::jws::{sign_compact, verify_compact, CompactJws};
use crate::keystore::SigningKey;

/// `client_assertion_type` for JWT bearer client authentication.
pub const CLIENT_ASSERTION_TYPE: &str = "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

/// Default assertion lifetime (2 minutes).
pub const DEFAULT_ASSERTION_LIFETIME: Duration = Duration::from_secs(120);

/// Longest lifetime an assertion may be signed with.
pub const MAX_ASSERTION_LIFETIME: Duration = Duration::from_secs(300);

/// Claims of a client assertion JWT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientAssertionClaims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

#[derive(Serialize)]
struct AssertionHeader<'a> {
    alg: &'a str,
    kid: &'a str,
    typ: &'a str,
}

impl ClientAssertionClaims {
    /// Claims issued now, valid for `lifetime`.
    pub fn new(client_id: &str, audience: &str, lifetime: Duration) -> Result<Self, AuthError> {
        Self::issued_at(client_id, audience, Utc::now(), lifetime)
    }

    /// Claims issued at `issued_at`, valid for `lifetime`.
    pub fn issued_at(
        client_id: &str,
        audience: &str,
        issued_at: DateTime<Utc>,
        lifetime: Duration,
    ) -> Result<Self, AuthError> {
        if client_id.is_empty() {
            return Err(AuthError::InvalidClaims("client id is empty".to_string()));
        }
        if audience.is_empty() {
            return Err(AuthError::InvalidClaims("audience is empty".to_string()));
        }
        check_lifetime(lifetime)?;

        let iat = issued_at.timestamp();
        Ok(Self {
            iss: client_id.to_string(),
            sub: client_id.to_string(),
            aud: audience.to_string(),
            iat,
            exp: iat + lifetime.as_secs() as i64,
            jti: uuid::Uuid::new_v4().to_string(),
        })
    }

    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.exp
    }
}

/// Sign `claims` as a compact JWS with the key's declared algorithm.
///
/// The protected header carries `alg`, `kid` and
/// `typ: urn:ietf:params:oauth:client-assertion-type:jwt-bearer`.
pub fn sign_client_assertion(
    claims: &ClientAssertionClaims,
    key: &SigningKey,
) -> Result<CompactJws, AuthError> {
    if claims.sub != claims.iss {
        return Err(AuthError::InvalidClaims(
            "sub must equal iss (the client id)".to_string(),
        ));
    }
    if claims.exp <= claims.iat {
        return Err(AuthError::InvalidClaims(
            "exp must be after iat".to_string(),
        ));
    }
    check_lifetime(Duration::from_secs((claims.exp - claims.iat) as u64))?;

    let header = AssertionHeader {
        alg: key.alg().jwa_name(),
        kid: key.kid(),
        typ: CLIENT_ASSERTION_TYPE,
    };
    sign_compact(&header, claims, key)
}

/// What a token endpoint expects of an assertion.
#[derive(Debug, Clone, Copy)]
pub struct AssertionExpectations<'a> {
    pub client_id: &'a str,
    pub audience: &'a str,
}

/// Verify an assertion the way a token endpoint would.
///
/// Checks the signature, `iss == sub == client_id`, `aud`, and that the
/// assertion has not expired at `now` (unix seconds).
pub fn verify_client_assertion(
    token: &str,
    alg: SignatureAlgorithm,
    public_key: &EcPublicKey,
    expected: &AssertionExpectations<'_>,
    now: i64,
) -> Result<ClientAssertionClaims, AuthError> {
    let jws = CompactJws::parse(token)?;
    let claims: ClientAssertionClaims =
        serde_json::from_value(verify_compact(&jws, alg, public_key)?)?;

    if claims.iss != expected.client_id || claims.sub != expected.client_id {
        return Err(AuthError::AssertionRejected(format!(
            "iss/sub must be {}, got {}/{}",
            expected.client_id, claims.iss, claims.sub
        )));
    }
    if claims.aud != expected.audience {
        return Err(AuthError::AssertionRejected(format!(
            "aud must be {}, got {}",
            expected.audience, claims.aud
        )));
    }
    if claims.is_expired_at(now) {
        return Err(AuthError::AssertionRejected(format!(
            "expired at {}",
            claims.exp
        )));
    }
    Ok(claims)
}

fn check_lifetime(lifetime: Duration) -> Result<(), AuthError> {
    if lifetime.is_zero() || lifetime > MAX_ASSERTION_LIFETIME {
        return Err(AuthError::InvalidClaims(format!(
            "lifetime must be between 1s and {}s, got {}s",
            MAX_ASSERTION_LIFETIME.as_secs(),
            lifetime.as_secs()
        )));
    }
    Ok(())
}
