//! PKCE (RFC 7636) and the other per-flow random values.

use sealedpass_crypto::base64url_encode;
use sha2::{Digest, Sha256};

use crate::error::AuthError;

/// `code_challenge_method` used for every challenge this crate computes.
pub const CODE_CHALLENGE_METHOD: &str = "S256";

const VERIFIER_MIN_LEN: usize = 43;
const VERIFIER_MAX_LEN: usize = 128;

/// Generate a cryptographically random code verifier (43 characters).
///
/// Produces 32 random bytes encoded as base64url (43 chars).
pub fn generate_code_verifier() -> Result<String, AuthError> {
    random_token::<32>()
}

/// `base64url(SHA-256(verifier))`, the S256 code challenge.
pub fn compute_code_challenge(verifier: &str) -> String {
    base64url_encode(&Sha256::digest(verifier.as_bytes()))
}

/// Random `state` parameter (22 characters).
pub fn generate_state() -> Result<String, AuthError> {
    random_token::<16>()
}

/// Random `nonce` for the authorization request (43 characters).
pub fn generate_nonce() -> Result<String, AuthError> {
    random_token::<32>()
}

/// Check that `verifier` is 43 to 128 characters of
/// `[A-Z] / [a-z] / [0-9] / "-" / "." / "_" / "~"`.
pub fn validate_code_verifier(verifier: &str) -> Result<(), AuthError> {
    let len = verifier.len();
    if !(VERIFIER_MIN_LEN..=VERIFIER_MAX_LEN).contains(&len) {
        return Err(AuthError::InvalidCodeVerifier(format!(
            "length must be {}..={}, got {}",
            VERIFIER_MIN_LEN, VERIFIER_MAX_LEN, len
        )));
    }
    if let Some(bad) = verifier
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~')))
    {
        return Err(AuthError::InvalidCodeVerifier(format!(
            "character {:?} is not allowed",
            bad
        )));
    }
    Ok(())
}

fn random_token<const N: usize>() -> Result<String, AuthError> {
    let mut bytes = [0u8; N];
    getrandom::getrandom(&mut bytes).map_err(|e| AuthError::RngFailed(e.to_string()))?;
    Ok(base64url_encode(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_verifier_is_43_chars() {
        let verifier = generate_code_verifier().unwrap();
        assert_eq!(verifier.len(), 43);
        validate_code_verifier(&verifier).unwrap();
    }

    #[test]
    fn code_verifier_is_unique() {
        let v1 = generate_code_verifier().unwrap();
        let v2 = generate_code_verifier().unwrap();
        assert_ne!(v1, v2);
    }

    #[test]
    fn code_challenge_matches_rfc7636_appendix_b() {
        let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
        assert_eq!(
            compute_code_challenge(verifier),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn state_is_22_chars() {
        let state = generate_state().unwrap();
        assert_eq!(state.len(), 22);
        assert_ne!(state, generate_state().unwrap());
    }

    #[test]
    fn nonce_is_unique() {
        assert_ne!(generate_nonce().unwrap(), generate_nonce().unwrap());
    }

    #[test]
    fn rejects_short_long_and_reserved_verifiers() {
        assert!(validate_code_verifier("too-short").is_err());
        assert!(validate_code_verifier(&"a".repeat(129)).is_err());
        assert!(validate_code_verifier(&format!("{}+", "a".repeat(42))).is_err());
        assert!(validate_code_verifier(&"a~.-_".repeat(10)).is_ok());
    }
}
