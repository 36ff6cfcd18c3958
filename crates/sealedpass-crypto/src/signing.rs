//! ECDSA signing and verification for JWS (ES256, ES512).
//!
//! Produces IEEE P1363 format signatures (raw r||s): 64 bytes for ES256,
//! 132 bytes for ES512.

use ecdsa::signature::{Signer, Verifier};

use crate::algorithm::SignatureAlgorithm;
use crate::ec::{EcPublicKey, EcSecretKey};
use crate::error::CryptoError;

/// Sign `message` with `key` under `alg`.
///
/// Fails with `CurveMismatch` when the key does not live on the curve the
/// algorithm requires (e.g. a P-256 key used for ES512).
pub fn sign(
    alg: SignatureAlgorithm,
    key: &EcSecretKey,
    message: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    check_curve(alg, key.curve().jwk_name())?;

    match key {
        EcSecretKey::P256(secret) => {
            let signing_key = p256::ecdsa::SigningKey::from(secret);
            let signature: p256::ecdsa::Signature = signing_key
                .try_sign(message)
                .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;
            Ok(signature.to_bytes().to_vec())
        }
        EcSecretKey::P521(secret) => {
            let signing_key = p521::ecdsa::SigningKey::from_bytes(&secret.to_bytes())
                .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;
            let signature: p521::ecdsa::Signature = signing_key
                .try_sign(message)
                .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;
            Ok(signature.to_bytes().to_vec())
        }
    }
}

/// Verify a raw `r || s` signature.
///
/// Returns false for any failure, including a curve that does not match
/// `alg` or a malformed signature. Never errors on an invalid signature.
pub fn verify(
    alg: SignatureAlgorithm,
    key: &EcPublicKey,
    message: &[u8],
    signature_bytes: &[u8],
) -> bool {
    if check_curve(alg, key.curve().jwk_name()).is_err() {
        return false;
    }

    match key {
        EcPublicKey::P256(public) => {
            let verifying_key = p256::ecdsa::VerifyingKey::from(public);
            match p256::ecdsa::Signature::from_slice(signature_bytes) {
                Ok(signature) => verifying_key.verify(message, &signature).is_ok(),
                Err(_) => false,
            }
        }
        EcPublicKey::P521(public) => {
            let verifying_key =
                match p521::ecdsa::VerifyingKey::from_encoded_point(&to_point(public)) {
                    Ok(k) => k,
                    Err(_) => return false,
                };
            match p521::ecdsa::Signature::from_slice(signature_bytes) {
                Ok(signature) => verifying_key.verify(message, &signature).is_ok(),
                Err(_) => false,
            }
        }
    }
}

fn to_point(public: &p521::PublicKey) -> p521::EncodedPoint {
    use p521::elliptic_curve::sec1::ToEncodedPoint;
    public.to_encoded_point(false)
}

fn check_curve(alg: SignatureAlgorithm, got: &'static str) -> Result<(), CryptoError> {
    let expected = alg.curve().jwk_name();
    if expected != got {
        return Err(CryptoError::CurveMismatch { expected, got });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::EcCurve;

    #[test]
    fn es512_sign_verify_round_trip() {
        let key = EcSecretKey::generate(EcCurve::P521);
        let message = b"header.payload";

        let signature = sign(SignatureAlgorithm::Es512, &key, message).unwrap();
        assert_eq!(signature.len(), 132);
        assert!(verify(SignatureAlgorithm::Es512, &key.public_key(), message, &signature));
    }

    #[test]
    fn es256_sign_verify_round_trip() {
        let key = EcSecretKey::generate(EcCurve::P256);
        let signature = sign(SignatureAlgorithm::Es256, &key, b"msg").unwrap();
        assert_eq!(signature.len(), 64);
        assert!(verify(SignatureAlgorithm::Es256, &key.public_key(), b"msg", &signature));
    }

    #[test]
    fn rejects_key_on_wrong_curve() {
        let key = EcSecretKey::generate(EcCurve::P256);
        let err = sign(SignatureAlgorithm::Es512, &key, b"msg").unwrap_err();
        assert!(matches!(
            err,
            CryptoError::CurveMismatch {
                expected: "P-521",
                got: "P-256"
            }
        ));
    }

    #[test]
    fn wrong_key_fails() {
        let key1 = EcSecretKey::generate(EcCurve::P521);
        let key2 = EcSecretKey::generate(EcCurve::P521);
        let signature = sign(SignatureAlgorithm::Es512, &key1, b"hello").unwrap();
        assert!(!verify(SignatureAlgorithm::Es512, &key2.public_key(), b"hello", &signature));
    }

    #[test]
    fn tampered_message_fails() {
        let key = EcSecretKey::generate(EcCurve::P521);
        let signature = sign(SignatureAlgorithm::Es512, &key, b"original").unwrap();
        assert!(!verify(SignatureAlgorithm::Es512, &key.public_key(), b"tampered", &signature));
    }

    #[test]
    fn malformed_signature_returns_false() {
        let key = EcSecretKey::generate(EcCurve::P521);
        assert!(!verify(SignatureAlgorithm::Es512, &key.public_key(), b"x", &[0u8; 10]));
        assert!(!verify(SignatureAlgorithm::Es256, &key.public_key(), b"x", &[0u8; 64]));
    }
}
