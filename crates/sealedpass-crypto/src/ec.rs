//! P-256 and P-521 keys addressed by their JWK coordinates.
//!
//! Coordinates and scalars travel as base64url strings of fixed width
//! (32 bytes for P-256, 66 bytes for P-521). Shorter values are left-padded,
//! since some JWK producers drop leading zero bytes.

use std::fmt;

use p256::elliptic_curve::sec1::ToEncodedPoint;
use zeroize::{Zeroize, Zeroizing};

use crate::algorithm::EcCurve;
use crate::base64url::{base64url_decode, base64url_encode};
use crate::error::CryptoError;

/// A private EC scalar on one of the supported curves.
#[derive(Clone)]
pub enum EcSecretKey {
    P256(p256::SecretKey),
    P521(p521::SecretKey),
}

/// A public EC point on one of the supported curves.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EcPublicKey {
    P256(p256::PublicKey),
    P521(p521::PublicKey),
}

impl EcSecretKey {
    /// Generate a fresh random key on `curve`.
    pub fn generate(curve: EcCurve) -> Self {
        match curve {
            EcCurve::P256 => {
                Self::P256(p256::SecretKey::random(&mut p256::elliptic_curve::rand_core::OsRng))
            }
            EcCurve::P521 => {
                Self::P521(p521::SecretKey::random(&mut p521::elliptic_curve::rand_core::OsRng))
            }
        }
    }

    /// Import a private scalar from a JWK `d` member.
    pub fn from_jwk_d(curve: EcCurve, d_b64: &str) -> Result<Self, CryptoError> {
        let mut d_bytes = base64url_decode(d_b64)?;
        let padded = left_pad(&d_bytes, curve.coordinate_len());
        d_bytes.zeroize();
        let padded = Zeroizing::new(padded.map_err(CryptoError::InvalidScalar)?);

        match curve {
            EcCurve::P256 => p256::SecretKey::from_slice(&padded)
                .map(Self::P256)
                .map_err(|e| CryptoError::InvalidScalar(format!("P-256 scalar: {}", e))),
            EcCurve::P521 => p521::SecretKey::from_slice(&padded)
                .map(Self::P521)
                .map_err(|e| CryptoError::InvalidScalar(format!("P-521 scalar: {}", e))),
        }
    }

    pub fn curve(&self) -> EcCurve {
        match self {
            Self::P256(_) => EcCurve::P256,
            Self::P521(_) => EcCurve::P521,
        }
    }

    pub fn public_key(&self) -> EcPublicKey {
        match self {
            Self::P256(sk) => EcPublicKey::P256(sk.public_key()),
            Self::P521(sk) => EcPublicKey::P521(sk.public_key()),
        }
    }

    /// The private scalar as a fixed-width base64url JWK `d` member.
    pub fn to_jwk_d(&self) -> Zeroizing<String> {
        let mut scalar = match self {
            Self::P256(sk) => sk.to_bytes().to_vec(),
            Self::P521(sk) => sk.to_bytes().to_vec(),
        };
        let d = Zeroizing::new(base64url_encode(&scalar));
        scalar.zeroize();
        d
    }

    /// Raw ECDH shared secret `Z` with `peer`.
    pub fn diffie_hellman(&self, peer: &EcPublicKey) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
        match (self, peer) {
            (Self::P256(sk), EcPublicKey::P256(pk)) => {
                let shared = p256::ecdh::diffie_hellman(sk.to_nonzero_scalar(), pk.as_affine());
                Ok(Zeroizing::new(shared.raw_secret_bytes().to_vec()))
            }
            (Self::P521(sk), EcPublicKey::P521(pk)) => {
                let shared = p521::ecdh::diffie_hellman(sk.to_nonzero_scalar(), pk.as_affine());
                Ok(Zeroizing::new(shared.raw_secret_bytes().to_vec()))
            }
            _ => Err(CryptoError::CurveMismatch {
                expected: self.curve().jwk_name(),
                got: peer.curve().jwk_name(),
            }),
        }
    }
}

impl fmt::Debug for EcSecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EcSecretKey")
            .field("curve", &self.curve())
            .finish_non_exhaustive()
    }
}

impl EcPublicKey {
    /// Import a public point from JWK `x`/`y` members.
    pub fn from_jwk_coordinates(curve: EcCurve, x_b64: &str, y_b64: &str) -> Result<Self, CryptoError> {
        let x_bytes = base64url_decode(x_b64)?;
        let y_bytes = base64url_decode(y_b64)?;
        let len = curve.coordinate_len();

        // Build uncompressed SEC1 point: 0x04 || x || y
        let mut uncompressed = Vec::with_capacity(1 + 2 * len);
        uncompressed.push(0x04);
        uncompressed.extend(left_pad(&x_bytes, len).map_err(CryptoError::InvalidCoordinates)?);
        uncompressed.extend(left_pad(&y_bytes, len).map_err(CryptoError::InvalidCoordinates)?);

        match curve {
            EcCurve::P256 => p256::PublicKey::from_sec1_bytes(&uncompressed)
                .map(Self::P256)
                .map_err(|_| CryptoError::InvalidCoordinates("point not on P-256".to_string())),
            EcCurve::P521 => p521::PublicKey::from_sec1_bytes(&uncompressed)
                .map(Self::P521)
                .map_err(|_| CryptoError::InvalidCoordinates("point not on P-521".to_string())),
        }
    }

    pub fn curve(&self) -> EcCurve {
        match self {
            Self::P256(_) => EcCurve::P256,
            Self::P521(_) => EcCurve::P521,
        }
    }

    /// Fixed-width base64url `(x, y)` coordinates for a JWK.
    pub fn to_jwk_coordinates(&self) -> Result<(String, String), CryptoError> {
        let point = match self {
            Self::P256(pk) => pk.to_encoded_point(false).as_bytes().to_vec(),
            Self::P521(pk) => pk.to_encoded_point(false).as_bytes().to_vec(),
        };
        let len = self.curve().coordinate_len();
        if point.len() != 1 + 2 * len {
            return Err(CryptoError::InvalidCoordinates(
                "point is not uncompressed".to_string(),
            ));
        }
        Ok((
            base64url_encode(&point[1..1 + len]),
            base64url_encode(&point[1 + len..]),
        ))
    }
}

fn left_pad(bytes: &[u8], len: usize) -> Result<Vec<u8>, String> {
    if bytes.len() > len {
        return Err(format!("expected at most {} bytes, got {}", len, bytes.len()));
    }
    let mut out = vec![0u8; len - bytes.len()];
    out.extend_from_slice(bytes);
    Ok(out)
}
