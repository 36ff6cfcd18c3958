//! JOSE algorithm identifiers and their curve/key-size bindings.
//!
//! Only the algorithms a private_key_jwt relying party with encrypted ID
//! tokens needs are modelled:
//! - Signing: ES256 (P-256/SHA-256), ES512 (P-521/SHA-512)
//! - Key management: ECDH-ES+A128KW, ECDH-ES+A256KW
//! - Content encryption: A128GCM, A256GCM

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CryptoError;

/// Elliptic curves usable for signing and key agreement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EcCurve {
    #[serde(rename = "P-256")]
    P256,
    #[serde(rename = "P-521")]
    P521,
}

impl EcCurve {
    /// JWK `crv` name.
    #[must_use]
    pub const fn jwk_name(self) -> &'static str {
        match self {
            Self::P256 => "P-256",
            Self::P521 => "P-521",
        }
    }

    /// Length of one affine coordinate (and of the private scalar) in bytes.
    #[must_use]
    pub const fn coordinate_len(self) -> usize {
        match self {
            Self::P256 => 32,
            Self::P521 => 66,
        }
    }
}

impl FromStr for EcCurve {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "P-256" => Ok(Self::P256),
            "P-521" => Ok(Self::P521),
            other => Err(CryptoError::UnsupportedCurve(other.to_string())),
        }
    }
}

impl fmt::Display for EcCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.jwk_name())
    }
}

/// JWS signature algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignatureAlgorithm {
    /// ECDSA using P-256 and SHA-256.
    #[serde(rename = "ES256")]
    Es256,

    /// ECDSA using P-521 and SHA-512.
    #[serde(rename = "ES512")]
    Es512,
}

impl SignatureAlgorithm {
    /// Returns the JWA algorithm name.
    #[must_use]
    pub const fn jwa_name(self) -> &'static str {
        match self {
            Self::Es256 => "ES256",
            Self::Es512 => "ES512",
        }
    }

    /// The only curve a key for this algorithm may live on.
    #[must_use]
    pub const fn curve(self) -> EcCurve {
        match self {
            Self::Es256 => EcCurve::P256,
            Self::Es512 => EcCurve::P521,
        }
    }

    /// Raw `r || s` signature length.
    #[must_use]
    pub const fn signature_len(self) -> usize {
        self.curve().coordinate_len() * 2
    }
}

impl FromStr for SignatureAlgorithm {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ES256" => Ok(Self::Es256),
            "ES512" => Ok(Self::Es512),
            other => Err(CryptoError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.jwa_name())
    }
}

/// JWE key management algorithms (ECDH-ES with AES key wrap).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyManagementAlgorithm {
    #[serde(rename = "ECDH-ES+A128KW")]
    EcdhEsA128Kw,

    #[serde(rename = "ECDH-ES+A256KW")]
    EcdhEsA256Kw,
}

impl KeyManagementAlgorithm {
    /// Returns the JWA algorithm name, which is also the Concat KDF AlgorithmID.
    #[must_use]
    pub const fn jwa_name(self) -> &'static str {
        match self {
            Self::EcdhEsA128Kw => "ECDH-ES+A128KW",
            Self::EcdhEsA256Kw => "ECDH-ES+A256KW",
        }
    }

    /// Key-encryption-key length in bytes.
    #[must_use]
    pub const fn kek_len(self) -> usize {
        match self {
            Self::EcdhEsA128Kw => 16,
            Self::EcdhEsA256Kw => 32,
        }
    }
}

impl FromStr for KeyManagementAlgorithm {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ECDH-ES+A128KW" => Ok(Self::EcdhEsA128Kw),
            "ECDH-ES+A256KW" => Ok(Self::EcdhEsA256Kw),
            other => Err(CryptoError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

impl fmt::Display for KeyManagementAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.jwa_name())
    }
}

/// JWE content encryption algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentEncryption {
    #[serde(rename = "A128GCM")]
    A128Gcm,

    #[serde(rename = "A256GCM")]
    A256Gcm,
}

impl ContentEncryption {
    #[must_use]
    pub const fn jwa_name(self) -> &'static str {
        match self {
            Self::A128Gcm => "A128GCM",
            Self::A256Gcm => "A256GCM",
        }
    }

    /// Content-encryption-key length in bytes.
    #[must_use]
    pub const fn key_len(self) -> usize {
        match self {
            Self::A128Gcm => 16,
            Self::A256Gcm => 32,
        }
    }
}

impl FromStr for ContentEncryption {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A128GCM" => Ok(Self::A128Gcm),
            "A256GCM" => Ok(Self::A256Gcm),
            other => Err(CryptoError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

impl fmt::Display for ContentEncryption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.jwa_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_algorithms_bind_curves() {
        assert_eq!(SignatureAlgorithm::Es512.curve(), EcCurve::P521);
        assert_eq!(SignatureAlgorithm::Es256.curve(), EcCurve::P256);
        assert_eq!(SignatureAlgorithm::Es512.signature_len(), 132);
        assert_eq!(SignatureAlgorithm::Es256.signature_len(), 64);
    }

    #[test]
    fn parses_jwa_names() {
        assert_eq!(
            "ECDH-ES+A256KW".parse::<KeyManagementAlgorithm>().unwrap(),
            KeyManagementAlgorithm::EcdhEsA256Kw
        );
        assert_eq!("A256GCM".parse::<ContentEncryption>().unwrap(), ContentEncryption::A256Gcm);
        assert_eq!("P-521".parse::<EcCurve>().unwrap(), EcCurve::P521);
    }

    #[test]
    fn rejects_unknown_names() {
        assert!("RS256".parse::<SignatureAlgorithm>().is_err());
        assert!("ECDH-ES".parse::<KeyManagementAlgorithm>().is_err());
        assert!("A256CBC-HS512".parse::<ContentEncryption>().is_err());
        assert!("secp256k1".parse::<EcCurve>().is_err());
    }

    #[test]
    fn serde_uses_jwa_names() {
        let json = serde_json::to_string(&SignatureAlgorithm::Es512).unwrap();
        assert_eq!(json, "\"ES512\"");
        let alg: KeyManagementAlgorithm = serde_json::from_str("\"ECDH-ES+A128KW\"").unwrap();
        assert_eq!(alg, KeyManagementAlgorithm::EcdhEsA128Kw);
    }
}
