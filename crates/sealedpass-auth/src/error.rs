use std::fmt;

use sealedpass_crypto::CryptoError;
use thiserror::Error;

/// Coarse classification of a failure, shared by every layer of the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad or mismatched configuration or key material. Fatal at startup.
    Configuration,
    /// Signing, key agreement, unwrap or authenticated decryption failed.
    Crypto,
    /// Malformed response or token, or an unsupported header algorithm.
    Protocol,
    /// Connection failure or non-2xx HTTP status.
    Network,
    /// The token endpoint did not answer in time.
    Timeout,
    /// The caller cancelled the flow.
    Cancelled,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Configuration => "configuration",
            Self::Crypto => "crypto",
            Self::Protocol => "protocol",
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid JWK: {0}")]
    InvalidJwk(String),

    #[error("Key configuration error: {0}")]
    KeyConfiguration(String),

    #[error("Invalid client assertion claims: {0}")]
    InvalidClaims(String),

    #[error("Malformed token: expected 3 (JWS) or 5 (JWE) segments, got {0}")]
    SegmentCount(usize),

    #[error("JWS format error: {0}")]
    JwsFormat(String),

    #[error("JWE format error: {0}")]
    JweFormat(String),

    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("JWE addressed to key {got}, expected {expected}")]
    KeyIdMismatch { expected: String, got: String },

    #[error("JWE decryption failed: {0}")]
    JweDecryptionFailed(String),

    #[error("JWE encryption failed: {0}")]
    JweEncryptionFailed(String),

    #[error("Client assertion rejected: {0}")]
    AssertionRejected(String),

    #[error("Invalid PKCE code verifier: {0}")]
    InvalidCodeVerifier(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Random number generation failed: {0}")]
    RngFailed(String),
}

impl AuthError {
    /// Where this error sits in the failure taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidJwk(_) | Self::KeyConfiguration(_) | Self::InvalidClaims(_) => {
                ErrorKind::Configuration
            }
            Self::SegmentCount(_)
            | Self::JwsFormat(_)
            | Self::JweFormat(_)
            | Self::UnsupportedAlgorithm(_)
            | Self::KeyIdMismatch { .. }
            | Self::InvalidCodeVerifier(_)
            | Self::Json(_) => ErrorKind::Protocol,
            Self::JweDecryptionFailed(_)
            | Self::JweEncryptionFailed(_)
            | Self::AssertionRejected(_)
            | Self::Crypto(_)
            | Self::RngFailed(_) => ErrorKind::Crypto,
        }
    }
}
