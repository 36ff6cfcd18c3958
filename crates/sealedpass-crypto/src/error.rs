use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Unsupported curve: {0}")]
    UnsupportedCurve(String),

    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Curve mismatch: expected {expected}, got {got}")]
    CurveMismatch {
        expected: &'static str,
        got: &'static str,
    },

    #[error("Invalid key length: expected {expected} bytes, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },

    #[error("Invalid EC coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Invalid private key scalar: {0}")]
    InvalidScalar(String),

    #[error("Public key does not match private key")]
    PublicKeyMismatch,

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Key agreement failed: {0}")]
    KeyAgreementFailed(String),

    #[error("AES-KW wrap failed: {0}")]
    WrapFailed(String),

    #[error("AES-KW unwrap failed: {0}")]
    UnwrapFailed(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Base64url decode error: {0}")]
    Base64Decode(String),

    #[error("Random number generation failed: {0}")]
    RngFailed(String),
}
