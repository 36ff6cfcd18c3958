//! JOSE cryptographic primitives for the sealedpass relying party.
//!
//! This crate is free of I/O. It provides:
//! - P-256 / P-521 key import and export on JWK coordinates
//! - ES256 / ES512 signing and verification
//! - ECDH shared secrets and the RFC 7518 Concat KDF
//! - AES Key Wrap and AES-GCM with detached tags

pub mod aead;
pub mod algorithm;
pub mod base64url;
pub mod ec;
pub mod error;
pub mod kdf;
pub mod keywrap;
pub mod signing;

pub use aead::{gcm_decrypt, gcm_encrypt, generate_cek, generate_iv, GCM_IV_LENGTH, GCM_TAG_LENGTH};
pub use algorithm::{ContentEncryption, EcCurve, KeyManagementAlgorithm, SignatureAlgorithm};
pub use base64url::{base64url_decode, base64url_decode_utf8, base64url_encode};
pub use ec::{EcPublicKey, EcSecretKey};
pub use error::CryptoError;
pub use kdf::concat_kdf;
pub use keywrap::{aes_kw_unwrap, aes_kw_wrap};
pub use signing::{sign, verify};
