//! Relying-party token handling for private_key_jwt + encrypted ID tokens.
//!
//! - [`keystore`]: the signing and decryption keys, bound to their algorithms
//! - [`assertion`]: ES512 client assertions for the token endpoint
//! - [`jwe`] / [`id_token`]: recovering the signed ID token from a JWE
//! - [`pkce`]: code verifier, challenge, state and nonce
//!
//! Nothing here performs I/O.

pub mod assertion;
pub mod error;
pub mod id_token;
pub mod jwe;
pub mod jwk;
pub mod jws;
pub mod keystore;
pub mod pkce;

pub use assertion::{
    sign_client_assertion, verify_client_assertion, AssertionExpectations, ClientAssertionClaims,
    CLIENT_ASSERTION_TYPE, DEFAULT_ASSERTION_LIFETIME, MAX_ASSERTION_LIFETIME,
};
pub use error::{AuthError, ErrorKind};
pub use id_token::{recover_id_token, RecoveredIdToken};
pub use jwe::{decrypt_compact_jwe, encrypt_compact_jwe, JweHeader};
pub use jwk::{Jwk, JwkSet};
pub use jws::{sign_compact, verify_compact, CompactJws};
pub use keystore::{generate_private_jwk, EncryptionKey, KeyStore, SigningKey};
pub use pkce::{
    compute_code_challenge, generate_code_verifier, generate_nonce, generate_state,
    validate_code_verifier, CODE_CHALLENGE_METHOD,
};
