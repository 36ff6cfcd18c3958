//! Recovering the signed ID token from a token response.

use crate::error::AuthError;
use crate::jwe::decrypt_compact_jwe;
use crate::jws::CompactJws;
use crate::keystore::EncryptionKey;

/// The signed ID token, and whether it arrived encrypted.
#[derive(Debug, Clone)]
pub struct RecoveredIdToken {
    pub token: CompactJws,
    pub decrypted: bool,
}

/// Turn a raw `id_token` into its compact JWS form.
///
/// Three non-empty segments is already a JWS and passes through unchanged. Five
/// segments is a JWE; its plaintext must itself be a compact JWS. Anything
/// else is malformed. The JWS signature is not checked here.
pub fn recover_id_token(raw: &str, key: &EncryptionKey) -> Result<RecoveredIdToken, AuthError> {
    match raw.split('.').count() {
        3 => Ok(RecoveredIdToken {
            token: CompactJws::parse(raw)?,
            decrypted: false,
        }),
        5 => {
            let plaintext = decrypt_compact_jwe(raw, key)?;
            let inner = String::from_utf8(plaintext).map_err(|_| {
                AuthError::JwsFormat("decrypted ID token is not UTF-8".to_string())
            })?;
            let segments = inner.split('.').count();
            if segments != 3 {
                return Err(AuthError::JwsFormat(format!(
                    "decrypted ID token has {} segments, expected a signed JWT",
                    segments
                )));
            }
            Ok(RecoveredIdToken {
                token: CompactJws::parse(inner)?,
                decrypted: true,
            })
        }
        n => Err(AuthError::SegmentCount(n)),
    }
}
