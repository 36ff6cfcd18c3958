use base64ct::{Base64UrlUnpadded, Encoding};

use crate::error::CryptoError;

/// Base64url encode bytes without padding.
pub fn base64url_encode(data: &[u8]) -> String {
    Base64UrlUnpadded::encode_string(data)
}

/// Base64url decode a string to bytes.
///
/// JOSE segments never carry padding, so padded input is rejected.
pub fn base64url_decode(s: &str) -> Result<Vec<u8>, CryptoError> {
    Base64UrlUnpadded::decode_vec(s).map_err(|e| CryptoError::Base64Decode(e.to_string()))
}

/// Decode a base64url segment that must contain UTF-8 text.
pub fn base64url_decode_utf8(s: &str) -> Result<String, CryptoError> {
    let bytes = base64url_decode(s)?;
    String::from_utf8(bytes).map_err(|e| CryptoError::Base64Decode(e.to_string()))
}
