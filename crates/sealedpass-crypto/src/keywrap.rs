//! AES Key Wrap (RFC 3394) for 128- and 256-bit key-encryption keys.

use aes_kw::{KekAes128, KekAes256};
use zeroize::Zeroizing;

use crate::error::CryptoError;

/// AES-KW adds one 8-byte integrity block to the wrapped key.
pub const AES_KW_OVERHEAD: usize = 8;

/// Wrap `key` under `kek` (16 or 32 bytes).
pub fn aes_kw_wrap(kek: &[u8], key: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if key.len() < 16 || key.len() % 8 != 0 {
        return Err(CryptoError::WrapFailed(format!(
            "key length {} is not a multiple of 8 of at least 16",
            key.len()
        )));
    }
    let mut wrapped = vec![0u8; key.len() + AES_KW_OVERHEAD];
    match kek.len() {
        16 => KekAes128::from(to_array::<16>(kek)?)
            .wrap(key, &mut wrapped)
            .map_err(|e| CryptoError::WrapFailed(format!("{:?}", e)))?,
        32 => KekAes256::from(to_array::<32>(kek)?)
            .wrap(key, &mut wrapped)
            .map_err(|e| CryptoError::WrapFailed(format!("{:?}", e)))?,
        got => return Err(CryptoError::InvalidKeyLength { expected: 32, got }),
    }
    Ok(wrapped)
}

/// Unwrap `wrapped` under `kek`, verifying the RFC 3394 integrity check.
pub fn aes_kw_unwrap(kek: &[u8], wrapped: &[u8]) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    if wrapped.len() < 16 + AES_KW_OVERHEAD || wrapped.len() % 8 != 0 {
        return Err(CryptoError::UnwrapFailed(format!(
            "wrapped key length {} is invalid",
            wrapped.len()
        )));
    }
    let mut key = Zeroizing::new(vec![0u8; wrapped.len() - AES_KW_OVERHEAD]);
    match kek.len() {
        16 => KekAes128::from(to_array::<16>(kek)?)
            .unwrap(wrapped, &mut key)
            .map_err(|e| CryptoError::UnwrapFailed(format!("{:?}", e)))?,
        32 => KekAes256::from(to_array::<32>(kek)?)
            .unwrap(wrapped, &mut key)
            .map_err(|e| CryptoError::UnwrapFailed(format!("{:?}", e)))?,
        got => return Err(CryptoError::InvalidKeyLength { expected: 32, got }),
    }
    Ok(key)
}

fn to_array<const N: usize>(bytes: &[u8]) -> Result<[u8; N], CryptoError> {
    bytes.try_into().map_err(|_| CryptoError::InvalidKeyLength {
        expected: N,
        got: bytes.len(),
    })
}
