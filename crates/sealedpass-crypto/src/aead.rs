//! AES-GCM content encryption with a detached tag, as JWE carries it.

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes128Gcm, Aes256Gcm, Nonce};

use crate::algorithm::ContentEncryption;
use crate::error::CryptoError;

/// AES-GCM IV length in bytes (96 bits).
pub const GCM_IV_LENGTH: usize = 12;

/// AES-GCM tag length in bytes (128 bits).
pub const GCM_TAG_LENGTH: usize = 16;

/// Generate a random 96-bit IV.
pub fn generate_iv() -> Result<[u8; GCM_IV_LENGTH], CryptoError> {
    let mut iv = [0u8; GCM_IV_LENGTH];
    getrandom::getrandom(&mut iv).map_err(|e| CryptoError::RngFailed(e.to_string()))?;
    Ok(iv)
}

/// Generate a random content-encryption key for `enc`.
pub fn generate_cek(enc: ContentEncryption) -> Result<zeroize::Zeroizing<Vec<u8>>, CryptoError> {
    let mut cek = zeroize::Zeroizing::new(vec![0u8; enc.key_len()]);
    getrandom::getrandom(&mut cek).map_err(|e| CryptoError::RngFailed(e.to_string()))?;
    Ok(cek)
}

/// Encrypt `plaintext`, returning `(ciphertext, tag)`.
pub fn gcm_encrypt(
    enc: ContentEncryption,
    cek: &[u8],
    iv: &[u8],
    plaintext: &[u8],
    aad: &[u8],
) -> Result<(Vec<u8>, Vec<u8>), CryptoError> {
    check_lengths(enc, cek, iv)?;
    let nonce = Nonce::from_slice(iv);
    let payload = Payload {
        msg: plaintext,
        aad,
    };

    let mut sealed = match enc {
        ContentEncryption::A128Gcm => Aes128Gcm::new_from_slice(cek)
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?
            .encrypt(nonce, payload),
        ContentEncryption::A256Gcm => Aes256Gcm::new_from_slice(cek)
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?
            .encrypt(nonce, payload),
    }
    .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    // aes-gcm appends the tag to the ciphertext
    let tag = sealed.split_off(sealed.len() - GCM_TAG_LENGTH);
    Ok((sealed, tag))
}

/// Authenticated decryption. The tag is verified before any plaintext is
/// returned; on failure nothing is returned.
pub fn gcm_decrypt(
    enc: ContentEncryption,
    cek: &[u8],
    iv: &[u8],
    ciphertext: &[u8],
    tag: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    check_lengths(enc, cek, iv)?;
    if tag.len() != GCM_TAG_LENGTH {
        return Err(CryptoError::DecryptionFailed(format!(
            "tag must be {} bytes, got {}",
            GCM_TAG_LENGTH,
            tag.len()
        )));
    }

    let mut ct_with_tag = Vec::with_capacity(ciphertext.len() + tag.len());
    ct_with_tag.extend_from_slice(ciphertext);
    ct_with_tag.extend_from_slice(tag);

    let nonce = Nonce::from_slice(iv);
    let payload = Payload {
        msg: &ct_with_tag,
        aad,
    };

    match enc {
        ContentEncryption::A128Gcm => Aes128Gcm::new_from_slice(cek)
            .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))?
            .decrypt(nonce, payload),
        ContentEncryption::A256Gcm => Aes256Gcm::new_from_slice(cek)
            .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))?
            .decrypt(nonce, payload),
    }
    .map_err(|_| CryptoError::DecryptionFailed("authentication tag mismatch".to_string()))
}

fn check_lengths(enc: ContentEncryption, cek: &[u8], iv: &[u8]) -> Result<(), CryptoError> {
    if cek.len() != enc.key_len() {
        return Err(CryptoError::InvalidKeyLength {
            expected: enc.key_len(),
            got: cek.len(),
        });
    }
    if iv.len() != GCM_IV_LENGTH {
        return Err(CryptoError::InvalidKeyLength {
            expected: GCM_IV_LENGTH,
            got: iv.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_both_sizes() {
        for enc in [ContentEncryption::A128Gcm, ContentEncryption::A256Gcm] {
            let cek = generate_cek(enc).unwrap();
            let iv = generate_iv().unwrap();
            let (ct, tag) = gcm_encrypt(enc, &cek, &iv, b"id token", b"aad").unwrap();
            assert_eq!(tag.len(), GCM_TAG_LENGTH);
            assert_eq!(ct.len(), 8);
            let pt = gcm_decrypt(enc, &cek, &iv, &ct, &tag, b"aad").unwrap();
            assert_eq!(pt, b"id token");
        }
    }

    #[test]
    fn corrupted_tag_fails() {
        let enc = ContentEncryption::A256Gcm;
        let cek = generate_cek(enc).unwrap();
        let iv = generate_iv().unwrap();
        let (ct, mut tag) = gcm_encrypt(enc, &cek, &iv, b"secret", b"h").unwrap();
        tag[0] ^= 0x01;
        assert!(matches!(
            gcm_decrypt(enc, &cek, &iv, &ct, &tag, b"h"),
            Err(CryptoError::DecryptionFailed(_))
        ));
    }

    #[test]
    fn aad_is_authenticated() {
        let enc = ContentEncryption::A256Gcm;
        let cek = generate_cek(enc).unwrap();
        let iv = generate_iv().unwrap();
        let (ct, tag) = gcm_encrypt(enc, &cek, &iv, b"secret", b"header-a").unwrap();
        assert!(gcm_decrypt(enc, &cek, &iv, &ct, &tag, b"header-b").is_err());
    }

    #[test]
    fn rejects_wrong_iv_and_key_lengths() {
        let enc = ContentEncryption::A256Gcm;
        assert!(gcm_decrypt(enc, &[0u8; 32], &[0u8; 8], b"", &[0u8; 16], b"").is_err());
        assert!(gcm_decrypt(enc, &[0u8; 16], &[0u8; 12], b"", &[0u8; 16], b"").is_err());
        assert!(gcm_decrypt(enc, &[0u8; 32], &[0u8; 12], b"", &[0u8; 15], b"").is_err());
    }
}
