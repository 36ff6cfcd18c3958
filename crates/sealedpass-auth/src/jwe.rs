//! Compact JWE with ECDH-ES key wrapping (RFC 7516, RFC 7518 §4.6).
//!
//! Supported combinations:
//! - `alg`: ECDH-ES+A128KW, ECDH-ES+A256KW on P-256 or P-521
//! - `enc`: A128GCM, A256GCM
//!
//! The sender's ephemeral key (`epk`) and the recipient key agree on `Z`,
//! the Concat KDF turns `Z` into a KEK, and AES-KW unwraps the CEK. The
//! protected header segment, as ASCII, is the AES-GCM additional data.

use sealedpass_crypto::{
    aes_kw_unwrap, aes_kw_wrap, base64url_decode, base64url_encode, concat_kdf, gcm_decrypt,
    gcm_encrypt, generate_cek, generate_iv, ContentEncryption, EcCurve, EcPublicKey, EcSecretKey,
    KeyManagementAlgorithm,
};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::AuthError;
use crate::jwk::Jwk;
use crate::keystore::EncryptionKey;

/// Protected header of a compact JWE.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JweHeader {
    pub alg: String,
    pub enc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub epk: Option<Jwk>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apu: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apv: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
}

/// Decrypt a compact JWE addressed to `key`.
///
/// The header `alg` must be the algorithm the key is bound to, and a
/// header `kid`, when present, must name the key. Nothing is returned
/// unless the GCM tag verifies.
pub fn decrypt_compact_jwe(jwe: &str, key: &EncryptionKey) -> Result<Vec<u8>, AuthError> {
    let parts: Vec<&str> = jwe.split('.').collect();
    if parts.len() != 5 {
        return Err(AuthError::JweFormat(format!(
            "expected 5 parts, got {}",
            parts.len()
        )));
    }
    let header_b64 = parts[0];

    let header: JweHeader = serde_json::from_slice(&decode_part(header_b64, "header")?)
        .map_err(|e| AuthError::JweFormat(format!("header: {}", e)))?;

    let alg: KeyManagementAlgorithm = header
        .alg
        .parse()
        .map_err(|_| AuthError::UnsupportedAlgorithm(format!("JWE alg {}", header.alg)))?;
    if alg != key.alg() {
        return Err(AuthError::UnsupportedAlgorithm(format!(
            "JWE alg {} but key {} is bound to {}",
            alg,
            key.kid(),
            key.alg()
        )));
    }
    let enc: ContentEncryption = header
        .enc
        .parse()
        .map_err(|_| AuthError::UnsupportedAlgorithm(format!("JWE enc {}", header.enc)))?;

    if let Some(kid) = header.kid.as_deref() {
        if kid != key.kid() {
            return Err(AuthError::KeyIdMismatch {
                expected: key.kid().to_string(),
                got: kid.to_string(),
            });
        }
    }

    let epk = header
        .epk
        .as_ref()
        .ok_or_else(|| AuthError::JweFormat("missing epk in header".to_string()))?;
    let sender_public = import_epk(epk, key.curve())?;

    let apu = decode_optional(header.apu.as_deref(), "apu")?;
    let apv = decode_optional(header.apv.as_deref(), "apv")?;
    let encrypted_key = decode_part(parts[1], "encrypted key")?;
    let iv = decode_part(parts[2], "iv")?;
    let ciphertext = decode_part(parts[3], "ciphertext")?;
    let tag = decode_part(parts[4], "tag")?;

    let z = key
        .secret()
        .diffie_hellman(&sender_public)
        .map_err(|e| AuthError::JweDecryptionFailed(format!("key agreement: {}", e)))?;
    let kek = concat_kdf(&z, alg.jwa_name(), &apu, &apv, alg.kek_len());

    let cek = aes_kw_unwrap(&kek, &encrypted_key)
        .map_err(|e| AuthError::JweDecryptionFailed(e.to_string()))?;
    if cek.len() != enc.key_len() {
        return Err(AuthError::JweDecryptionFailed(format!(
            "CEK is {} bytes, {} needs {}",
            cek.len(),
            enc,
            enc.key_len()
        )));
    }

    gcm_decrypt(enc, &cek, &iv, &ciphertext, &tag, header_b64.as_bytes())
        .map_err(|e| AuthError::JweDecryptionFailed(e.to_string()))
}

/// Encrypt `plaintext` to a recipient public JWK as a compact JWE.
///
/// The relying party only decrypts in production; this side exists so
/// providers can be stubbed in tests and tooling.
pub fn encrypt_compact_jwe(
    plaintext: &[u8],
    recipient: &Jwk,
    alg: KeyManagementAlgorithm,
    enc: ContentEncryption,
    cty: Option<&str>,
) -> Result<String, AuthError> {
    let curve: EcCurve = Jwk::require(&recipient.crv, "crv")?
        .parse()
        .map_err(|e: sealedpass_crypto::CryptoError| AuthError::InvalidJwk(e.to_string()))?;
    let recipient_public = EcPublicKey::from_jwk_coordinates(
        curve,
        Jwk::require(&recipient.x, "x")?,
        Jwk::require(&recipient.y, "y")?,
    )
    .map_err(|e| AuthError::InvalidJwk(e.to_string()))?;

    let ephemeral = EcSecretKey::generate(curve);
    let (epk_x, epk_y) = ephemeral.public_key().to_jwk_coordinates()?;
    let z = ephemeral
        .diffie_hellman(&recipient_public)
        .map_err(|e| AuthError::JweEncryptionFailed(format!("key agreement: {}", e)))?;
    let kek = concat_kdf(&z, alg.jwa_name(), &[], &[], alg.kek_len());

    let cek: Zeroizing<Vec<u8>> = generate_cek(enc)?;
    let wrapped = aes_kw_wrap(&kek, &cek)
        .map_err(|e| AuthError::JweEncryptionFailed(e.to_string()))?;

    let header = JweHeader {
        alg: alg.jwa_name().to_string(),
        enc: enc.jwa_name().to_string(),
        epk: Some(Jwk {
            kty: "EC".to_string(),
            crv: Some(curve.jwk_name().to_string()),
            x: Some(epk_x),
            y: Some(epk_y),
            d: None,
            kid: None,
            key_use: None,
            alg: None,
        }),
        apu: None,
        apv: None,
        kid: recipient.kid.clone(),
        cty: cty.map(str::to_string),
        typ: None,
    };
    let header_b64 = base64url_encode(&serde_json::to_vec(&header)?);

    let iv = generate_iv()?;
    let (ciphertext, tag) = gcm_encrypt(enc, &cek, &iv, plaintext, header_b64.as_bytes())
        .map_err(|e| AuthError::JweEncryptionFailed(e.to_string()))?;

    Ok(format!(
        "{}.{}.{}.{}.{}",
        header_b64,
        base64url_encode(&wrapped),
        base64url_encode(&iv),
        base64url_encode(&ciphertext),
        base64url_encode(&tag)
    ))
}

fn import_epk(epk: &Jwk, expected: EcCurve) -> Result<EcPublicKey, AuthError> {
    if epk.kty != "EC" {
        return Err(AuthError::JweFormat(format!(
            "epk kty must be EC, got {}",
            epk.kty
        )));
    }
    let crv = Jwk::require(&epk.crv, "epk crv").map_err(to_format)?;
    if crv != expected.jwk_name() {
        return Err(AuthError::JweFormat(format!(
            "epk is on {}, key is on {}",
            crv,
            expected.jwk_name()
        )));
    }
    EcPublicKey::from_jwk_coordinates(
        expected,
        Jwk::require(&epk.x, "epk x").map_err(to_format)?,
        Jwk::require(&epk.y, "epk y").map_err(to_format)?,
    )
    .map_err(|e| AuthError::JweFormat(format!("epk: {}", e)))
}

fn to_format(e: AuthError) -> AuthError {
    AuthError::JweFormat(e.to_string())
}

fn decode_part(part: &str, name: &str) -> Result<Vec<u8>, AuthError> {
    base64url_decode(part).map_err(|e| AuthError::JweFormat(format!("{}: {}", name, e)))
}

fn decode_optional(part: Option<&str>, name: &str) -> Result<Vec<u8>, AuthError> {
    part.map_or(Ok(Vec::new()), |p| decode_part(p, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::keystore::generate_private_jwk;

    fn recipient(curve: EcCurve, alg: &str) -> (Jwk, EncryptionKey) {
        let private = generate_private_jwk(curve, "enc-1", "enc", alg).unwrap();
        let key = EncryptionKey::from_jwk(&private).unwrap();
        (private.to_public(), key)
    }

    fn p521() -> (Jwk, EncryptionKey) {
        recipient(EcCurve::P521, "ECDH-ES+A256KW")
    }

    fn encrypt(public: &Jwk, plaintext: &[u8]) -> String {
        encrypt_compact_jwe(
            plaintext,
            public,
            KeyManagementAlgorithm::EcdhEsA256Kw,
            ContentEncryption::A256Gcm,
            Some("JWT"),
        )
        .unwrap()
    }

    fn replace_part(jwe: &str, index: usize, value: &str) -> String {
        let mut parts: Vec<&str> = jwe.split('.').collect();
        parts[index] = value;
        parts.join(".")
    }

    fn header_of(jwe: &str) -> JweHeader {
        let b64 = jwe.split('.').next().unwrap();
        serde_json::from_slice(&base64url_decode(b64).unwrap()).unwrap()
    }

    #[test]
    fn p521_a256gcm_round_trip() {
        let (public, key) = p521();
        let jwe = encrypt(&public, b"header.payload.signature");
        assert_eq!(jwe.split('.').count(), 5);
        assert_eq!(
            decrypt_compact_jwe(&jwe, &key).unwrap(),
            b"header.payload.signature"
        );
    }

    #[test]
    fn p256_a128_round_trip() {
        let (public, key) = recipient(EcCurve::P256, "ECDH-ES+A128KW");
        let jwe = encrypt_compact_jwe(
            b"hello",
            &public,
            KeyManagementAlgorithm::EcdhEsA128Kw,
            ContentEncryption::A128Gcm,
            None,
        )
        .unwrap();
        assert_eq!(decrypt_compact_jwe(&jwe, &key).unwrap(), b"hello");
    }

    #[test]
    fn header_carries_algorithms_and_epk() {
        let (public, _) = p521();
        let header = header_of(&encrypt(&public, b"x"));
        assert_eq!(header.alg, "ECDH-ES+A256KW");
        assert_eq!(header.enc, "A256GCM");
        assert_eq!(header.kid.as_deref(), Some("enc-1"));
        assert_eq!(header.cty.as_deref(), Some("JWT"));
        let epk = header.epk.unwrap();
        assert_eq!(epk.crv.as_deref(), Some("P-521"));
        assert!(epk.d.is_none());
    }

    #[test]
    fn empty_plaintext_round_trips() {
        let (public, key) = p521();
        let jwe = encrypt(&public, b"");
        assert!(decrypt_compact_jwe(&jwe, &key).unwrap().is_empty());
    }

    #[test]
    fn corrupted_tag_is_a_crypto_failure() {
        let (public, key) = p521();
        let jwe = encrypt(&public, b"secret");
        let mut tag = base64url_decode(jwe.split('.').nth(4).unwrap()).unwrap();
        tag[0] ^= 0x01;
        let tampered = replace_part(&jwe, 4, &base64url_encode(&tag));

        let err = decrypt_compact_jwe(&tampered, &key).unwrap_err();
        assert!(matches!(err, AuthError::JweDecryptionFailed(_)));
        assert_eq!(err.kind(), ErrorKind::Crypto);
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let (public, key) = p521();
        let jwe = encrypt(&public, b"secret");
        let mut ct = base64url_decode(jwe.split('.').nth(3).unwrap()).unwrap();
        ct[0] ^= 0xff;
        let tampered = replace_part(&jwe, 3, &base64url_encode(&ct));
        assert!(decrypt_compact_jwe(&tampered, &key).is_err());
    }

    #[test]
    fn tampered_header_breaks_aad() {
        let (public, key) = p521();
        let jwe = encrypt(&public, b"secret");
        let mut header = header_of(&jwe);
        header.typ = Some("JWT".to_string());
        let rewritten = base64url_encode(&serde_json::to_vec(&header).unwrap());
        let tampered = replace_part(&jwe, 0, &rewritten);

        let err = decrypt_compact_jwe(&tampered, &key).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Crypto);
    }

    #[test]
    fn wrong_key_fails() {
        let (public, _) = p521();
        let (_, other) = p521();
        let jwe = encrypt(&public, b"secret");
        let err = decrypt_compact_jwe(&jwe, &other).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Crypto);
    }

    #[test]
    fn rejects_wrong_part_count() {
        let (_, key) = p521();
        for bad in ["a.b.c", "a.b.c.d", "a.b.c.d.e.f", "not-a-jwe"] {
            let err = decrypt_compact_jwe(bad, &key).unwrap_err();
            assert!(matches!(err, AuthError::JweFormat(_)), "{}", bad);
        }
    }

    #[test]
    fn rejects_alg_the_key_is_not_bound_to() {
        let (public, key) = p521();
        let jwe = encrypt_compact_jwe(
            b"x",
            &public,
            KeyManagementAlgorithm::EcdhEsA128Kw,
            ContentEncryption::A256Gcm,
            None,
        )
        .unwrap();
        let err = decrypt_compact_jwe(&jwe, &key).unwrap_err();
        assert!(matches!(err, AuthError::UnsupportedAlgorithm(_)));
        assert_eq!(err.kind(), ErrorKind::Protocol);
    }

    #[test]
    fn rejects_unknown_enc() {
        let (public, key) = p521();
        let jwe = encrypt(&public, b"x");
        let mut header = header_of(&jwe);
        header.enc = "A256CBC-HS512".to_string();
        let tampered = replace_part(&jwe, 0, &base64url_encode(&serde_json::to_vec(&header).unwrap()));
        assert!(matches!(
            decrypt_compact_jwe(&tampered, &key).unwrap_err(),
            AuthError::UnsupportedAlgorithm(_)
        ));
    }

    #[test]
    fn rejects_other_kid() {
        let (mut public, key) = p521();
        public.kid = Some("enc-2".to_string());
        let jwe = encrypt(&public, b"x");
        match decrypt_compact_jwe(&jwe, &key).unwrap_err() {
            AuthError::KeyIdMismatch { expected, got } => {
                assert_eq!(expected, "enc-1");
                assert_eq!(got, "enc-2");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_epk_on_other_curve() {
        let (_, key) = p521();
        let (p256_public, _) = recipient(EcCurve::P256, "ECDH-ES+A256KW");
        let jwe = encrypt(&p256_public, b"x");
        // Re-address the P-256 message to the P-521 key
        let mut header = header_of(&jwe);
        header.kid = Some("enc-1".to_string());
        let tampered = replace_part(&jwe, 0, &base64url_encode(&serde_json::to_vec(&header).unwrap()));
        let err = decrypt_compact_jwe(&tampered, &key).unwrap_err();
        assert!(err.to_string().contains("epk"));
    }

    #[test]
    fn missing_epk_is_format_error() {
        let (public, key) = p521();
        let jwe = encrypt(&public, b"x");
        let mut header = header_of(&jwe);
        header.epk = None;
        let tampered = replace_part(&jwe, 0, &base64url_encode(&serde_json::to_vec(&header).unwrap()));
        assert!(matches!(
            decrypt_compact_jwe(&tampered, &key).unwrap_err(),
            AuthError::JweFormat(_)
        ));
    }
}
