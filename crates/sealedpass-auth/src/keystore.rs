//! The relying party's private keys.
//!
//! A `KeyStore` pairs one signing key (client assertions) with one
//! decryption key (encrypted ID tokens). Each key is bound to exactly one
//! algorithm, and the binding is validated at load time against the key's
//! curve and its public coordinates. The store is immutable; rotation means
//! loading a new store.

use sealedpass_crypto::{
    EcCurve, EcPublicKey, EcSecretKey, KeyManagementAlgorithm, SignatureAlgorithm,
};

use crate::error::AuthError;
use crate::jwk::{Jwk, JwkSet};

/// Private key used only to sign client assertions.
#[derive(Debug, Clone)]
pub struct SigningKey {
    kid: String,
    alg: SignatureAlgorithm,
    secret: EcSecretKey,
}

/// Private key used only to decrypt JWEs addressed to the relying party.
#[derive(Debug, Clone)]
pub struct EncryptionKey {
    kid: String,
    alg: KeyManagementAlgorithm,
    secret: EcSecretKey,
}

/// Immutable pair of the relying party's signing and decryption keys.
#[derive(Debug, Clone)]
pub struct KeyStore {
    signing: SigningKey,
    encryption: EncryptionKey,
}

impl SigningKey {
    /// Import a private signing key from a JWK.
    ///
    /// The JWK must declare `alg` (ES256 or ES512) on the matching curve and,
    /// if `use` is present, `use: "sig"`.
    pub fn from_jwk(jwk: &Jwk) -> Result<Self, AuthError> {
        let imported = import_private(jwk, "sig")?;
        let alg: SignatureAlgorithm = imported
            .alg
            .parse()
            .map_err(|_| AuthError::KeyConfiguration(format!(
                "signing key {} declares unsupported alg {}",
                imported.kid, imported.alg
            )))?;

        if alg.curve() != imported.secret.curve() {
            return Err(AuthError::KeyConfiguration(format!(
                "signing key {} declares {} which requires {}, but the key is on {}",
                imported.kid,
                alg,
                alg.curve(),
                imported.secret.curve()
            )));
        }

        Ok(Self {
            kid: imported.kid,
            alg,
            secret: imported.secret,
        })
    }

    pub fn kid(&self) -> &str {
        &self.kid
    }

    pub fn alg(&self) -> SignatureAlgorithm {
        self.alg
    }

    pub fn curve(&self) -> EcCurve {
        self.secret.curve()
    }

    pub fn public_key(&self) -> EcPublicKey {
        self.secret.public_key()
    }

    /// Public JWK for publication in the relying party's key set.
    pub fn public_jwk(&self) -> Result<Jwk, AuthError> {
        public_jwk(&self.secret, &self.kid, "sig", self.alg.jwa_name())
    }

    /// Sign `message` with the declared algorithm.
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>, AuthError> {
        Ok(sealedpass_crypto::sign(self.alg, &self.secret, message)?)
    }
}

impl EncryptionKey {
    /// Import a private decryption key from a JWK.
    ///
    /// The JWK must declare `alg` (ECDH-ES+A128KW or ECDH-ES+A256KW) and, if
    /// `use` is present, `use: "enc"`.
    pub fn from_jwk(jwk: &Jwk) -> Result<Self, AuthError> {
        let imported = import_private(jwk, "enc")?;
        let alg: KeyManagementAlgorithm = imported
            .alg
            .parse()
            .map_err(|_| AuthError::KeyConfiguration(format!(
                "encryption key {} declares unsupported alg {}",
                imported.kid, imported.alg
            )))?;

        Ok(Self {
            kid: imported.kid,
            alg,
            secret: imported.secret,
        })
    }

    pub fn kid(&self) -> &str {
        &self.kid
    }

    pub fn alg(&self) -> KeyManagementAlgorithm {
        self.alg
    }

    pub fn curve(&self) -> EcCurve {
        self.secret.curve()
    }

    pub fn public_key(&self) -> EcPublicKey {
        self.secret.public_key()
    }

    pub fn public_jwk(&self) -> Result<Jwk, AuthError> {
        public_jwk(&self.secret, &self.kid, "enc", self.alg.jwa_name())
    }

    pub(crate) fn secret(&self) -> &EcSecretKey {
        &self.secret
    }
}

impl KeyStore {
    /// Validate and pair a signing JWK and an encryption JWK.
    pub fn load(signing_jwk: &Jwk, encryption_jwk: &Jwk) -> Result<Self, AuthError> {
        let signing = SigningKey::from_jwk(signing_jwk)?;
        let encryption = EncryptionKey::from_jwk(encryption_jwk)?;
        Ok(Self::from_keys(signing, encryption))
    }

    /// Parse both keys from JWK JSON text, then `load`.
    pub fn load_json(signing_json: &str, encryption_json: &str) -> Result<Self, AuthError> {
        Self::load(&Jwk::from_json(signing_json)?, &Jwk::from_json(encryption_json)?)
    }

    pub fn from_keys(signing: SigningKey, encryption: EncryptionKey) -> Self {
        Self {
            signing,
            encryption,
        }
    }

    pub fn signing_key(&self) -> &SigningKey {
        &self.signing
    }

    pub fn encryption_key(&self) -> &EncryptionKey {
        &self.encryption
    }

    /// Public halves of both keys as a JWK Set, for the provider to fetch.
    pub fn public_jwks(&self) -> Result<JwkSet, AuthError> {
        Ok(JwkSet {
            keys: vec![self.signing.public_jwk()?, self.encryption.public_jwk()?],
        })
    }
}

struct ImportedKey {
    kid: String,
    alg: String,
    secret: EcSecretKey,
}

fn import_private(jwk: &Jwk, expected_use: &str) -> Result<ImportedKey, AuthError> {
    if jwk.kty != "EC" {
        return Err(AuthError::InvalidJwk(format!(
            "expected kty EC, got {}",
            jwk.kty
        )));
    }
    let kid = Jwk::require(&jwk.kid, "kid")?.to_string();
    let alg = Jwk::require(&jwk.alg, "alg")?.to_string();

    if let Some(key_use) = jwk.key_use.as_deref() {
        if key_use != expected_use {
            return Err(AuthError::KeyConfiguration(format!(
                "key {} has use {}, expected {}",
                kid, key_use, expected_use
            )));
        }
    }

    let curve: EcCurve = Jwk::require(&jwk.crv, "crv")?
        .parse()
        .map_err(|e: sealedpass_crypto::CryptoError| AuthError::InvalidJwk(e.to_string()))?;
    let d = Jwk::require(&jwk.d, "d (private key)")?;
    let secret = EcSecretKey::from_jwk_d(curve, d)
        .map_err(|e| AuthError::InvalidJwk(format!("key {}: {}", kid, e)))?;

    let declared = EcPublicKey::from_jwk_coordinates(
        curve,
        Jwk::require(&jwk.x, "x")?,
        Jwk::require(&jwk.y, "y")?,
    )
    .map_err(|e| AuthError::InvalidJwk(format!("key {}: {}", kid, e)))?;

    if declared != secret.public_key() {
        return Err(AuthError::KeyConfiguration(format!(
            "key {}: public coordinates do not match the private scalar",
            kid
        )));
    }

    Ok(ImportedKey { kid, alg, secret })
}

fn public_jwk(secret: &EcSecretKey, kid: &str, key_use: &str, alg: &str) -> Result<Jwk, AuthError> {
    let (x, y) = secret.public_key().to_jwk_coordinates()?;
    Ok(Jwk {
        kty: "EC".to_string(),
        crv: Some(secret.curve().jwk_name().to_string()),
        x: Some(x),
        y: Some(y),
        d: None,
        kid: Some(kid.to_string()),
        key_use: Some(key_use.to_string()),
        alg: Some(alg.to_string()),
    })
}

/// Build a private JWK for a freshly generated key.
///
/// Used to provision keys and by tests; the result contains the private
/// scalar and must be stored as a secret.
pub fn generate_private_jwk(curve: EcCurve, kid: &str, key_use: &str, alg: &str) -> Result<Jwk, AuthError> {
    let secret = EcSecretKey::generate(curve);
    let mut jwk = public_jwk(&secret, kid, key_use, alg)?;
    jwk.d = Some(secret.to_jwk_d().to_string());
    Ok(jwk)
}
