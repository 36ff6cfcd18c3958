//! How the relying party authenticates to a provider and reads its ID tokens.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use sealedpass_auth::{
    recover_id_token, sign_client_assertion, ClientAssertionClaims, CompactJws, KeyStore,
    RecoveredIdToken, CODE_CHALLENGE_METHOD,
};
use sealedpass_discovery::ProviderRequirements;
use zeroize::Zeroizing;

use crate::error::FlowError;
use crate::exchange::ClientAuthentication;
use crate::keys::SharedKeyStore;

/// One configured identity provider integration.
#[derive(Clone)]
pub enum Provider {
    /// `client_secret_post` with plain signed ID tokens.
    StandardClientSecret { client_secret: Zeroizing<String> },
    /// `private_key_jwt` client assertions; ID tokens may arrive as JWE.
    PrivateKeyJwtWithEncryptedIdToken { keys: SharedKeyStore },
}

impl Provider {
    pub fn client_secret(secret: impl Into<String>) -> Self {
        Self::StandardClientSecret {
            client_secret: Zeroizing::new(secret.into()),
        }
    }

    pub fn private_key_jwt(keys: KeyStore) -> Self {
        Self::PrivateKeyJwtWithEncryptedIdToken {
            keys: SharedKeyStore::new(keys),
        }
    }

    /// `token_endpoint_auth_method` name.
    pub fn auth_method(&self) -> &'static str {
        match self {
            Self::StandardClientSecret { .. } => "client_secret_post",
            Self::PrivateKeyJwtWithEncryptedIdToken { .. } => "private_key_jwt",
        }
    }

    /// The rotatable key store, for `private_key_jwt` providers.
    pub fn key_store(&self) -> Option<&SharedKeyStore> {
        match self {
            Self::StandardClientSecret { .. } => None,
            Self::PrivateKeyJwtWithEncryptedIdToken { keys } => Some(keys),
        }
    }

    /// What discovery metadata must advertise for this integration to work.
    pub fn requirements(&self, issuer: &str) -> ProviderRequirements {
        let mut requirements = ProviderRequirements {
            issuer: issuer.to_string(),
            auth_method: self.auth_method().to_string(),
            signing_alg: None,
            id_token_encryption_alg: None,
            id_token_encryption_enc: Vec::new(),
            code_challenge_method: Some(CODE_CHALLENGE_METHOD.to_string()),
        };
        if let Self::PrivateKeyJwtWithEncryptedIdToken { keys } = self {
            let keys = keys.snapshot();
            requirements.signing_alg = Some(keys.signing_key().alg().jwa_name().to_string());
            requirements.id_token_encryption_alg =
                Some(keys.encryption_key().alg().jwa_name().to_string());
            requirements.id_token_encryption_enc =
                vec!["A256GCM".to_string(), "A128GCM".to_string()];
        }
        requirements
    }

    /// Fix the credentials one flow will use from start to finish.
    pub(crate) fn credentials(&self) -> FlowCredentials {
        match self {
            Self::StandardClientSecret { client_secret } => {
                FlowCredentials::Secret(client_secret.clone())
            }
            Self::PrivateKeyJwtWithEncryptedIdToken { keys } => {
                FlowCredentials::Keys(keys.snapshot())
            }
        }
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StandardClientSecret { .. } => f
                .debug_struct("StandardClientSecret")
                .field("client_secret", &"<redacted>")
                .finish(),
            Self::PrivateKeyJwtWithEncryptedIdToken { keys } => f
                .debug_struct("PrivateKeyJwtWithEncryptedIdToken")
                .field("keys", keys)
                .finish(),
        }
    }
}

/// Credentials pinned for the lifetime of one flow.
pub(crate) enum FlowCredentials {
    Secret(Zeroizing<String>),
    Keys(Arc<KeyStore>),
}

impl FlowCredentials {
    /// Build the client authentication for one token request. Assertions
    /// are signed fresh on every call.
    pub(crate) fn client_authentication(
        &self,
        client_id: &str,
        audience: &str,
        lifetime: Duration,
    ) -> Result<ClientAuthentication, FlowError> {
        match self {
            Self::Secret(secret) => Ok(ClientAuthentication::ClientSecret(secret.clone())),
            Self::Keys(keys) => {
                let claims = ClientAssertionClaims::new(client_id, audience, lifetime)?;
                let assertion = sign_client_assertion(&claims, keys.signing_key())?;
                Ok(ClientAuthentication::Assertion(assertion))
            }
        }
    }

    pub(crate) fn recover_id_token(&self, raw: &str) -> Result<RecoveredIdToken, FlowError> {
        match self {
            Self::Keys(keys) => Ok(recover_id_token(raw, keys.encryption_key())?),
            Self::Secret(_) => match raw.split('.').count() {
                3 => Ok(RecoveredIdToken {
                    token: CompactJws::parse(raw)?,
                    decrypted: false,
                }),
                5 => Err(FlowError::Protocol(
                    "encrypted ID token from a provider without a decryption key".to_string(),
                )),
                n => Err(sealedpass_auth::AuthError::SegmentCount(n).into()),
            },
        }
    }
}
