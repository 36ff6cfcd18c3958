use serde::{Deserialize, Serialize};

/// The subset of an OpenID provider metadata document
/// (`/.well-known/openid-configuration`) the relying party reads.
///
/// Lists the provider does not advertise are empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderMetadata {
    pub issuer: String,
    pub token_endpoint: String,
    pub authorization_endpoint: Option<String>,
    pub jwks_uri: Option<String>,
    pub token_endpoint_auth_methods_supported: Vec<String>,
    pub token_endpoint_auth_signing_alg_values_supported: Vec<String>,
    pub id_token_encryption_alg_values_supported: Vec<String>,
    pub id_token_encryption_enc_values_supported: Vec<String>,
    pub code_challenge_methods_supported: Vec<String>,
}

/// What the relying party needs from a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderRequirements {
    /// Issuer the relying party is configured for.
    pub issuer: String,
    /// `private_key_jwt` or `client_secret_post`.
    pub auth_method: String,
    /// Assertion signing algorithm, for `private_key_jwt`.
    pub signing_alg: Option<String>,
    /// Key management algorithm ID tokens must be encrypted with.
    pub id_token_encryption_alg: Option<String>,
    /// Content encryption algorithms the relying party can decrypt; any
    /// one advertised by the provider suffices.
    pub id_token_encryption_enc: Vec<String>,
    /// PKCE method, normally `S256`.
    pub code_challenge_method: Option<String>,
}
