//! Relying-party configuration.
//!
//! [`AuthSettings`] is the serializable description of one provider entry.
//! Key material and client secrets are never inline: the settings name a
//! file or an environment variable holding them. [`AuthConfiguration`] is
//! the validated, loaded form handed to the flow orchestrator.

use std::fmt;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Url;
use sealedpass_auth::{KeyStore, MAX_ASSERTION_LIFETIME};
use sealedpass_discovery::check_compatibility;
use serde::{Deserialize, Serialize};
use tracing::info;
use zeroize::Zeroizing;

use crate::discovery::discover_provider;
use crate::error::ConfigError;
use crate::provider::Provider;

const DEFAULT_ASSERTION_LIFETIME_SECS: u64 = 120;
const DEFAULT_EXCHANGE_TIMEOUT_SECS: u64 = 10;

/// Where a secret lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretSource {
    File(PathBuf),
    Env(String),
}

impl SecretSource {
    pub fn read(&self) -> Result<Zeroizing<String>, ConfigError> {
        let value = Zeroizing::new(match self {
            Self::File(path) => std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.clone(),
                source,
            })?,
            Self::Env(name) => {
                std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.clone()))?
            }
        });
        Ok(Zeroizing::new(value.trim().to_string()))
    }
}

/// Client authentication settings, tagged by `method`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum ClientAuthSettings {
    PrivateKeyJwt {
        signing_key: SecretSource,
        encryption_key: SecretSource,
    },
    ClientSecretPost {
        client_secret: SecretSource,
    },
}

/// One provider entry, as read from a settings file or the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    /// OIDC issuer URL
    pub issuer: String,

    /// Token endpoint; may be omitted when `discovery_url` is set
    #[serde(default)]
    pub token_endpoint: Option<String>,

    /// Provider metadata document URL
    #[serde(default)]
    pub discovery_url: Option<String>,

    pub client_id: String,

    pub redirect_uri: String,

    pub client_auth: ClientAuthSettings,

    /// `aud` of client assertions; defaults to the issuer
    #[serde(default)]
    pub assertion_audience: Option<String>,

    #[serde(default = "default_assertion_lifetime_secs")]
    pub assertion_lifetime_secs: u64,

    #[serde(default = "default_exchange_timeout_secs")]
    pub exchange_timeout_secs: u64,

    /// Reject plain signed ID tokens from this provider
    #[serde(default)]
    pub require_encrypted_id_token: bool,
}

fn default_assertion_lifetime_secs() -> u64 {
    DEFAULT_ASSERTION_LIFETIME_SECS
}

fn default_exchange_timeout_secs() -> u64 {
    DEFAULT_EXCHANGE_TIMEOUT_SECS
}

impl AuthSettings {
    /// Load settings from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Load settings from `SEALEDPASS_CONFIG` (a file path), or else from
    /// individual `SEALEDPASS_*` variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        if let Some(path) = var("SEALEDPASS_CONFIG") {
            return Self::from_file(Path::new(&path));
        }

        let required = |name: &str| var(name).ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()));
        let number = |name: &'static str, default: u64| -> Result<u64, ConfigError> {
            match var(name) {
                Some(v) => v.parse().map_err(|_| ConfigError::InvalidValue {
                    field: name,
                    reason: format!("expected a number of seconds, got {:?}", v),
                }),
                None => Ok(default),
            }
        };

        let client_auth = match var("SEALEDPASS_SIGNING_KEY_FILE") {
            Some(signing) => ClientAuthSettings::PrivateKeyJwt {
                signing_key: SecretSource::File(signing.into()),
                encryption_key: SecretSource::File(
                    required("SEALEDPASS_ENCRYPTION_KEY_FILE")?.into(),
                ),
            },
            None if var("SEALEDPASS_CLIENT_SECRET").is_some() => {
                ClientAuthSettings::ClientSecretPost {
                    client_secret: SecretSource::Env("SEALEDPASS_CLIENT_SECRET".to_string()),
                }
            }
            None => {
                return Err(ConfigError::MissingEnvVar(
                    "SEALEDPASS_SIGNING_KEY_FILE".to_string(),
                ))
            }
        };

        Ok(Self {
            issuer: required("SEALEDPASS_ISSUER")?,
            token_endpoint: var("SEALEDPASS_TOKEN_ENDPOINT"),
            discovery_url: var("SEALEDPASS_DISCOVERY_URL"),
            client_id: required("SEALEDPASS_CLIENT_ID")?,
            redirect_uri: required("SEALEDPASS_REDIRECT_URI")?,
            client_auth,
            assertion_audience: var("SEALEDPASS_ASSERTION_AUDIENCE"),
            assertion_lifetime_secs: number(
                "SEALEDPASS_ASSERTION_LIFETIME_SECS",
                DEFAULT_ASSERTION_LIFETIME_SECS,
            )?,
            exchange_timeout_secs: number(
                "SEALEDPASS_EXCHANGE_TIMEOUT_SECS",
                DEFAULT_EXCHANGE_TIMEOUT_SECS,
            )?,
            require_encrypted_id_token: var("SEALEDPASS_REQUIRE_ENCRYPTED_ID_TOKEN")
                .is_some_and(|v| matches!(v.as_str(), "1" | "true" | "yes")),
        })
    }
}

/// Validated relying-party configuration for one provider.
///
/// Built once per process and passed by reference to every flow.
#[derive(Clone)]
pub struct AuthConfiguration {
    issuer: String,
    token_endpoint: Option<String>,
    discovery_url: Option<String>,
    client_id: String,
    redirect_uri: String,
    provider: Provider,
    assertion_audience: Option<String>,
    assertion_lifetime: Duration,
    exchange_timeout: Duration,
    require_encrypted_id_token: bool,
}

impl AuthConfiguration {
    /// Configuration with default lifetime and timeout and no endpoints;
    /// add one with [`with_token_endpoint`](Self::with_token_endpoint) or
    /// [`with_discovery_url`](Self::with_discovery_url).
    pub fn new(
        issuer: &str,
        client_id: &str,
        redirect_uri: &str,
        provider: Provider,
    ) -> Result<Self, ConfigError> {
        if client_id.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "client_id",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(Self {
            issuer: validate_url("issuer", issuer)?,
            token_endpoint: None,
            discovery_url: None,
            client_id: client_id.to_string(),
            redirect_uri: validate_url("redirect_uri", redirect_uri)?,
            provider,
            assertion_audience: None,
            assertion_lifetime: Duration::from_secs(DEFAULT_ASSERTION_LIFETIME_SECS),
            exchange_timeout: Duration::from_secs(DEFAULT_EXCHANGE_TIMEOUT_SECS),
            require_encrypted_id_token: false,
        })
    }

    /// Resolve secrets, load keys and validate `settings`.
    pub fn from_settings(settings: &AuthSettings) -> Result<Self, ConfigError> {
        let provider = match &settings.client_auth {
            ClientAuthSettings::PrivateKeyJwt {
                signing_key,
                encryption_key,
            } => {
                let keys = KeyStore::load_json(&signing_key.read()?, &encryption_key.read()?)?;
                Provider::private_key_jwt(keys)
            }
            ClientAuthSettings::ClientSecretPost { client_secret } => {
                let secret = client_secret.read()?;
                if secret.is_empty() {
                    return Err(ConfigError::InvalidValue {
                        field: "client_secret",
                        reason: "must not be empty".to_string(),
                    });
                }
                Provider::StandardClientSecret {
                    client_secret: secret,
                }
            }
        };

        let mut config = Self::new(
            &settings.issuer,
            &settings.client_id,
            &settings.redirect_uri,
            provider,
        )?
        .with_assertion_lifetime(Duration::from_secs(settings.assertion_lifetime_secs))?
        .with_exchange_timeout(Duration::from_secs(settings.exchange_timeout_secs))?
        .with_required_encryption(settings.require_encrypted_id_token);

        if let Some(audience) = &settings.assertion_audience {
            config = config.with_assertion_audience(audience)?;
        }
        if let Some(url) = &settings.token_endpoint {
            config = config.with_token_endpoint(url)?;
        }
        if let Some(url) = &settings.discovery_url {
            config = config.with_discovery_url(url)?;
        }
        if config.token_endpoint.is_none() && config.discovery_url.is_none() {
            return Err(ConfigError::NoTokenEndpoint);
        }
        Ok(config)
    }

    pub fn with_token_endpoint(mut self, url: &str) -> Result<Self, ConfigError> {
        self.token_endpoint = Some(validate_url("token_endpoint", url)?);
        Ok(self)
    }

    pub fn with_discovery_url(mut self, url: &str) -> Result<Self, ConfigError> {
        self.discovery_url = Some(validate_url("discovery_url", url)?);
        Ok(self)
    }

    pub fn with_assertion_audience(mut self, audience: &str) -> Result<Self, ConfigError> {
        if audience.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "assertion_audience",
                reason: "must not be empty".to_string(),
            });
        }
        self.assertion_audience = Some(audience.to_string());
        Ok(self)
    }

    pub fn with_assertion_lifetime(mut self, lifetime: Duration) -> Result<Self, ConfigError> {
        if lifetime.is_zero() || lifetime > MAX_ASSERTION_LIFETIME {
            return Err(ConfigError::InvalidValue {
                field: "assertion_lifetime_secs",
                reason: format!(
                    "must be between 1 and {}",
                    MAX_ASSERTION_LIFETIME.as_secs()
                ),
            });
        }
        self.assertion_lifetime = lifetime;
        Ok(self)
    }

    pub fn with_exchange_timeout(mut self, timeout: Duration) -> Result<Self, ConfigError> {
        if timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "exchange_timeout_secs",
                reason: "must be positive".to_string(),
            });
        }
        self.exchange_timeout = timeout;
        Ok(self)
    }

    pub fn with_required_encryption(mut self, required: bool) -> Self {
        self.require_encrypted_id_token = required;
        self
    }

    /// Fill in the token endpoint from provider discovery if it was not
    /// configured, checking that the provider supports this configuration.
    pub async fn resolve_endpoints(self, http: &reqwest::Client) -> Result<Self, ConfigError> {
        if self.token_endpoint.is_some() {
            return Ok(self);
        }
        let url = self
            .discovery_url
            .clone()
            .ok_or(ConfigError::NoTokenEndpoint)?;

        let metadata = discover_provider(http, &url, self.exchange_timeout).await?;
        check_compatibility(&metadata, &self.provider.requirements(&self.issuer))?;
        info!(
            issuer = %metadata.issuer,
            token_endpoint = %metadata.token_endpoint,
            "resolved token endpoint from provider metadata"
        );
        self.with_token_endpoint(&metadata.token_endpoint)
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn token_endpoint(&self) -> Option<&str> {
        self.token_endpoint.as_deref()
    }

    pub fn discovery_url(&self) -> Option<&str> {
        self.discovery_url.as_deref()
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    /// `aud` of client assertions: the configured audience, else the issuer.
    pub fn assertion_audience(&self) -> &str {
        self.assertion_audience.as_deref().unwrap_or(&self.issuer)
    }

    pub fn assertion_lifetime(&self) -> Duration {
        self.assertion_lifetime
    }

    pub fn exchange_timeout(&self) -> Duration {
        self.exchange_timeout
    }

    pub fn require_encrypted_id_token(&self) -> bool {
        self.require_encrypted_id_token
    }
}

impl fmt::Debug for AuthConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfiguration")
            .field("issuer", &self.issuer)
            .field("token_endpoint", &self.token_endpoint)
            .field("discovery_url", &self.discovery_url)
            .field("client_id", &self.client_id)
            .field("redirect_uri", &self.redirect_uri)
            .field("provider", &self.provider)
            .field("assertion_audience", &self.assertion_audience())
            .field("assertion_lifetime", &self.assertion_lifetime)
            .field("exchange_timeout", &self.exchange_timeout)
            .field("require_encrypted_id_token", &self.require_encrypted_id_token)
            .finish()
    }
}

/// Parse `value` as an absolute URL. HTTPS is required except for
/// loopback hosts.
fn validate_url(field: &'static str, value: &str) -> Result<String, ConfigError> {
    let url = Url::parse(value).map_err(|e| ConfigError::InvalidUrl {
        field,
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "https" => Ok(value.to_string()),
        "http" if is_loopback(&url) => Ok(value.to_string()),
        "http" => Err(ConfigError::InvalidUrl {
            field,
            reason: format!("{} must use https", value),
        }),
        other => Err(ConfigError::InvalidUrl {
            field,
            reason: format!("unsupported scheme {}", other),
        }),
    }
}

fn is_loopback(url: &Url) -> bool {
    match url.host_str() {
        Some("localhost") => true,
        Some(host) => host
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse::<IpAddr>()
            .is_ok_and(|ip| ip.is_loopback()),
        None => false,
    }
}
