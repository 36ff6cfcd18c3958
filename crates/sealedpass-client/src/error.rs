use std::path::PathBuf;
use std::time::Duration;

use sealedpass_auth::AuthError;
pub use sealedpass_auth::ErrorKind;
use sealedpass_discovery::DiscoveryError;
use serde::Deserialize;
use thiserror::Error;

/// Startup failures: settings, secrets, keys and endpoint resolution.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("Invalid URL for {field}: {reason}")]
    InvalidUrl { field: &'static str, reason: String },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Key material rejected: {0}")]
    Keys(#[from] AuthError),

    #[error("Neither token_endpoint nor discovery_url is configured")]
    NoTokenEndpoint,

    #[error("Token endpoint not resolved; call resolve_endpoints first")]
    UnresolvedTokenEndpoint,

    #[error("Provider discovery at {url} failed: {reason}")]
    DiscoveryUnavailable { url: String, reason: String },

    #[error("Provider metadata rejected: {0}")]
    Discovery(#[from] DiscoveryError),
}

/// OAuth error object from a failed token response (RFC 6749 §5.2).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OAuthErrorBody {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

impl std::fmt::Display for OAuthErrorBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.error_description {
            Some(description) => write!(f, "{}: {}", self.error, description),
            None => f.write_str(&self.error),
        }
    }
}

/// A failed call to the token endpoint.
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("Invalid token request: {0}")]
    InvalidRequest(#[source] AuthError),

    #[error("Invalid token request: authorization code is empty")]
    EmptyCode,

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Token endpoint unreachable: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Token endpoint did not respond within {0:?}")]
    Timeout(Duration),

    #[error("Token endpoint returned HTTP {status}{}", oauth_suffix(.oauth_error))]
    Status {
        status: u16,
        body: String,
        oauth_error: Option<OAuthErrorBody>,
    },

    #[error("Unparsable token response (HTTP {status}): {reason}")]
    InvalidResponse {
        status: u16,
        body: String,
        reason: String,
    },

    #[error("Token response exceeds {limit} bytes")]
    BodyTooLarge { status: u16, limit: usize },
}

fn oauth_suffix(error: &Option<OAuthErrorBody>) -> String {
    error
        .as_ref()
        .map(|e| format!(" ({})", e))
        .unwrap_or_default()
}

impl ExchangeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ClientBuild(_) => ErrorKind::Configuration,
            Self::Network(_) | Self::Status { .. } => ErrorKind::Network,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::InvalidRequest(_)
            | Self::EmptyCode
            | Self::InvalidResponse { .. }
            | Self::BodyTooLarge { .. } => ErrorKind::Protocol,
        }
    }

    /// HTTP status, when the endpoint answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. }
            | Self::InvalidResponse { status, .. }
            | Self::BodyTooLarge { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw response body, when the endpoint answered.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Status { body, .. } | Self::InvalidResponse { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// Why a token flow failed.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Exchange(#[from] ExchangeError),

    #[error("Protocol violation: {0}")]
    Protocol(String),

    #[error("Token flow cancelled")]
    Cancelled,
}

impl FlowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Configuration,
            Self::Auth(e) => e.kind(),
            Self::Exchange(e) => e.kind(),
            Self::Protocol(_) => ErrorKind::Protocol,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }
}
