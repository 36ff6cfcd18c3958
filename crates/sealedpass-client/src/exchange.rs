//! Authorization-code grant against the token endpoint.
//!
//! One POST per call: an authorization code is single-use, so a failed
//! exchange is reported to the caller and never retried here.

use std::fmt;
use std::time::{Duration, Instant};

use reqwest::header::ACCEPT;
use reqwest::redirect::Policy;
use sealedpass_auth::{validate_code_verifier, CompactJws, CLIENT_ASSERTION_TYPE};
use serde::Deserialize;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::error::{ExchangeError, OAuthErrorBody};

/// Default bound on one token exchange.
pub const DEFAULT_EXCHANGE_TIMEOUT: Duration = Duration::from_secs(10);

/// Largest response body read from the token endpoint.
pub const MAX_RESPONSE_BYTES: usize = 64 * 1024;

const GRANT_TYPE: &str = "authorization_code";

/// Error bodies are logged up to this many characters. Success bodies are
/// never logged.
const LOGGED_BODY_CHARS: usize = 256;

/// How the client proves its identity in the token request.
#[derive(Clone)]
pub enum ClientAuthentication {
    /// `client_secret_post`
    ClientSecret(Zeroizing<String>),
    /// `private_key_jwt`
    Assertion(CompactJws),
}

/// A token request for the authorization-code grant.
pub struct TokenRequest {
    code: String,
    code_verifier: Zeroizing<String>,
    redirect_uri: String,
    client_id: String,
    client_auth: ClientAuthentication,
}

impl TokenRequest {
    /// Rejects an empty code or a code verifier outside RFC 7636 §4.1
    /// before anything is sent.
    pub fn new(
        code: impl Into<String>,
        code_verifier: impl Into<String>,
        redirect_uri: impl Into<String>,
        client_id: impl Into<String>,
        client_auth: ClientAuthentication,
    ) -> Result<Self, ExchangeError> {
        let code = code.into();
        if code.is_empty() {
            return Err(ExchangeError::EmptyCode);
        }
        let code_verifier = Zeroizing::new(code_verifier.into());
        validate_code_verifier(&code_verifier).map_err(ExchangeError::InvalidRequest)?;

        Ok(Self {
            code,
            code_verifier,
            redirect_uri: redirect_uri.into(),
            client_id: client_id.into(),
            client_auth,
        })
    }

    /// Form fields in the order they are sent.
    pub fn form_fields(&self) -> Vec<(&'static str, &str)> {
        let mut fields = vec![("client_id", self.client_id.as_str())];
        match &self.client_auth {
            ClientAuthentication::Assertion(assertion) => {
                fields.push(("client_assertion", assertion.as_str()));
                fields.push(("client_assertion_type", CLIENT_ASSERTION_TYPE));
            }
            ClientAuthentication::ClientSecret(secret) => {
                fields.push(("client_secret", secret.as_str()));
            }
        }
        fields.push(("code", self.code.as_str()));
        fields.push(("code_verifier", self.code_verifier.as_str()));
        fields.push(("grant_type", GRANT_TYPE));
        fields.push(("redirect_uri", self.redirect_uri.as_str()));
        fields
    }
}

impl fmt::Debug for TokenRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let method = match self.client_auth {
            ClientAuthentication::ClientSecret(_) => "client_secret_post",
            ClientAuthentication::Assertion(_) => "private_key_jwt",
        };
        f.debug_struct("TokenRequest")
            .field("client_id", &self.client_id)
            .field("redirect_uri", &self.redirect_uri)
            .field("client_auth", &method)
            .finish_non_exhaustive()
    }
}

/// Successful token endpoint response.
#[derive(Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    /// Compact JWS (3 segments) or compact JWE (5 segments).
    pub id_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field("token_type", &self.token_type)
            .field("id_token_segments", &self.id_token.split('.').count())
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

/// Sends token requests over HTTPS.
#[derive(Debug, Clone)]
pub struct TokenExchanger {
    http: reqwest::Client,
}

impl TokenExchanger {
    /// Exchanger with its own connection pool. Redirects are not followed.
    pub fn new() -> Result<Self, ExchangeError> {
        let http = reqwest::Client::builder()
            .redirect(Policy::none())
            .user_agent(concat!("sealedpass/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ExchangeError::ClientBuild)?;
        Ok(Self { http })
    }

    /// Exchanger over an existing client.
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// POST `request` to `endpoint` and parse the response.
    ///
    /// The whole exchange, body included, is bounded by `timeout`. When the
    /// timeout fires or the returned future is dropped, the request is
    /// aborted and its connection released.
    pub async fn exchange(
        &self,
        endpoint: &str,
        request: &TokenRequest,
        timeout: Duration,
    ) -> Result<TokenResponse, ExchangeError> {
        match tokio::time::timeout(timeout, self.send(endpoint, request)).await {
            Ok(result) => result,
            Err(_) => Err(ExchangeError::Timeout(timeout)),
        }
    }

    async fn send(
        &self,
        endpoint: &str,
        request: &TokenRequest,
    ) -> Result<TokenResponse, ExchangeError> {
        let started = Instant::now();
        let mut response = self
            .http
            .post(endpoint)
            .header(ACCEPT, "application/json")
            .form(&request.form_fields())
            .send()
            .await
            .map_err(ExchangeError::Network)?;

        let status = response.status().as_u16();
        let body = read_capped(&mut response, MAX_RESPONSE_BYTES)
            .await
            .map_err(|e| match e {
                CappedReadError::TooLarge => ExchangeError::BodyTooLarge {
                    status,
                    limit: MAX_RESPONSE_BYTES,
                },
                CappedReadError::Network(e) => ExchangeError::Network(e),
            })?;
        debug!(
            status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            body_len = body.len(),
            "token endpoint responded"
        );

        if !response.status().is_success() {
            let body = String::from_utf8_lossy(&body).into_owned();
            warn!(
                status,
                body = truncate_for_log(&body, LOGGED_BODY_CHARS),
                "token endpoint rejected the request"
            );
            let oauth_error = serde_json::from_str::<OAuthErrorBody>(&body).ok();
            return Err(ExchangeError::Status {
                status,
                body,
                oauth_error,
            });
        }

        serde_json::from_slice::<TokenResponse>(&body).map_err(|e| {
            ExchangeError::InvalidResponse {
                status,
                body: String::from_utf8_lossy(&body).into_owned(),
                reason: e.to_string(),
            }
        })
    }
}

fn truncate_for_log(body: &str, max_chars: usize) -> &str {
    match body.char_indices().nth(max_chars) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

pub(crate) enum CappedReadError {
    TooLarge,
    Network(reqwest::Error),
}

/// Read at most `limit` bytes of body.
pub(crate) async fn read_capped(
    response: &mut reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, CappedReadError> {
    if response.content_length().is_some_and(|len| len > limit as u64) {
        return Err(CappedReadError::TooLarge);
    }
    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(CappedReadError::Network)? {
        if body.len() + chunk.len() > limit {
            return Err(CappedReadError::TooLarge);
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}
