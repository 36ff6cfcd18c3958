//! One authorization-code callback, start to finish.
//!
//! ```text
//! Start → AssertionSigned → ExchangeSent → ResponseReceived → IdTokenRecovered → Succeeded
//!   └──────────┴───────────────┴──────────────┴────────────────┴──→ Failed
//! ```
//!
//! Every run is a single pass. Nothing is retried: the code and the PKCE
//! verifier are single-use, so recovering from a failure means starting a
//! new authorization request.

use std::fmt;
use std::time::Instant;

use sealedpass_auth::CompactJws;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};
use zeroize::Zeroizing;

use crate::config::AuthConfiguration;
use crate::error::{ConfigError, ErrorKind, ExchangeError, FlowError};
use crate::exchange::{TokenExchanger, TokenRequest};

/// Progress of a flow; on failure, the last stage reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStage {
    Start,
    AssertionSigned,
    ExchangeSent,
    ResponseReceived,
    IdTokenRecovered,
}

/// What the redirect back from the provider delivered, plus the verifier
/// the collaborator kept from the authorization request.
pub struct AuthorizationCallback {
    pub code: String,
    pub code_verifier: Zeroizing<String>,
}

impl AuthorizationCallback {
    pub fn new(code: impl Into<String>, code_verifier: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            code_verifier: Zeroizing::new(code_verifier.into()),
        }
    }
}

impl fmt::Debug for AuthorizationCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizationCallback").finish_non_exhaustive()
    }
}

/// Tokens handed to the session layer. The ID token signature has NOT been
/// verified.
#[derive(Clone)]
pub struct FlowTokens {
    pub access_token: String,
    pub token_type: String,
    pub id_token: CompactJws,
    /// Whether the ID token arrived as a JWE.
    pub id_token_was_encrypted: bool,
    pub expires_in: Option<u64>,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
}

impl fmt::Debug for FlowTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowTokens")
            .field("token_type", &self.token_type)
            .field("id_token", &self.id_token)
            .field("id_token_was_encrypted", &self.id_token_was_encrypted)
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct FlowFailure {
    pub stage: FlowStage,
    pub error: FlowError,
}

impl FlowFailure {
    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}

impl fmt::Display for FlowFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "token flow failed after {:?}: {}", self.stage, self.error)
    }
}

impl std::error::Error for FlowFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Terminal state of a flow.
#[derive(Debug)]
pub enum FlowOutcome {
    Succeeded(FlowTokens),
    Failed(FlowFailure),
}

impl FlowOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }

    pub fn into_result(self) -> Result<FlowTokens, FlowFailure> {
        match self {
            Self::Succeeded(tokens) => Ok(tokens),
            Self::Failed(failure) => Err(failure),
        }
    }
}

/// Runs token flows. Holds no per-flow state, so one orchestrator serves
/// any number of concurrent flows.
#[derive(Debug, Clone)]
pub struct FlowOrchestrator {
    exchanger: TokenExchanger,
}

impl FlowOrchestrator {
    pub fn new() -> Result<Self, ExchangeError> {
        Ok(Self::with_exchanger(TokenExchanger::new()?))
    }

    pub fn with_exchanger(exchanger: TokenExchanger) -> Self {
        Self { exchanger }
    }

    pub fn exchanger(&self) -> &TokenExchanger {
        &self.exchanger
    }

    /// Run one flow to completion.
    pub async fn run(
        &self,
        config: &AuthConfiguration,
        callback: AuthorizationCallback,
    ) -> FlowOutcome {
        self.run_with_cancellation(config, callback, &CancellationToken::new())
            .await
    }

    /// Run one flow, ending in `Failed(Cancelled)` if `cancel` fires first.
    /// Cancelling drops the in-flight request.
    pub async fn run_with_cancellation(
        &self,
        config: &AuthConfiguration,
        callback: AuthorizationCallback,
        cancel: &CancellationToken,
    ) -> FlowOutcome {
        let flow_id = uuid::Uuid::new_v4();
        let span = info_span!("token_flow", %flow_id, client_id = %config.client_id());

        async move {
            let started = Instant::now();
            let mut stage = FlowStage::Start;
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(FlowError::Cancelled),
                result = self.execute(config, callback, &mut stage) => result,
            };

            match result {
                Ok(tokens) => {
                    info!(
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        id_token_was_encrypted = tokens.id_token_was_encrypted,
                        "token flow succeeded"
                    );
                    FlowOutcome::Succeeded(tokens)
                }
                Err(error) => {
                    warn!(
                        ?stage,
                        kind = %error.kind(),
                        %error,
                        "token flow failed"
                    );
                    FlowOutcome::Failed(FlowFailure { stage, error })
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn execute(
        &self,
        config: &AuthConfiguration,
        callback: AuthorizationCallback,
        stage: &mut FlowStage,
    ) -> Result<FlowTokens, FlowError> {
        let endpoint = config
            .token_endpoint()
            .ok_or(ConfigError::UnresolvedTokenEndpoint)?;
        let credentials = config.provider().credentials();

        let client_auth = credentials.client_authentication(
            config.client_id(),
            config.assertion_audience(),
            config.assertion_lifetime(),
        )?;
        advance(stage, FlowStage::AssertionSigned);

        let request = TokenRequest::new(
            callback.code,
            callback.code_verifier.as_str(),
            config.redirect_uri(),
            config.client_id(),
            client_auth,
        )?;
        advance(stage, FlowStage::ExchangeSent);

        let response = self
            .exchanger
            .exchange(endpoint, &request, config.exchange_timeout())
            .await?;
        advance(stage, FlowStage::ResponseReceived);

        let recovered = credentials.recover_id_token(&response.id_token)?;
        if config.require_encrypted_id_token() && !recovered.decrypted {
            return Err(FlowError::Protocol(
                "provider returned a plain ID token where an encrypted one is required"
                    .to_string(),
            ));
        }
        advance(stage, FlowStage::IdTokenRecovered);

        Ok(FlowTokens {
            access_token: response.access_token,
            token_type: response.token_type,
            id_token: recovered.token,
            id_token_was_encrypted: recovered.decrypted,
            expires_in: response.expires_in,
            refresh_token: response.refresh_token,
            scope: response.scope,
        })
    }
}

fn advance(stage: &mut FlowStage, next: FlowStage) {
    debug!(from = ?*stage, to = ?next, "flow stage");
    *stage = next;
}
