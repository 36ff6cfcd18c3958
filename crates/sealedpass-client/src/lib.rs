//! Token exchange for an OpenID Connect relying party using
//! `private_key_jwt` client authentication and encrypted ID tokens.
//!
//! The entry point is [`FlowOrchestrator`]: given an [`AuthConfiguration`]
//! and the authorization code from the provider's redirect, it signs a
//! client assertion, exchanges the code at the token endpoint, and
//! recovers the (still unverified) signed ID token.
//!
//! ```no_run
//! use sealedpass_client::{AuthConfiguration, AuthSettings, AuthorizationCallback, FlowOrchestrator};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = AuthSettings::from_env()?;
//! let orchestrator = FlowOrchestrator::new()?;
//! let config = AuthConfiguration::from_settings(&settings)?
//!     .resolve_endpoints(orchestrator.exchanger().http())
//!     .await?;
//!
//! let callback = AuthorizationCallback::new("code-from-redirect", "verifier-kept-in-session");
//! let tokens = orchestrator.run(&config, callback).await.into_result()?;
//! println!("id token: {} bytes", tokens.id_token.as_str().len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod discovery;
pub mod error;
pub mod exchange;
pub mod flow;
pub mod keys;
pub mod provider;

pub use config::{AuthConfiguration, AuthSettings, ClientAuthSettings, SecretSource};
pub use discovery::discover_provider;
pub use error::{ConfigError, ErrorKind, ExchangeError, FlowError, OAuthErrorBody};
pub use exchange::{
    ClientAuthentication, TokenExchanger, TokenRequest, TokenResponse, DEFAULT_EXCHANGE_TIMEOUT,
    MAX_RESPONSE_BYTES,
};
pub use flow::{
    AuthorizationCallback, FlowFailure, FlowOrchestrator, FlowOutcome, FlowStage, FlowTokens,
};
pub use keys::SharedKeyStore;
pub use provider::Provider;
