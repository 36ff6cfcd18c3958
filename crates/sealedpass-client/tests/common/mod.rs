//! In-process stub provider for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Form, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use sealedpass_auth::{
    encrypt_compact_jwe, generate_private_jwk, sign_compact, verify_client_assertion,
    AssertionExpectations, Jwk, KeyStore, SigningKey, CLIENT_ASSERTION_TYPE,
};
use sealedpass_client::{AuthConfiguration, Provider};
use sealedpass_crypto::{ContentEncryption, EcCurve, EcPublicKey, KeyManagementAlgorithm, SignatureAlgorithm};
use serde_json::json;

pub const CLIENT_ID: &str = "rp-123";
pub const REDIRECT_URI: &str = "https://app.example/callback";
pub const VERIFIER_A: &str = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
pub const VERIFIER_B: &str = "M25iVXpKU3puUjFaYWg3T1NDTDQtcW1ROUY5YXlwalNoc0hhakxifmZHag";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("sealedpass_client=debug")
        .with_test_writer()
        .try_init();
}

/// How the stub token endpoint answers.
#[derive(Clone)]
pub enum Behavior {
    /// Validate the request and issue tokens.
    Issue,
    /// Answer with a fixed status and body.
    Fail(StatusCode, &'static str),
    /// Sleep before issuing.
    Delay(Duration),
    /// 200 with a body that is not a token response.
    Garbage,
    /// 200 with a body larger than the client reads.
    Oversized,
}

/// The relying party's keys, as the provider knows them.
pub struct RpKeys {
    pub store: KeyStore,
    pub signing_public: EcPublicKey,
    pub encryption_public: Jwk,
}

impl RpKeys {
    pub fn generate() -> Self {
        let sig = generate_private_jwk(EcCurve::P521, "sig-1", "sig", "ES512").unwrap();
        let enc = generate_private_jwk(EcCurve::P521, "enc-1", "enc", "ECDH-ES+A256KW").unwrap();
        let store = KeyStore::load(&sig, &enc).unwrap();
        Self {
            signing_public: store.signing_key().public_key(),
            encryption_public: enc.to_public(),
            store,
        }
    }
}

struct StubState {
    issuer: String,
    behavior: Behavior,
    hits: AtomicUsize,
    forms: Mutex<Vec<HashMap<String, String>>>,
    rp_signing_public: EcPublicKey,
    /// Encrypt ID tokens to this key; plain JWS when `None`.
    id_token_recipient: Option<Jwk>,
    op_signing: SigningKey,
}

pub struct StubProvider {
    pub issuer: String,
    pub token_endpoint: String,
    pub discovery_url: String,
    pub op_signing_public: EcPublicKey,
    state: Arc<StubState>,
}

impl StubProvider {
    pub async fn start(keys: &RpKeys, behavior: Behavior, encrypt_id_tokens: bool) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let issuer = format!("http://{}", listener.local_addr().unwrap());

        let op_jwk = generate_private_jwk(EcCurve::P521, "op-sig", "sig", "ES512").unwrap();
        let op_signing = SigningKey::from_jwk(&op_jwk).unwrap();

        let state = Arc::new(StubState {
            issuer: issuer.clone(),
            behavior,
            hits: AtomicUsize::new(0),
            forms: Mutex::new(Vec::new()),
            rp_signing_public: keys.signing_public.clone(),
            id_token_recipient: encrypt_id_tokens.then(|| keys.encryption_public.clone()),
            op_signing,
        });

        let app = Router::new()
            .route("/token", post(token))
            .route("/.well-known/openid-configuration", get(metadata))
            .with_state(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            token_endpoint: format!("{}/token", issuer),
            discovery_url: format!("{}/.well-known/openid-configuration", issuer),
            op_signing_public: state.op_signing.public_key(),
            issuer,
            state,
        }
    }

    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    pub fn forms(&self) -> Vec<HashMap<String, String>> {
        self.state.forms.lock().unwrap().clone()
    }

    /// Configuration for this provider with `keys` and a direct token endpoint.
    pub fn config(&self, keys: &RpKeys) -> AuthConfiguration {
        AuthConfiguration::new(
            &self.issuer,
            CLIENT_ID,
            REDIRECT_URI,
            Provider::private_key_jwt(keys.store.clone()),
        )
        .unwrap()
        .with_token_endpoint(&self.token_endpoint)
        .unwrap()
    }
}

async fn metadata(State(state): State<Arc<StubState>>) -> Json<serde_json::Value> {
    Json(json!({
        "issuer": state.issuer,
        "authorization_endpoint": format!("{}/authorize", state.issuer),
        "token_endpoint": format!("{}/token", state.issuer),
        "jwks_uri": format!("{}/jwks", state.issuer),
        "token_endpoint_auth_methods_supported": ["private_key_jwt"],
        "token_endpoint_auth_signing_alg_values_supported": ["ES512"],
        "id_token_encryption_alg_values_supported": ["ECDH-ES+A256KW"],
        "id_token_encryption_enc_values_supported": ["A256GCM"],
        "code_challenge_methods_supported": ["S256"]
    }))
}

async fn token(
    State(state): State<Arc<StubState>>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    state.forms.lock().unwrap().push(form.clone());

    match &state.behavior {
        Behavior::Fail(status, body) => return (*status, *body).into_response(),
        Behavior::Garbage => return (StatusCode::OK, "<html>maintenance</html>").into_response(),
        Behavior::Oversized => {
            return (StatusCode::OK, "x".repeat(70 * 1024)).into_response();
        }
        Behavior::Delay(delay) => tokio::time::sleep(*delay).await,
        Behavior::Issue => {}
    }

    if let Err(reason) = check_request(&state, &form) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "invalid_client", "error_description": reason})),
        )
            .into_response();
    }

    let code = &form["code"];
    let id_token = sign_compact(
        &json!({"alg": "ES512", "kid": state.op_signing.kid()}),
        &json!({
            "iss": state.issuer,
            "sub": format!("user-for-{}", code),
            "aud": CLIENT_ID,
            "iat": chrono::Utc::now().timestamp(),
            "exp": chrono::Utc::now().timestamp() + 300,
        }),
        &state.op_signing,
    )
    .unwrap();

    let id_token = match &state.id_token_recipient {
        Some(recipient) => encrypt_compact_jwe(
            id_token.as_str().as_bytes(),
            recipient,
            KeyManagementAlgorithm::EcdhEsA256Kw,
            ContentEncryption::A256Gcm,
            Some("JWT"),
        )
        .unwrap(),
        None => id_token.into_string(),
    };

    Json(json!({
        "access_token": format!("at-{}", code),
        "token_type": "Bearer",
        "id_token": id_token,
        "expires_in": 300
    }))
    .into_response()
}

fn check_request(state: &StubState, form: &HashMap<String, String>) -> Result<(), String> {
    let field = |name: &str| form.get(name).map(String::as_str).unwrap_or_default();

    if field("grant_type") != "authorization_code" {
        return Err("grant_type".to_string());
    }
    if field("client_id") != CLIENT_ID || field("redirect_uri") != REDIRECT_URI {
        return Err("client_id or redirect_uri".to_string());
    }
    if field("code").is_empty() || field("code_verifier").is_empty() {
        return Err("code or code_verifier".to_string());
    }
    if field("client_assertion_type") != CLIENT_ASSERTION_TYPE {
        return Err("client_assertion_type".to_string());
    }
    verify_client_assertion(
        field("client_assertion"),
        SignatureAlgorithm::Es512,
        &state.rp_signing_public,
        &AssertionExpectations {
            client_id: CLIENT_ID,
            audience: &state.issuer,
        },
        chrono::Utc::now().timestamp(),
    )
    .map(|_| ())
    .map_err(|e| e.to_string())
}
