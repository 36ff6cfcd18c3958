use std::path::{Path, PathBuf};

use sealedpass_client::{AuthConfiguration, AuthSettings, ConfigError, ErrorKind, FlowError};
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn write_settings(dir: &TempDir, signing: &Path, encryption: &Path) -> PathBuf {
    let path = dir.path().join("sealedpass.json");
    let settings = serde_json::json!({
        "issuer": "https://id.example/singpass/v2",
        "token_endpoint": "https://id.example/singpass/v2/token",
        "client_id": "rp-123",
        "redirect_uri": "https://app.example/callback",
        "client_auth": {
            "method": "private_key_jwt",
            "signing_key": {"file": signing},
            "encryption_key": {"file": encryption}
        },
        "assertion_lifetime_secs": 60
    });
    std::fs::write(&path, serde_json::to_vec_pretty(&settings).unwrap()).unwrap();
    path
}

#[test]
fn loads_key_files_named_by_settings() {
    let dir = TempDir::new().unwrap();
    let path = write_settings(
        &dir,
        &fixture("rp-signing.jwk.json"),
        &fixture("rp-encryption.jwk.json"),
    );

    let settings = AuthSettings::from_file(&path).unwrap();
    let config = AuthConfiguration::from_settings(&settings).unwrap();

    assert_eq!(config.client_id(), "rp-123");
    assert_eq!(config.assertion_audience(), "https://id.example/singpass/v2");
    assert_eq!(config.assertion_lifetime().as_secs(), 60);
    assert_eq!(config.exchange_timeout().as_secs(), 10);

    let keys = config.provider().key_store().unwrap().snapshot();
    assert_eq!(keys.signing_key().kid(), "sig-2024-03-01T09:00:00Z");
    assert_eq!(keys.encryption_key().kid(), "enc-2024-03-01T09:00:00Z");

    let jwks = config.provider().key_store().unwrap().public_jwks().unwrap();
    let published = serde_json::to_string(&jwks).unwrap();
    assert!(!published.contains("\"d\""));
    assert!(published.contains("ES512"));
    assert!(published.contains("ECDH-ES+A256KW"));

    let debug = format!("{:?}", config);
    let signing_d = serde_json::from_str::<serde_json::Value>(
        &std::fs::read_to_string(fixture("rp-signing.jwk.json")).unwrap(),
    )
    .unwrap()["d"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(!debug.contains(&signing_d));
}

#[test]
fn swapped_key_files_are_a_configuration_error() {
    let dir = TempDir::new().unwrap();
    let path = write_settings(
        &dir,
        &fixture("rp-encryption.jwk.json"),
        &fixture("rp-signing.jwk.json"),
    );

    let settings = AuthSettings::from_file(&path).unwrap();
    let err = AuthConfiguration::from_settings(&settings).unwrap_err();
    assert!(matches!(err, ConfigError::Keys(_)));
    assert_eq!(FlowError::from(err).kind(), ErrorKind::Configuration);
}

#[test]
fn missing_key_file_is_reported_with_path() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.jwk.json");
    let path = write_settings(&dir, &missing, &fixture("rp-encryption.jwk.json"));

    let settings = AuthSettings::from_file(&path).unwrap();
    let err = AuthConfiguration::from_settings(&settings).unwrap_err();
    assert!(err.to_string().contains("missing.jwk.json"));
}

#[test]
fn plain_http_issuer_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sealedpass.json");
    std::fs::write(
        &path,
        r#"{
            "issuer": "http://id.example",
            "token_endpoint": "https://id.example/token",
            "client_id": "rp-123",
            "redirect_uri": "https://app.example/callback",
            "client_auth": {"method": "client_secret_post", "client_secret": {"env": "SEALEDPASS_TEST_SECRET_HTTP"}}
        }"#,
    )
    .unwrap();
    std::env::set_var("SEALEDPASS_TEST_SECRET_HTTP", "s3cret");

    let settings = AuthSettings::from_file(&path).unwrap();
    let err = AuthConfiguration::from_settings(&settings).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidUrl { field: "issuer", .. }));
}

#[test]
fn client_secret_read_from_environment() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sealedpass.json");
    std::fs::write(
        &path,
        r#"{
            "issuer": "https://id.example",
            "token_endpoint": "https://id.example/token",
            "client_id": "rp-123",
            "redirect_uri": "https://app.example/callback",
            "client_auth": {"method": "client_secret_post", "client_secret": {"env": "SEALEDPASS_TEST_SECRET_OK"}}
        }"#,
    )
    .unwrap();
    std::env::set_var("SEALEDPASS_TEST_SECRET_OK", "s3cret");

    let settings = AuthSettings::from_file(&path).unwrap();
    let config = AuthConfiguration::from_settings(&settings).unwrap();
    assert_eq!(config.provider().auth_method(), "client_secret_post");
    assert!(!format!("{:?}", config).contains("s3cret"));
}
