//! Fetching provider metadata.

use std::time::Duration;

use reqwest::header::ACCEPT;
use sealedpass_discovery::{validate_provider_metadata, ProviderMetadata};
use tracing::debug;

use crate::error::ConfigError;
use crate::exchange::{read_capped, CappedReadError, MAX_RESPONSE_BYTES};

/// GET and validate the provider metadata document at `url`.
pub async fn discover_provider(
    http: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> Result<ProviderMetadata, ConfigError> {
    let body = match tokio::time::timeout(timeout, fetch_document(http, url)).await {
        Ok(Ok(body)) => body,
        Ok(Err(reason)) => {
            return Err(ConfigError::DiscoveryUnavailable {
                url: url.to_string(),
                reason,
            })
        }
        Err(_) => {
            return Err(ConfigError::DiscoveryUnavailable {
                url: url.to_string(),
                reason: format!("no response within {:?}", timeout),
            })
        }
    };
    debug!(url, body_len = body.len(), "fetched provider metadata");

    let json: serde_json::Value = serde_json::from_slice(&body)?;
    Ok(validate_provider_metadata(&json)?)
}

async fn fetch_document(http: &reqwest::Client, url: &str) -> Result<Vec<u8>, String> {
    let mut response = http
        .get(url)
        .header(ACCEPT, "application/json")
        .send()
        .await
        .map_err(|e| e.to_string())?;
    if !response.status().is_success() {
        return Err(format!("HTTP {}", response.status().as_u16()));
    }
    read_capped(&mut response, MAX_RESPONSE_BYTES)
        .await
        .map_err(|e| match e {
            CappedReadError::TooLarge => format!("document exceeds {} bytes", MAX_RESPONSE_BYTES),
            CappedReadError::Network(e) => e.to_string(),
        })
}
