use crate::error::DiscoveryError;
use crate::types::{ProviderMetadata, ProviderRequirements};

/// Validate and parse a JSON value as OpenID provider metadata.
///
/// The JSON should come from `GET {issuer}/.well-known/openid-configuration`.
/// `issuer` and `token_endpoint` are required; the supported-value lists
/// are optional but must be string arrays when present.
///
/// # Errors
/// Returns `DiscoveryError` if the JSON is not a usable metadata document.
pub fn validate_provider_metadata(
    json: &serde_json::Value,
) -> Result<ProviderMetadata, DiscoveryError> {
    let obj = json.as_object().ok_or(DiscoveryError::NotAnObject)?;

    let issuer = get_non_empty_string(obj, "issuer")?;
    let token_endpoint = get_non_empty_string(obj, "token_endpoint")?;

    let optional_string = |field: &str| {
        obj.get(field)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
    };

    Ok(ProviderMetadata {
        issuer,
        token_endpoint,
        authorization_endpoint: optional_string("authorization_endpoint"),
        jwks_uri: optional_string("jwks_uri"),
        token_endpoint_auth_methods_supported: get_string_list(
            obj,
            "token_endpoint_auth_methods_supported",
        )?,
        token_endpoint_auth_signing_alg_values_supported: get_string_list(
            obj,
            "token_endpoint_auth_signing_alg_values_supported",
        )?,
        id_token_encryption_alg_values_supported: get_string_list(
            obj,
            "id_token_encryption_alg_values_supported",
        )?,
        id_token_encryption_enc_values_supported: get_string_list(
            obj,
            "id_token_encryption_enc_values_supported",
        )?,
        code_challenge_methods_supported: get_string_list(obj, "code_challenge_methods_supported")?,
    })
}

/// Check that `metadata` describes the provider the relying party is
/// configured for and advertises what it needs.
///
/// The issuer must match exactly. A list the provider leaves empty is not
/// checked.
pub fn check_compatibility(
    metadata: &ProviderMetadata,
    requirements: &ProviderRequirements,
) -> Result<(), DiscoveryError> {
    if metadata.issuer != requirements.issuer {
        return Err(DiscoveryError::IssuerMismatch {
            expected: requirements.issuer.clone(),
            got: metadata.issuer.clone(),
        });
    }

    require_advertised(
        "token_endpoint_auth_methods_supported",
        &metadata.token_endpoint_auth_methods_supported,
        &requirements.auth_method,
    )?;
    if let Some(alg) = &requirements.signing_alg {
        require_advertised(
            "token_endpoint_auth_signing_alg_values_supported",
            &metadata.token_endpoint_auth_signing_alg_values_supported,
            alg,
        )?;
    }
    if let Some(alg) = &requirements.id_token_encryption_alg {
        require_advertised(
            "id_token_encryption_alg_values_supported",
            &metadata.id_token_encryption_alg_values_supported,
            alg,
        )?;
    }
    let enc_advertised = &metadata.id_token_encryption_enc_values_supported;
    if !requirements.id_token_encryption_enc.is_empty()
        && !enc_advertised.is_empty()
        && !requirements
            .id_token_encryption_enc
            .iter()
            .any(|enc| enc_advertised.contains(enc))
    {
        return Err(DiscoveryError::Unsupported {
            field: "id_token_encryption_enc_values_supported",
            value: requirements.id_token_encryption_enc.join(" or "),
            advertised: enc_advertised.clone(),
        });
    }
    if let Some(method) = &requirements.code_challenge_method {
        require_advertised(
            "code_challenge_methods_supported",
            &metadata.code_challenge_methods_supported,
            method,
        )?;
    }
    Ok(())
}

fn require_advertised(
    field: &'static str,
    advertised: &[String],
    value: &str,
) -> Result<(), DiscoveryError> {
    if advertised.is_empty() || advertised.iter().any(|v| v == value) {
        return Ok(());
    }
    Err(DiscoveryError::Unsupported {
        field,
        value: value.to_string(),
        advertised: advertised.to_vec(),
    })
}

fn get_non_empty_string(
    obj: &serde_json::Map<String, serde_json::Value>,
    field: &'static str,
) -> Result<String, DiscoveryError> {
    match obj.get(field).and_then(|v| v.as_str()) {
        Some(s) if !s.is_empty() => Ok(s.to_string()),
        _ => Err(DiscoveryError::MissingField { field }),
    }
}

fn get_string_list(
    obj: &serde_json::Map<String, serde_json::Value>,
    field: &'static str,
) -> Result<Vec<String>, DiscoveryError> {
    let Some(value) = obj.get(field) else {
        return Ok(Vec::new());
    };
    value
        .as_array()
        .and_then(|arr| {
            arr.iter()
                .map(|v| v.as_str().map(|s| s.to_string()))
                .collect::<Option<Vec<_>>>()
        })
        .ok_or(DiscoveryError::InvalidList { field })
}
