use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Invalid provider metadata: expected object")]
    NotAnObject,

    #[error("Invalid provider metadata: missing {field}")]
    MissingField { field: &'static str },

    #[error("Invalid provider metadata: {field} must be an array of strings")]
    InvalidList { field: &'static str },

    #[error("Provider issuer {got} does not match configured issuer {expected}")]
    IssuerMismatch { expected: String, got: String },

    #[error("Provider does not support {value} (advertised {field}: {advertised:?})")]
    Unsupported {
        field: &'static str,
        value: String,
        advertised: Vec<String>,
    },

    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}
