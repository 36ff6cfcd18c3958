//! OpenID provider discovery types and validation.
//!
//! This crate validates an OpenID provider metadata document and checks it
//! against what the relying party needs (issuer, client authentication
//! method, assertion and ID-token encryption algorithms).
//!
//! HTTP fetching is handled by the caller (`sealedpass-client`).
//! This crate only validates and parses JSON.

mod error;
mod metadata;
mod types;

pub use error::DiscoveryError;
pub use metadata::{check_compatibility, validate_provider_metadata};
pub use types::{ProviderMetadata, ProviderRequirements};

/// Path of the provider metadata document relative to the issuer.
pub const WELL_KNOWN_PATH: &str = "/.well-known/openid-configuration";
