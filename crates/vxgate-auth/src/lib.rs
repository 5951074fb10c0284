#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

mod cache;
mod config;
mod credentials;
mod error;
mod jwt;
mod source;

// ============================================================================
// Public API
// ============================================================================

pub use cache::{CachedCredentialSource, DEFAULT_REFRESH_MARGIN};
pub use config::{
    AdcConfig, CLOUD_PLATFORM_SCOPE, CREDENTIALS_ENV, DEFAULT_METADATA_HOST, DEFAULT_TOKEN_URI,
    METADATA_HOST_ENV, default_well_known_path,
};
pub use error::AdcError;
pub use source::AdcCredentialSource;

// Silence unused dev-dependency warnings
#[cfg(test)]
use axum as _;
#[cfg(test)]
use tempfile as _;
