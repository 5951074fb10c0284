#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod endpoint;
pub mod pattern;
pub mod routes;
pub mod stream;

// Re-export commonly used types for convenience
pub use auth::{AccessToken, AuthError, CredentialFailure, CredentialProvider, CredentialSource};
pub use config::{
    ConfigError, DEFAULT_MAX_BUFFER_BYTES, DEFAULT_MAX_CONCURRENT_STREAMS,
    DEFAULT_MAX_PAYLOAD_BYTES, DeploymentContext, GatewayConfig, ProxyMarker, parse_byte_size,
};
pub use endpoint::EndpointTemplate;
pub use pattern::{CompiledPattern, ExtractedParams, PatternError};
pub use routes::{
    RegistryError, RouteDescriptor, RouteMatch, RouteRegistry, RouteSpec, strip_query,
};
pub use stream::{
    Accumulator, StreamError, StreamTransform, TransformOutcome, Utf8StreamDecoder,
    reframe_json_array,
};

// Silence unused dev-dependency warnings
#[cfg(test)]
use tempfile as _;
#[cfg(test)]
use tokio as _;
