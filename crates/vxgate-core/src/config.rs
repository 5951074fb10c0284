//! Gateway configuration and validation.
//!
//! These are pure domain types. The composition root fills them from flags
//! and environment variables and hands them to the gateway; nothing below
//! the binary reads the environment.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Header the browser shim attaches to every redirected call.
pub const DEFAULT_MARKER_HEADER: &str = "x-app-proxy";

/// Expected value of the marker header.
pub const DEFAULT_MARKER_VALUE: &str = "local-vertex-ai-app";

/// Default cap on inbound gateway request bodies (7 MiB).
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 7 * 1024 * 1024;

/// Default number of streaming relays allowed in flight at once.
pub const DEFAULT_MAX_CONCURRENT_STREAMS: usize = 64;

/// Default cap on a single stream accumulator (16 MiB).
pub const DEFAULT_MAX_BUFFER_BYTES: usize = 16 * 1024 * 1024;

/// Default timeout for establishing upstream connections.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Fixed deployment identity used to build upstream URLs and headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentContext {
    /// Cloud project billed for the calls.
    pub project_id: String,
    /// Region (location) the calls are served from.
    pub region: String,
}

impl DeploymentContext {
    pub fn new(project_id: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            region: region.into(),
        }
    }
}

/// The identifying header the caller must present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyMarker {
    /// Header name (matched case-insensitively).
    pub header: String,
    /// Exact expected value.
    pub value: String,
}

impl Default for ProxyMarker {
    fn default() -> Self {
        Self {
            header: DEFAULT_MARKER_HEADER.to_string(),
            value: DEFAULT_MARKER_VALUE.to_string(),
        }
    }
}

/// Everything the gateway needs that does not change per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub deployment: DeploymentContext,
    pub marker: ProxyMarker,
    /// Maximum inbound body size in bytes.
    pub max_payload_bytes: usize,
    /// Maximum simultaneous streaming relays.
    pub max_concurrent_streams: usize,
    /// Maximum text held by one stream accumulator.
    pub max_buffer_bytes: usize,
    /// Upstream connect timeout.
    pub connect_timeout: Duration,
}

impl GatewayConfig {
    /// Create a config with default limits for the given deployment.
    #[must_use]
    pub fn new(deployment: DeploymentContext) -> Self {
        Self {
            deployment,
            marker: ProxyMarker::default(),
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            max_concurrent_streams: DEFAULT_MAX_CONCURRENT_STREAMS,
            max_buffer_bytes: DEFAULT_MAX_BUFFER_BYTES,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_marker(mut self, header: impl Into<String>, value: impl Into<String>) -> Self {
        self.marker = ProxyMarker {
            header: header.into(),
            value: value.into(),
        };
        self
    }

    #[must_use]
    pub const fn with_max_payload_bytes(mut self, bytes: usize) -> Self {
        self.max_payload_bytes = bytes;
        self
    }

    #[must_use]
    pub const fn with_max_concurrent_streams(mut self, streams: usize) -> Self {
        self.max_concurrent_streams = streams;
        self
    }

    #[must_use]
    pub const fn with_max_buffer_bytes(mut self, bytes: usize) -> Self {
        self.max_buffer_bytes = bytes;
        self
    }

    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Check the configuration is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.deployment.project_id.trim().is_empty() {
            return Err(ConfigError::MissingProjectId);
        }
        if self.deployment.region.trim().is_empty() {
            return Err(ConfigError::MissingRegion);
        }
        let header = &self.marker.header;
        if header.is_empty()
            || !header
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ConfigError::InvalidMarkerHeader(header.clone()));
        }
        if self.marker.value.is_empty() {
            return Err(ConfigError::EmptyMarkerValue);
        }
        if self.max_payload_bytes == 0 {
            return Err(ConfigError::ZeroLimit("max_payload_bytes"));
        }
        if self.max_concurrent_streams == 0 {
            return Err(ConfigError::ZeroLimit("max_concurrent_streams"));
        }
        if self.max_buffer_bytes == 0 {
            return Err(ConfigError::ZeroLimit("max_buffer_bytes"));
        }
        Ok(())
    }
}

/// Configuration validation error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Project id is required (set GOOGLE_CLOUD_PROJECT)")]
    MissingProjectId,

    #[error("Region is required (set GOOGLE_CLOUD_LOCATION)")]
    MissingRegion,

    #[error("Invalid marker header name '{0}'")]
    InvalidMarkerHeader(String),

    #[error("Marker header value cannot be empty")]
    EmptyMarkerValue,

    #[error("{0} must be greater than zero")]
    ZeroLimit(&'static str),

    #[error("Invalid byte size '{0}' (expected e.g. 7mb, 512kb, 1048576)")]
    InvalidByteSize(String),
}

/// Parse a human byte size such as `7mb`, `512KB`, `1g` or `1048576`.
///
/// Units are powers of 1024.
pub fn parse_byte_size(input: &str) -> Result<usize, ConfigError> {
    let invalid = || ConfigError::InvalidByteSize(input.to_string());
    let lower = input.trim().to_ascii_lowercase();
    let split = lower
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(lower.len());
    let (digits, unit) = lower.split_at(split);

    let value: usize = digits.parse().map_err(|_| invalid())?;
    let multiplier: usize = match unit.trim() {
        "" | "b" => 1,
        "k" | "kb" => 1024,
        "m" | "mb" => 1024 * 1024,
        "g" | "gb" => 1024 * 1024 * 1024,
        _ => return Err(invalid()),
    };
    value.checked_mul(multiplier).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GatewayConfig {
        GatewayConfig::new(DeploymentContext::new("my-project", "us-central1"))
    }

    #[test]
    fn test_defaults() {
        let config = config();
        assert_eq!(config.marker.header, "x-app-proxy");
        assert_eq!(config.marker.value, "local-vertex-ai-app");
        assert_eq!(config.max_payload_bytes, 7 * 1024 * 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = config()
            .with_marker("x-other", "v")
            .with_max_payload_bytes(10)
            .with_max_concurrent_streams(2)
            .with_max_buffer_bytes(1024)
            .with_connect_timeout(Duration::from_secs(1));

        assert_eq!(config.marker.header, "x-other");
        assert_eq!(config.max_payload_bytes, 10);
        assert_eq!(config.max_concurrent_streams, 2);
        assert_eq!(config.max_buffer_bytes, 1024);
        assert_eq!(config.connect_timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_validate_missing_deployment() {
        let config = GatewayConfig::new(DeploymentContext::new("", "us-central1"));
        assert_eq!(config.validate(), Err(ConfigError::MissingProjectId));

        let config = GatewayConfig::new(DeploymentContext::new("p", "  "));
        assert_eq!(config.validate(), Err(ConfigError::MissingRegion));
    }

    #[test]
    fn test_validate_marker_and_limits() {
        assert!(matches!(
            config().with_marker("bad header", "v").validate(),
            Err(ConfigError::InvalidMarkerHeader(_))
        ));
        assert_eq!(
            config().with_marker("x-a", "").validate(),
            Err(ConfigError::EmptyMarkerValue)
        );
        assert_eq!(
            config().with_max_concurrent_streams(0).validate(),
            Err(ConfigError::ZeroLimit("max_concurrent_streams"))
        );
    }

    #[test]
    fn test_parse_byte_size() {
        assert_eq!(parse_byte_size("7mb").unwrap(), 7 * 1024 * 1024);
        assert_eq!(parse_byte_size("512KB").unwrap(), 512 * 1024);
        assert_eq!(parse_byte_size("1g").unwrap(), 1024 * 1024 * 1024);
        assert_eq!(parse_byte_size("1048576").unwrap(), 1_048_576);
        assert_eq!(parse_byte_size(" 100 b ").unwrap(), 100);
    }

    #[test]
    fn test_parse_byte_size_rejects_garbage() {
        assert!(parse_byte_size("").is_err());
        assert!(parse_byte_size("mb").is_err());
        assert!(parse_byte_size("7tb").is_err());
        assert!(parse_byte_size("-1").is_err());
    }
}
