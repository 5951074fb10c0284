//! Configuration for credential discovery.

use std::path::PathBuf;
use std::time::Duration;

/// OAuth scope granting access to Vertex AI.
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Google's OAuth token endpoint.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Host of the GCE metadata server.
pub const DEFAULT_METADATA_HOST: &str = "metadata.google.internal";

/// Env var naming an explicit credentials file.
pub const CREDENTIALS_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS";

/// Env var overriding the metadata server host.
pub const METADATA_HOST_ENV: &str = "GCE_METADATA_HOST";

const CLOUDSDK_CONFIG_ENV: &str = "CLOUDSDK_CONFIG";
const WELL_KNOWN_FILE: &str = "application_default_credentials.json";

/// Where gcloud writes application default credentials.
#[must_use]
pub fn default_well_known_path() -> Option<PathBuf> {
    #[cfg(windows)]
    {
        dirs::config_dir().map(|dir| dir.join("gcloud").join(WELL_KNOWN_FILE))
    }
    #[cfg(not(windows))]
    {
        dirs::home_dir().map(|dir| dir.join(".config").join("gcloud").join(WELL_KNOWN_FILE))
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Credential discovery settings.
///
/// # Example
///
/// ```
/// use vxgate_auth::AdcConfig;
/// use std::time::Duration;
///
/// let config = AdcConfig::new()
///     .with_credentials_path("/etc/vxgate/sa.json")
///     .without_metadata_server()
///     .with_timeout(Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct AdcConfig {
    /// Explicit credentials file; when set, no other location is tried.
    pub(crate) credentials_path: Option<PathBuf>,
    /// gcloud well-known file, used only if it exists.
    pub(crate) well_known_path: Option<PathBuf>,
    /// Metadata server host (`host[:port]`), `None` to skip it.
    pub(crate) metadata_host: Option<String>,
    /// Overrides the token endpoint for every credential type.
    pub(crate) token_uri: Option<String>,
    pub(crate) scopes: Vec<String>,
    /// Timeout for token endpoint calls.
    pub(crate) timeout: Duration,
    /// Timeout for the metadata server, kept short so laptops fail fast.
    pub(crate) metadata_timeout: Duration,
}

impl Default for AdcConfig {
    fn default() -> Self {
        Self {
            credentials_path: None,
            well_known_path: default_well_known_path(),
            metadata_host: Some(DEFAULT_METADATA_HOST.to_string()),
            token_uri: None,
            scopes: vec![CLOUD_PLATFORM_SCOPE.to_string()],
            timeout: Duration::from_secs(30),
            metadata_timeout: Duration::from_secs(3),
        }
    }
}

impl AdcConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overlaid with `GOOGLE_APPLICATION_CREDENTIALS`,
    /// `CLOUDSDK_CONFIG` and `GCE_METADATA_HOST`.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(path) = env_non_empty(CREDENTIALS_ENV) {
            config.credentials_path = Some(PathBuf::from(path));
        }
        if let Some(dir) = env_non_empty(CLOUDSDK_CONFIG_ENV) {
            config.well_known_path = Some(PathBuf::from(dir).join(WELL_KNOWN_FILE));
        }
        if let Some(host) = env_non_empty(METADATA_HOST_ENV) {
            config.metadata_host = Some(host);
        }
        config
    }

    #[must_use]
    pub fn with_credentials_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_well_known_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.well_known_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn without_well_known_path(mut self) -> Self {
        self.well_known_path = None;
        self
    }

    #[must_use]
    pub fn with_metadata_host(mut self, host: impl Into<String>) -> Self {
        self.metadata_host = Some(host.into());
        self
    }

    #[must_use]
    pub fn without_metadata_server(mut self) -> Self {
        self.metadata_host = None;
        self
    }

    #[must_use]
    pub fn with_token_uri(mut self, uri: impl Into<String>) -> Self {
        self.token_uri = Some(uri.into());
        self
    }

    #[must_use]
    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_metadata_timeout(mut self, timeout: Duration) -> Self {
        self.metadata_timeout = timeout;
        self
    }

    /// The explicit credentials file, if any.
    #[must_use]
    pub fn credentials_path(&self) -> Option<&std::path::Path> {
        self.credentials_path.as_deref()
    }

    #[must_use]
    pub fn well_known_path(&self) -> Option<&std::path::Path> {
        self.well_known_path.as_deref()
    }

    #[must_use]
    pub fn metadata_host(&self) -> Option<&str> {
        self.metadata_host.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AdcConfig::new();
        assert!(config.credentials_path().is_none());
        assert_eq!(config.metadata_host(), Some(DEFAULT_METADATA_HOST));
        assert_eq!(config.scopes, vec![CLOUD_PLATFORM_SCOPE.to_string()]);
        assert!(config.token_uri.is_none());
    }

    #[test]
    fn test_builder_overrides() {
        let config = AdcConfig::new()
            .with_credentials_path("/tmp/sa.json")
            .without_well_known_path()
            .without_metadata_server()
            .with_token_uri("http://127.0.0.1:1/token")
            .with_scopes(["a", "b"])
            .with_metadata_timeout(Duration::from_millis(100));

        assert_eq!(
            config.credentials_path(),
            Some(std::path::Path::new("/tmp/sa.json"))
        );
        assert!(config.well_known_path().is_none());
        assert!(config.metadata_host().is_none());
        assert_eq!(config.token_uri.as_deref(), Some("http://127.0.0.1:1/token"));
        assert_eq!(config.scopes, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(config.metadata_timeout, Duration::from_millis(100));
    }

    #[cfg(not(windows))]
    #[test]
    fn test_well_known_path_under_gcloud_config() {
        if let Some(path) = default_well_known_path() {
            assert!(path.ends_with(".config/gcloud/application_default_credentials.json"));
        }
    }
}
