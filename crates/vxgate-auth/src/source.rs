//! Application Default Credentials as a [`CredentialSource`].

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use vxgate_core::{AccessToken, CredentialFailure, CredentialSource};

use crate::config::{AdcConfig, DEFAULT_TOKEN_URI};
use crate::credentials::{AuthorizedUser, CredentialsFile, ServiceAccountKey};
use crate::error::AdcError;
use crate::jwt::{JWT_BEARER_GRANT, sign_assertion};

const METADATA_TOKEN_PATH: &str = "/computeMetadata/v1/instance/service-accounts/default/token";

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

impl TokenResponse {
    fn into_access_token(self) -> AccessToken {
        AccessToken::new(self.access_token, self.expires_in.map(Duration::from_secs))
    }
}

/// Discovers the ambient Google identity and exchanges it for access tokens.
///
/// Every call performs a fresh exchange; wrap in
/// [`CachedCredentialSource`](crate::CachedCredentialSource) for reuse.
#[derive(Debug, Clone)]
pub struct AdcCredentialSource {
    config: AdcConfig,
    client: reqwest::Client,
}

impl AdcCredentialSource {
    pub fn new(config: AdcConfig) -> Result<Self, AdcError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("vxgate-auth/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { config, client })
    }

    /// Source configured from the process environment.
    pub fn from_env() -> Result<Self, AdcError> {
        Self::new(AdcConfig::from_env())
    }

    #[must_use]
    pub const fn config(&self) -> &AdcConfig {
        &self.config
    }

    async fn fetch(&self) -> Result<AccessToken, AdcError> {
        if let Some(path) = &self.config.credentials_path {
            let creds = CredentialsFile::load(path).await?;
            debug!(path = %path.display(), kind = creds.kind(), "Using explicit credentials file");
            return self.exchange(creds).await;
        }

        if let Some(path) = self.config.well_known_path.as_deref().filter(|p| p.is_file()) {
            let creds = CredentialsFile::load(path).await?;
            debug!(path = %path.display(), kind = creds.kind(), "Using gcloud application default credentials");
            return self.exchange(creds).await;
        }

        if let Some(host) = &self.config.metadata_host {
            return self.metadata_token(host).await;
        }

        Err(AdcError::NotFound)
    }

    async fn exchange(&self, creds: CredentialsFile) -> Result<AccessToken, AdcError> {
        match creds {
            CredentialsFile::AuthorizedUser(user) => self.refresh_user(&user).await,
            CredentialsFile::ServiceAccount(key) => self.assert_service_account(&key).await,
        }
    }

    async fn refresh_user(&self, user: &AuthorizedUser) -> Result<AccessToken, AdcError> {
        let uri = self.config.token_uri.as_deref().unwrap_or(DEFAULT_TOKEN_URI);
        let form = [
            ("client_id", user.client_id.as_str()),
            ("client_secret", user.client_secret.as_str()),
            ("refresh_token", user.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];
        self.post_token(uri, &form).await
    }

    async fn assert_service_account(&self, key: &ServiceAccountKey) -> Result<AccessToken, AdcError> {
        let uri = self
            .config
            .token_uri
            .as_deref()
            .or(key.token_uri.as_deref())
            .unwrap_or(DEFAULT_TOKEN_URI);
        let assertion = sign_assertion(
            key,
            &self.config.scopes,
            uri,
            chrono::Utc::now().timestamp(),
        )?;
        let form = [("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())];
        self.post_token(uri, &form).await
    }

    async fn post_token(&self, uri: &str, form: &[(&str, &str)]) -> Result<AccessToken, AdcError> {
        let response = self.client.post(uri).form(form).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdcError::TokenEndpoint {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = response.json().await?;
        debug!(expires_in = ?token.expires_in, "Token exchange succeeded");
        Ok(token.into_access_token())
    }

    async fn metadata_token(&self, host: &str) -> Result<AccessToken, AdcError> {
        let url = format!("http://{host}{METADATA_TOKEN_PATH}");
        let result = self
            .client
            .get(&url)
            .header("Metadata-Flavor", "Google")
            .query(&[("scopes", self.config.scopes.join(","))])
            .timeout(self.config.metadata_timeout)
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(e) if e.is_connect() || e.is_timeout() => {
                debug!(host, "Metadata server unreachable: {e}");
                return Err(AdcError::NotFound);
            }
            Err(e) => return Err(e.into()),
        };

        let status = response.status();
        if !status.is_success() {
            return Err(AdcError::Metadata {
                status: status.as_u16(),
            });
        }
        let token: TokenResponse = response.json().await?;
        debug!(host, "Using metadata server credentials");
        Ok(token.into_access_token())
    }
}

#[async_trait]
impl CredentialSource for AdcCredentialSource {
    async fn token(&self) -> Result<AccessToken, CredentialFailure> {
        self.fetch().await.map_err(Into::into)
    }
}
