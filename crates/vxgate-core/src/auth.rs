//! Credential port and auth failure classification.
//!
//! The identity provider is opaque to the gateway: a [`CredentialSource`]
//! hands out bearer tokens or fails with a raw [`CredentialFailure`]. The
//! [`CredentialProvider`] turns those raw failures into the two classes the
//! gateway reports to callers.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

/// Error code used by identity libraries when no user is logged in.
pub const NOT_LOGGED_IN_CODE: &str = "ERR_GCLOUD_NOT_LOGGED_IN";

/// Message fragments that mean "no usable ambient identity".
///
/// Identity libraries do not always expose a typed error for the logged-out
/// case, so the message text is inspected as well.
const NOT_AUTHENTICATED_MARKERS: &[&str] = &[
    "Could not load the default credentials",
    "invalid_grant",
    "invalid_rapt",
];

/// A bearer token and its expiry.
#[derive(Clone)]
pub struct AccessToken {
    secret: String,
    expires_at: Option<Instant>,
}

impl AccessToken {
    /// Create a token that expires `lifetime` from now (`None` = unknown).
    pub fn new(secret: impl Into<String>, lifetime: Option<Duration>) -> Self {
        Self {
            secret: secret.into(),
            expires_at: lifetime.map(|d| Instant::now() + d),
        }
    }

    /// The raw bearer value.
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Returns true if the token is still valid `margin` from now.
    ///
    /// Tokens with unknown expiry are never considered fresh.
    #[must_use]
    pub fn is_fresh(&self, margin: Duration) -> bool {
        self.expires_at
            .is_some_and(|at| Instant::now() + margin < at)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("secret", &format_args!("<{} bytes>", self.secret.len()))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Raw failure reported by a credential source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CredentialFailure {
    /// Machine-readable code, when the source provides one.
    pub code: Option<String>,
    /// Human-readable message.
    pub message: String,
}

impl CredentialFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }
}

/// Source of bearer tokens for the ambient identity.
#[async_trait]
pub trait CredentialSource: Send + Sync + fmt::Debug {
    /// Return a usable token, from cache if the source keeps one.
    async fn token(&self) -> Result<AccessToken, CredentialFailure>;

    /// Fetch a new token regardless of any cached one.
    async fn refresh(&self) -> Result<AccessToken, CredentialFailure> {
        self.token().await
    }
}

/// Classified credential error, as seen by callers of the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No ambient identity configured or it is no longer valid.
    #[error("Authentication required: {0}")]
    NotAuthenticated(String),

    /// Any other failure while acquiring a token.
    #[error("Authentication failed: {0}")]
    ProviderFailure(String),
}

impl AuthError {
    /// Classify a raw failure by its code and message.
    #[must_use]
    pub fn classify(failure: CredentialFailure) -> Self {
        let by_code = failure.code.as_deref() == Some(NOT_LOGGED_IN_CODE);
        let by_message = NOT_AUTHENTICATED_MARKERS
            .iter()
            .any(|marker| failure.message.contains(marker));

        if by_code || by_message {
            Self::NotAuthenticated(failure.message)
        } else {
            Self::ProviderFailure(failure.message)
        }
    }

    /// Returns true for the "log in first" class.
    #[must_use]
    pub const fn is_not_authenticated(&self) -> bool {
        matches!(self, Self::NotAuthenticated(_))
    }
}

impl From<CredentialFailure> for AuthError {
    fn from(failure: CredentialFailure) -> Self {
        Self::classify(failure)
    }
}

/// Acquires bearer tokens for outbound calls.
#[derive(Debug, Clone)]
pub struct CredentialProvider {
    source: Arc<dyn CredentialSource>,
}

impl CredentialProvider {
    pub fn new(source: Arc<dyn CredentialSource>) -> Self {
        Self { source }
    }

    /// Obtain a bearer token for one gateway call.
    pub async fn acquire(&self) -> Result<String, AuthError> {
        match self.source.token().await {
            Ok(token) => Ok(token.secret().to_string()),
            Err(failure) => {
                warn!(code = ?failure.code, "Credential acquisition failed: {}", failure.message);
                Err(AuthError::classify(failure))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct FixedSource(Result<&'static str, CredentialFailure>);

    #[async_trait]
    impl CredentialSource for FixedSource {
        async fn token(&self) -> Result<AccessToken, CredentialFailure> {
            self.0
                .clone()
                .map(|s| AccessToken::new(s, Some(Duration::from_secs(3600))))
        }
    }

    #[test]
    fn test_classify_by_code() {
        let err = AuthError::classify(CredentialFailure::with_code(
            NOT_LOGGED_IN_CODE,
            "You are not logged in",
        ));
        assert!(err.is_not_authenticated());
    }

    #[test]
    fn test_classify_by_message() {
        let err = AuthError::classify(CredentialFailure::new(
            "Could not load the default credentials. Browse to https://cloud.google.com/docs",
        ));
        assert!(matches!(err, AuthError::NotAuthenticated(_)));
    }

    #[test]
    fn test_classify_other_failures() {
        let err = AuthError::classify(CredentialFailure::new("connection reset by peer"));
        assert!(matches!(err, AuthError::ProviderFailure(msg) if msg.contains("reset")));

        let err = AuthError::classify(CredentialFailure::with_code("EACCES", "permission denied"));
        assert!(!err.is_not_authenticated());
    }

    #[test]
    fn test_token_freshness() {
        let token = AccessToken::new("t", Some(Duration::from_secs(3600)));
        assert!(token.is_fresh(Duration::from_secs(60)));
        assert!(!token.is_fresh(Duration::from_secs(7200)));

        let unknown = AccessToken::new("t", None);
        assert!(!unknown.is_fresh(Duration::ZERO));
    }

    #[test]
    fn test_token_debug_redacts_secret() {
        let token = AccessToken::new("ya29.secret-value", None);
        let debug = format!("{token:?}");
        assert!(!debug.contains("secret-value"));
        assert!(debug.contains("17 bytes"));
    }

    #[tokio::test]
    async fn test_provider_acquire() {
        let provider = CredentialProvider::new(Arc::new(FixedSource(Ok("tok"))));
        assert_eq!(provider.acquire().await.unwrap(), "tok");
    }

    #[tokio::test]
    async fn test_provider_classifies_failures() {
        let provider = CredentialProvider::new(Arc::new(FixedSource(Err(
            CredentialFailure::with_code(NOT_LOGGED_IN_CODE, "not logged in"),
        ))));
        assert!(matches!(
            provider.acquire().await,
            Err(AuthError::NotAuthenticated(_))
        ));

        let provider = CredentialProvider::new(Arc::new(FixedSource(Err(
            CredentialFailure::new("token endpoint returned 503"),
        ))));
        assert!(matches!(
            provider.acquire().await,
            Err(AuthError::ProviderFailure(_))
        ));
    }
}
