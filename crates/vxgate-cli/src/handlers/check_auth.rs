//! `vxgate check-auth`: confirm the ambient identity yields a token.

use vxgate_auth::AdcConfig;
use vxgate_core::{AuthError, CredentialProvider};

use crate::bootstrap::credential_provider;
use crate::error::CliError;

pub async fn execute() -> Result<(), CliError> {
    let provider = credential_provider(AdcConfig::from_env())?;
    let summary = check(&provider).await?;
    println!("{summary}");
    Ok(())
}

/// Acquire one token and describe it without revealing it.
pub async fn check(provider: &CredentialProvider) -> Result<String, AuthError> {
    let token = provider.acquire().await?;
    Ok(format!(
        "Credentials OK: obtained an access token ({} chars)",
        token.len()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use vxgate_core::auth::NOT_LOGGED_IN_CODE;
    use vxgate_core::{AccessToken, CredentialFailure, CredentialSource};

    #[derive(Debug)]
    struct Fixed(Result<&'static str, CredentialFailure>);

    #[async_trait]
    impl CredentialSource for Fixed {
        async fn token(&self) -> Result<AccessToken, CredentialFailure> {
            self.0
                .clone()
                .map(|t| AccessToken::new(t, Some(Duration::from_secs(60))))
        }
    }

    #[tokio::test]
    async fn test_check_hides_token() {
        let provider = CredentialProvider::new(Arc::new(Fixed(Ok("ya29.secret"))));
        let summary = check(&provider).await.unwrap();
        assert!(!summary.contains("ya29"));
        assert!(summary.contains("11 chars"));
    }

    #[tokio::test]
    async fn test_check_reports_login_needed() {
        let provider = CredentialProvider::new(Arc::new(Fixed(Err(
            CredentialFailure::with_code(NOT_LOGGED_IN_CODE, "no credentials"),
        ))));
        let err = check(&provider).await.unwrap_err();
        assert!(err.is_not_authenticated());
        assert_eq!(CliError::from(err).exit_code(), 77);
    }
}
