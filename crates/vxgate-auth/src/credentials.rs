//! Credentials file formats written by gcloud and the IAM console.

use std::path::Path;

use serde::Deserialize;

use crate::error::AdcError;

/// A parsed credentials file, dispatched on its `type` field.
#[derive(Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum CredentialsFile {
    AuthorizedUser(AuthorizedUser),
    ServiceAccount(ServiceAccountKey),
}

/// Output of `gcloud auth application-default login`.
#[derive(Clone, Deserialize)]
pub(crate) struct AuthorizedUser {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

/// A downloaded service account key.
#[derive(Clone, Deserialize)]
pub(crate) struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default)]
    pub token_uri: Option<String>,
}

impl CredentialsFile {
    pub(crate) async fn load(path: &Path) -> Result<Self, AdcError> {
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| AdcError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        Self::parse(&json).map_err(|source| AdcError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub(crate) fn parse(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub(crate) const fn kind(&self) -> &'static str {
        match self {
            Self::AuthorizedUser(_) => "authorized_user",
            Self::ServiceAccount(_) => "service_account",
        }
    }
}
