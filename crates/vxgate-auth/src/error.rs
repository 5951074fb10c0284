//! Internal error types for credential discovery.
//!
//! These are mapped to the core [`CredentialFailure`] at the port boundary.

use std::path::PathBuf;

use thiserror::Error;
use vxgate_core::CredentialFailure;
use vxgate_core::auth::NOT_LOGGED_IN_CODE;

/// Errors acquiring a token from Application Default Credentials.
#[derive(Debug, Error)]
pub enum AdcError {
    /// No credentials file and no metadata server.
    #[error(
        "Could not load the default credentials. Run `gcloud auth application-default login` \
         or set GOOGLE_APPLICATION_CREDENTIALS."
    )]
    NotFound,

    /// A credentials file exists but could not be read.
    #[error("Unable to read credentials file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A credentials file is not a supported credentials document.
    #[error("Invalid credentials file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The service account private key is unusable.
    #[error("Invalid service account key: {0}")]
    InvalidKey(String),

    /// Transport failure talking to a token endpoint.
    #[error("Token request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// The token endpoint rejected the grant.
    #[error("Token endpoint returned {status}: {body}")]
    TokenEndpoint {
        /// HTTP status code
        status: u16,
        /// Response body, usually an OAuth error document
        body: String,
    },

    /// The metadata server answered with a non-success status.
    #[error("Metadata server returned {status}")]
    Metadata { status: u16 },
}

impl From<AdcError> for CredentialFailure {
    fn from(err: AdcError) -> Self {
        match err {
            AdcError::NotFound => Self::with_code(NOT_LOGGED_IN_CODE, err.to_string()),
            other => Self::new(other.to_string()),
        }
    }
}
