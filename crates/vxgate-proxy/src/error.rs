//! Gateway error types and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use vxgate_core::{AuthError, ConfigError, StreamError};

/// Instruction shown when no ambient identity is available.
const LOGIN_HINT: &str = "Google Cloud Application Default Credentials not found or invalid. \
     Please run \"gcloud auth application-default login\" and try again.";

/// Failure of one gateway request.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Marker header missing or wrong.
    #[error("Forbidden: request must originate from the local Vertex AI shim ({header} header)")]
    Forbidden { header: String },

    /// Malformed envelope or missing target URL.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// No route matches the target URL.
    #[error("No proxy handler found for URL: {0}")]
    RouteNotFound(String),

    /// No ambient identity, or it has expired.
    #[error("Authentication Required")]
    NotAuthenticated(String),

    /// Any other credential failure.
    #[error("Authentication failed: {0}")]
    AuthProviderFailure(String),

    /// Network or protocol failure talking to the upstream API.
    #[error("Upstream request failed: {0}")]
    Upstream(String),

    /// The streamed upstream body could not be re-framed.
    #[error("{0}")]
    StreamParse(#[from] StreamError),

    /// The streaming relay limit is reached.
    #[error("Too many concurrent streams (limit {0})")]
    TooManyStreams(usize),

    /// The caller went away mid-stream.
    #[error("Caller connection closed during relay")]
    RelayWrite,
}

impl GatewayError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::RouteNotFound(_) => StatusCode::NOT_FOUND,
            Self::NotAuthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::AuthProviderFailure(_) | Self::RelayWrite => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Upstream(_) | Self::StreamParse(_) => StatusCode::BAD_GATEWAY,
            Self::TooManyStreams(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Stable discriminant for client-side handling.
    #[must_use]
    pub const fn error_type(&self) -> &'static str {
        match self {
            Self::Forbidden { .. } => "forbidden",
            Self::BadRequest(_) => "bad_request",
            Self::RouteNotFound(_) => "route_not_found",
            Self::NotAuthenticated(_) => "not_authenticated",
            Self::AuthProviderFailure(_) => "auth_provider_failure",
            Self::Upstream(_) => "upstream_error",
            Self::StreamParse(_) => "stream_parse_error",
            Self::TooManyStreams(_) => "too_many_streams",
            Self::RelayWrite => "relay_write_error",
        }
    }

    /// Payload written in-band when a stream fails after headers are sent.
    #[must_use]
    pub fn stream_diagnostic(&self) -> serde_json::Value {
        json!({
            "proxyError": "Stream error from Vertex AI",
            "details": self.to_string(),
            "type": self.error_type(),
        })
    }
}

impl From<AuthError> for GatewayError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::NotAuthenticated(detail) => Self::NotAuthenticated(detail),
            AuthError::ProviderFailure(detail) => Self::AuthProviderFailure(detail),
        }
    }
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    status: u16,
    /// Stable error type discriminant for client-side handling
    #[serde(rename = "type")]
    error_type: &'static str,
    /// Operator guidance, when there is something to do
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = matches!(self, Self::NotAuthenticated(_)).then_some(LOGIN_HINT);
        let mut response = (
            status,
            axum::Json(ErrorBody {
                error: self.to_string(),
                status: status.as_u16(),
                error_type: self.error_type(),
                message,
            }),
        )
            .into_response();

        if let Self::TooManyStreams(_) = self
            && let Ok(value) = "1".parse()
        {
            response.headers_mut().insert("retry-after", value);
        }
        response
    }
}

/// Errors constructing a [`Gateway`](crate::Gateway).
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("Invalid gateway configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}
