//! Outbound header construction.

use std::collections::HashMap;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use tracing::debug;

use crate::error::GatewayError;

/// Header naming the project billed for the call.
pub const USER_PROJECT_HEADER: &str = "x-goog-user-project";

/// Headers that should NOT be forwarded (hop-by-hop headers).
const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailers",
    "transfer-encoding",
    "upgrade",
    // Also strip these for correctness
    "host",
    "content-length",
    // Upstream bodies are parsed, so they must arrive uncompressed
    "accept-encoding",
];

/// Check if a caller-supplied header should be forwarded.
pub fn should_forward_header(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    !HOP_BY_HOP_HEADERS.contains(&lower.as_str())
}

/// Build the outbound headers for one call.
///
/// Caller headers go in first; `authorization`, `x-goog-user-project` and
/// `content-type` from the gateway then replace any caller value.
pub fn merge_headers(
    caller: Option<&HashMap<String, String>>,
    token: &str,
    project_id: &str,
) -> Result<HeaderMap, GatewayError> {
    let mut headers = HeaderMap::new();

    for (name, value) in caller.into_iter().flatten() {
        if !should_forward_header(name) {
            continue;
        }
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => debug!(header = %name, "Dropping caller header that is not valid HTTP"),
        }
    }

    let mut bearer = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
        GatewayError::AuthProviderFailure("access token is not a valid header value".to_string())
    })?;
    bearer.set_sensitive(true);
    headers.insert(AUTHORIZATION, bearer);

    let project = HeaderValue::from_str(project_id).map_err(|_| {
        GatewayError::BadRequest(format!("project id '{project_id}' is not a valid header value"))
    })?;
    headers.insert(HeaderName::from_static(USER_PROJECT_HEADER), project);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    Ok(headers)
}
