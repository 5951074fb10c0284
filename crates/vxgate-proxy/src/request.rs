//! The inbound gateway envelope.

use std::collections::HashMap;

use bytes::Bytes;
use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;

use crate::error::GatewayError;

/// What the shim sends to `/api-proxy`: the call it would have made.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyRequest {
    /// Full URL the caller meant to reach.
    #[serde(default)]
    pub original_url: Option<String>,
    /// HTTP method, `POST` when absent.
    #[serde(default)]
    pub method: Option<String>,
    /// Caller headers, merged under the gateway's own.
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,
    /// Request payload. Strings are sent verbatim, other values as JSON.
    #[serde(default)]
    pub body: Option<Value>,
}

impl ProxyRequest {
    pub fn parse(bytes: &[u8]) -> Result<Self, GatewayError> {
        serde_json::from_slice(bytes)
            .map_err(|e| GatewayError::BadRequest(format!("Invalid request body: {e}")))
    }

    /// The target URL, required and non-empty.
    pub fn target_url(&self) -> Result<&str, GatewayError> {
        self.original_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| GatewayError::BadRequest("originalUrl is required.".to_string()))
    }

    pub fn method(&self) -> Result<Method, GatewayError> {
        match self.method.as_deref().map(str::trim) {
            None | Some("") => Ok(Method::POST),
            Some(method) => Method::from_bytes(method.to_ascii_uppercase().as_bytes())
                .map_err(|_| GatewayError::BadRequest(format!("Invalid method '{method}'"))),
        }
    }

    /// The outbound payload, if any. Empty strings and `null` mean none.
    pub fn body_bytes(&self) -> Result<Option<Bytes>, GatewayError> {
        match &self.body {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(text)) if text.is_empty() => Ok(None),
            Some(Value::String(text)) => Ok(Some(Bytes::from(text.clone()))),
            Some(other) => serde_json::to_vec(other)
                .map(|json| Some(Bytes::from(json)))
                .map_err(|e| GatewayError::BadRequest(format!("Unserializable body: {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_envelope() {
        let req = ProxyRequest::parse(
            br#"{
                "originalUrl": "https://aiplatform.googleapis.com/v1/publishers/google/models/m:generateContent",
                "method": "post",
                "headers": {"x-goog-api-client": "genai-js"},
                "body": "{\"contents\":[]}"
            }"#,
        )
        .unwrap();

        assert!(req.target_url().unwrap().ends_with(":generateContent"));
        assert_eq!(req.method().unwrap(), Method::POST);
        assert_eq!(req.headers.as_ref().unwrap()["x-goog-api-client"], "genai-js");
        assert_eq!(
            req.body_bytes().unwrap().unwrap(),
            Bytes::from_static(br#"{"contents":[]}"#)
        );
    }

    #[test]
    fn test_defaults() {
        let req = ProxyRequest::parse(br#"{"originalUrl":"https://x"}"#).unwrap();
        assert_eq!(req.method().unwrap(), Method::POST);
        assert!(req.headers.is_none());
        assert!(req.body_bytes().unwrap().is_none());
    }

    #[test]
    fn test_missing_url_is_bad_request() {
        for json in [r"{}", r#"{"originalUrl":""}"#, r#"{"originalUrl":"  "}"#] {
            let req = ProxyRequest::parse(json.as_bytes()).unwrap();
            assert!(matches!(req.target_url(), Err(GatewayError::BadRequest(_))));
        }
    }

    #[test]
    fn test_invalid_json_is_bad_request() {
        assert!(matches!(
            ProxyRequest::parse(b"not json"),
            Err(GatewayError::BadRequest(_))
        ));
        assert!(matches!(
            ProxyRequest::parse(br#"{"headers":{"a":1}}"#),
            Err(GatewayError::BadRequest(_))
        ));
    }

    #[test]
    fn test_object_body_serialized() {
        let req = ProxyRequest {
            body: Some(serde_json::json!({"contents": [{"role": "user"}]})),
            ..ProxyRequest::default()
        };
        let bytes = req.body_bytes().unwrap().unwrap();
        let round: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(round["contents"][0]["role"], "user");
    }

    #[test]
    fn test_empty_and_null_body() {
        for body in [Value::Null, Value::String(String::new())] {
            let req = ProxyRequest {
                body: Some(body),
                ..ProxyRequest::default()
            };
            assert!(req.body_bytes().unwrap().is_none());
        }
    }

    #[test]
    fn test_method_parsing() {
        let req = ProxyRequest {
            method: Some("get".into()),
            ..ProxyRequest::default()
        };
        assert_eq!(req.method().unwrap(), Method::GET);

        let req = ProxyRequest {
            method: Some("BAD METHOD".into()),
            ..ProxyRequest::default()
        };
        assert!(req.method().is_err());
    }
}
