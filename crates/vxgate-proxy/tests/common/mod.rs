//! Shared fixtures: a fake Vertex AI upstream and static credentials.

#![allow(dead_code)]

use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use bytes::Bytes;
use futures_util::{StreamExt, stream};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use vxgate_core::routes::vertex_route_specs;
use vxgate_core::{
    AccessToken, CredentialFailure, CredentialProvider, CredentialSource, DeploymentContext,
    GatewayConfig, RouteRegistry,
};
use vxgate_proxy::{Gateway, PROXY_PATH};

pub const PROJECT: &str = "proj-1";
pub const REGION: &str = "us-central1";
pub const TOKEN: &str = "ya29.test-token";
pub const MARKER_HEADER: &str = "x-app-proxy";
pub const MARKER_VALUE: &str = "local-vertex-ai-app";

/// Credential source with a fixed outcome.
#[derive(Debug, Clone)]
pub struct StaticCredentials(pub Result<&'static str, CredentialFailure>);

impl StaticCredentials {
    pub fn ok() -> Self {
        Self(Ok(TOKEN))
    }

    pub fn failing(failure: CredentialFailure) -> Self {
        Self(Err(failure))
    }
}

#[async_trait]
impl CredentialSource for StaticCredentials {
    async fn token(&self) -> Result<AccessToken, CredentialFailure> {
        self.0
            .clone()
            .map(|secret| AccessToken::new(secret, Some(Duration::from_secs(3600))))
    }
}

/// One call as seen by the fake upstream.
#[derive(Debug, Clone)]
pub struct SeenCall {
    pub path: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[derive(Clone, Default)]
pub struct Upstream {
    pub calls: Arc<Mutex<Vec<SeenCall>>>,
}

impl Upstream {
    fn record(&self, path: String, headers: HeaderMap, body: Bytes) {
        self.calls.lock().unwrap().push(SeenCall {
            path,
            headers,
            body,
        });
    }

    pub fn last_call(&self) -> SeenCall {
        self.calls.lock().unwrap().last().cloned().unwrap()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

fn chunked(parts: Vec<&'static str>) -> Body {
    Body::from_stream(stream::iter(
        parts
            .into_iter()
            .map(|p| Ok::<_, Infallible>(Bytes::from_static(p.as_bytes()))),
    ))
}

async fn model_call(
    State(upstream): State<Upstream>,
    Path((version, model_method)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    upstream.record(
        format!("/{version}/projects/{PROJECT}/locations/{REGION}/publishers/google/models/{model_method}"),
        headers,
        body.clone(),
    );

    let (model, method) = model_method
        .split_once(':')
        .unwrap_or((model_method.as_str(), ""));
    match (model, method) {
        ("slow", "streamGenerateContent") => {
            let first = stream::iter([Ok::<_, Infallible>(Bytes::from_static(b"[{\"n\":1}"))]);
            Body::from_stream(first.chain(stream::pending())).into_response()
        }
        (_, "streamGenerateContent") => chunked(vec![
            r#"[{"candidates":[]}"#,
            r#",{"candidates":[{"text":"hi"}]}]"#,
        ])
        .into_response(),
        (_, "predict") => (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({"error": {"code": 429, "status": "RESOURCE_EXHAUSTED"}})),
        )
            .into_response(),
        _ => Json(json!({
            "candidates": [{"content": {"parts": [{"text": "hello"}]}}],
            "echo": String::from_utf8_lossy(&body),
        }))
        .into_response(),
    }
}

async fn engine_call(
    State(upstream): State<Upstream>,
    Path(params): Path<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let engine_method = params["engine_method"].clone();
    upstream.record(
        format!(
            "/{}/v1beta1/projects/{}/locations/{}/reasoningEngines/{}",
            params["endpoint_location"], params["project"], params["location"], engine_method
        ),
        headers,
        body,
    );

    if engine_method.ends_with(":streamQuery") {
        chunked(vec!["{\"output\":", "\"a\"}\n", "{\"output\":\"b\"}\n"]).into_response()
    } else {
        (StatusCode::OK, "<html>not json</html>").into_response()
    }
}

/// Start the fake upstream on an ephemeral port.
pub async fn spawn_upstream() -> (SocketAddr, Upstream) {
    let upstream = Upstream::default();
    let router = Router::new()
        .route(
            "/{version}/projects/proj-1/locations/us-central1/publishers/google/models/{model_method}",
            post(model_call),
        )
        .route(
            "/{endpoint_location}/v1beta1/projects/{project}/locations/{location}/reasoningEngines/{engine_method}",
            post(engine_call),
        )
        .with_state(upstream.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (addr, upstream)
}

/// The built-in routes, with endpoints pointed at the fake upstream.
pub fn registry_for(addr: SocketAddr) -> RouteRegistry {
    let specs: Vec<_> = vertex_route_specs()
        .into_iter()
        .map(|mut spec| {
            spec.endpoint = spec
                .endpoint
                .replace(
                    "https://{{endpoint_location}}-aiplatform.clients6.google.com",
                    &format!("http://{addr}/{{{{endpoint_location}}}}"),
                )
                .replace(
                    "https://aiplatform.clients6.google.com",
                    &format!("http://{addr}"),
                );
            spec
        })
        .collect();
    RouteRegistry::from_specs(&specs).unwrap()
}

pub fn config() -> GatewayConfig {
    GatewayConfig::new(DeploymentContext::new(PROJECT, REGION))
}

pub fn gateway_with(
    config: GatewayConfig,
    addr: SocketAddr,
    credentials: StaticCredentials,
) -> Gateway {
    Gateway::new(
        config,
        registry_for(addr),
        CredentialProvider::new(Arc::new(credentials)),
    )
    .unwrap()
}

pub fn gateway(addr: SocketAddr, credentials: StaticCredentials) -> Gateway {
    gateway_with(config(), addr, credentials)
}

/// A marked `POST /api-proxy` carrying `envelope`.
pub fn proxy_call(envelope: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(PROXY_PATH)
        .header("content-type", "application/json")
        .header(MARKER_HEADER, MARKER_VALUE)
        .body(Body::from(envelope.to_string()))
        .unwrap()
}

pub fn model_url(model: &str, method: &str) -> String {
    format!("https://aiplatform.googleapis.com/v1/publishers/google/models/{model}:{method}")
}

pub fn engine_url(method: &str) -> String {
    format!(
        "https://us-east1-aiplatform.googleapis.com/v1/projects/other-proj/locations/us-east1/reasoningEngines/42:{method}"
    )
}

pub async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}
