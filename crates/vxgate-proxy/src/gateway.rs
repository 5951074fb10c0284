//! The gateway request pipeline.
//!
//! One inbound call moves through `received → authorizing → forwarding →
//! relaying → done`, or exits to `failed` from any phase. Routing and auth
//! failures are reported before any response bytes are committed.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use reqwest::Client;
use serde::de::IgnoredAny;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, info, warn};
use vxgate_core::{CredentialProvider, GatewayConfig, RouteDescriptor, RouteRegistry};

use crate::error::{GatewayError, SetupError};
use crate::headers::merge_headers;
use crate::relay::{Framer, spawn_relay, stream_response};
use crate::request::ProxyRequest;

struct Inner {
    config: GatewayConfig,
    registry: RouteRegistry,
    credentials: CredentialProvider,
    client: Client,
    streams: Arc<Semaphore>,
}

/// Shared gateway state. Cheap to clone; everything inside is read-only
/// apart from the stream semaphore.
#[derive(Clone)]
pub struct Gateway {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("config", &self.inner.config)
            .field("routes", &self.inner.registry.len())
            .finish_non_exhaustive()
    }
}

impl Gateway {
    /// Validate `config` and build the gateway with its own HTTP client.
    pub fn new(
        config: GatewayConfig,
        registry: RouteRegistry,
        credentials: CredentialProvider,
    ) -> Result<Self, SetupError> {
        config.validate()?;
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(10)
            .build()?;
        let streams = Arc::new(Semaphore::new(config.max_concurrent_streams));
        Ok(Self {
            inner: Arc::new(Inner {
                config,
                registry,
                credentials,
                client,
                streams,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &GatewayConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn registry(&self) -> &RouteRegistry {
        &self.inner.registry
    }

    /// Streaming relays that can still start.
    #[must_use]
    pub fn available_streams(&self) -> usize {
        self.inner.streams.available_permits()
    }

    /// Run one gateway call from raw inbound headers and body.
    pub async fn handle(&self, headers: &HeaderMap, body: &[u8]) -> Result<Response, GatewayError> {
        let started = Instant::now();
        let config = &self.inner.config;

        // Received
        self.check_marker(headers)?;
        let request = ProxyRequest::parse(body)?;
        let url = request.target_url()?;
        let method = request.method()?;

        let Some(matched) = self.inner.registry.find(url) else {
            return Err(GatewayError::RouteNotFound(url.to_string()));
        };
        let route = matched.route;
        info!(phase = "received", route = %route.name(), %method, "Matched route");

        let permit = if route.is_streaming() {
            Some(self.acquire_stream()?)
        } else {
            None
        };

        // Authorizing
        debug!(phase = "authorizing", route = %route.name());
        let token = self.inner.credentials.acquire().await?;

        // Forwarding
        let upstream_url = route
            .resolve_endpoint(&config.deployment, &matched.params)
            .map_err(|e| GatewayError::Upstream(format!("Cannot resolve endpoint: {e}")))?;
        let outbound = merge_headers(
            request.headers.as_ref(),
            &token,
            &config.deployment.project_id,
        )?;
        debug!(phase = "forwarding", upstream = %upstream_url, "Forwarding to Vertex AI");

        let mut builder = self
            .inner
            .client
            .request(method, &upstream_url)
            .headers(outbound);
        if let Some(payload) = request.body_bytes()? {
            builder = builder.body(payload);
        }
        let upstream = builder.send().await.map_err(|e| {
            GatewayError::Upstream(format!("Failed to reach {upstream_url}: {e}"))
        })?;

        // Relaying
        let status = upstream.status();
        debug!(phase = "relaying", status = %status, streaming = route.is_streaming());
        let response = if route.is_streaming() {
            self.relay_stream(route, upstream, permit)
        } else {
            relay_json(upstream).await?
        };

        info!(
            phase = "done",
            route = %route.name(),
            status = %status,
            elapsed_ms = started.elapsed().as_millis(),
            "Gateway call relayed"
        );
        Ok(response)
    }

    pub(crate) fn check_marker(&self, headers: &HeaderMap) -> Result<(), GatewayError> {
        let marker = &self.inner.config.marker;
        let present = headers
            .get(marker.header.as_str())
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == marker.value);
        if present {
            Ok(())
        } else {
            Err(GatewayError::Forbidden {
                header: marker.header.clone(),
            })
        }
    }

    fn acquire_stream(&self) -> Result<OwnedSemaphorePermit, GatewayError> {
        Arc::clone(&self.inner.streams)
            .try_acquire_owned()
            .map_err(|_| GatewayError::TooManyStreams(self.inner.config.max_concurrent_streams))
    }

    fn relay_stream(
        &self,
        route: &RouteDescriptor,
        upstream: reqwest::Response,
        permit: Option<OwnedSemaphorePermit>,
    ) -> Response {
        let status = upstream.status();
        let framer = Framer::new(route.transform(), self.inner.config.max_buffer_bytes);
        let body = spawn_relay(upstream.bytes_stream(), framer, route.name(), permit);
        stream_response(status, body)
    }
}

/// Buffer a non-streaming reply and hand it back with the upstream status.
async fn relay_json(upstream: reqwest::Response) -> Result<Response, GatewayError> {
    let status = upstream.status();
    let bytes = upstream
        .bytes()
        .await
        .map_err(|e| GatewayError::Upstream(format!("Failed to read upstream response: {e}")))?;

    if let Err(e) = serde_json::from_slice::<IgnoredAny>(&bytes) {
        return Err(GatewayError::Upstream(format!(
            "Upstream returned {status} with a non-JSON body: {e}"
        )));
    }

    Ok(Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(bytes))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response()))
}

/// Marker check ahead of body extraction, so an unmarked call is refused
/// before the payload limit or anything else looks at it.
pub(crate) async fn require_marker(
    State(gateway): State<Gateway>,
    request: Request,
    next: Next,
) -> Response {
    if let Err(err) = gateway.check_marker(request.headers()) {
        warn!(phase = "failed", kind = err.error_type(), "{err}");
        return err.into_response();
    }
    next.run(request).await
}

/// `POST /api-proxy`
pub(crate) async fn proxy_request(
    State(gateway): State<Gateway>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    match gateway.handle(&headers, &body).await {
        Ok(response) => response,
        Err(err) => {
            warn!(phase = "failed", kind = err.error_type(), "{err}");
            err.into_response()
        }
    }
}
