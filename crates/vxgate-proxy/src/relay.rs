//! Streaming relay from the upstream API to the caller.
//!
//! The upstream body is consumed by a spawned task that writes framed bytes
//! into a bounded channel; the caller's response body reads from the other
//! end. The body owns a cancellation guard, so when the caller disconnects
//! the task stops and drops the upstream stream instead of draining it.

use std::fmt::Display;

use axum::{
    body::Body,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use serde_json::Value;
use tokio::sync::{OwnedSemaphorePermit, mpsc};
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info_span, trace, warn};
use vxgate_core::{Accumulator, StreamError, StreamTransform};

use crate::error::GatewayError;

/// Framed chunks buffered between the relay task and the caller.
const RELAY_CHANNEL_CAPACITY: usize = 16;

type Frame = Result<Bytes, std::io::Error>;

/// Turns upstream chunks into caller bytes.
#[derive(Debug)]
pub(crate) enum Framer {
    /// Raw bytes, untouched.
    Passthrough,
    /// One `data:` event per JSON array element.
    JsonArray(Accumulator),
}

impl Framer {
    pub(crate) fn new(transform: StreamTransform, max_buffer_bytes: usize) -> Self {
        match transform {
            StreamTransform::Passthrough => Self::Passthrough,
            StreamTransform::JsonArray => Self::JsonArray(Accumulator::new(max_buffer_bytes)),
        }
    }

    fn push(&mut self, chunk: Bytes) -> Result<Vec<Bytes>, StreamError> {
        match self {
            Self::Passthrough => Ok(vec![chunk]),
            Self::JsonArray(acc) => Ok(acc.push(&chunk)?.iter().map(sse_event).collect()),
        }
    }

    fn finish(&mut self) -> Result<Vec<Bytes>, StreamError> {
        match self {
            Self::Passthrough => Ok(Vec::new()),
            Self::JsonArray(acc) => Ok(acc.finish()?.iter().map(sse_event).collect()),
        }
    }

    /// Text held back waiting for an element to complete.
    fn buffered_len(&self) -> usize {
        match self {
            Self::Passthrough => 0,
            Self::JsonArray(acc) => acc.buffered_len(),
        }
    }

    /// Best-effort error payload in this stream's framing.
    fn diagnostic(&self, err: &GatewayError) -> Bytes {
        let payload = err.stream_diagnostic();
        match self {
            Self::Passthrough => Bytes::from(payload.to_string()),
            Self::JsonArray(_) => Bytes::from(format!("event: error\ndata: {payload}\n\n")),
        }
    }
}

fn sse_event(record: &Value) -> Bytes {
    Bytes::from(format!("data: {record}\n\n"))
}

#[derive(Debug, Default, Clone, Copy)]
struct RelayStats {
    chunks: usize,
    frames: usize,
}

async fn send(tx: &mpsc::Sender<Frame>, bytes: Bytes) -> Result<(), GatewayError> {
    tx.send(Ok(bytes)).await.map_err(|_| GatewayError::RelayWrite)
}

/// Consume the upstream in order, writing framed output to `tx`.
async fn pump<S, E>(
    upstream: S,
    mut framer: Framer,
    tx: &mpsc::Sender<Frame>,
) -> Result<RelayStats, GatewayError>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Display,
{
    let mut upstream = std::pin::pin!(upstream);
    let mut stats = RelayStats::default();

    while let Some(chunk) = upstream.next().await {
        let outcome = match chunk {
            Ok(chunk) => {
                stats.chunks += 1;
                let len = chunk.len();
                let pushed = framer.push(chunk).map_err(GatewayError::from);
                trace!(chunk = len, buffered = framer.buffered_len(), "Upstream chunk");
                pushed
            }
            Err(e) => Err(GatewayError::Upstream(e.to_string())),
        };
        match outcome {
            Ok(frames) => {
                for frame in frames {
                    send(tx, frame).await?;
                    stats.frames += 1;
                }
            }
            Err(err) => {
                let _ = tx.send(Ok(framer.diagnostic(&err))).await;
                return Err(err);
            }
        }
    }

    match framer.finish() {
        Ok(frames) => {
            for frame in frames {
                send(tx, frame).await?;
                stats.frames += 1;
            }
            Ok(stats)
        }
        Err(err) => {
            let err = GatewayError::from(err);
            let _ = tx.send(Ok(framer.diagnostic(&err))).await;
            Err(err)
        }
    }
}

/// Spawn the relay task and return the caller-facing body.
///
/// `permit` is held until the task ends, however it ends.
pub(crate) fn spawn_relay<S, E>(
    upstream: S,
    framer: Framer,
    route: &str,
    permit: Option<OwnedSemaphorePermit>,
) -> Body
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    let (tx, rx) = mpsc::channel::<Frame>(RELAY_CHANNEL_CAPACITY);
    let cancel = CancellationToken::new();
    let task_cancel = cancel.clone();
    let span = info_span!("relay", route = %route);

    tokio::spawn(
        async move {
            let _permit = permit;
            let result = tokio::select! {
                () = task_cancel.cancelled() => Err(GatewayError::RelayWrite),
                result = pump(upstream, framer, &tx) => result,
            };
            match result {
                Ok(stats) => debug!(
                    phase = "done",
                    chunks = stats.chunks,
                    frames = stats.frames,
                    "Upstream stream finished"
                ),
                Err(GatewayError::RelayWrite) => {
                    debug!(phase = "failed", "Caller disconnected, upstream stream dropped");
                }
                Err(err) => warn!(phase = "failed", kind = err.error_type(), "Stream relay ended: {err}"),
            }
        }
        .instrument(span),
    );

    let guard = cancel.drop_guard();
    let frames = ReceiverStream::new(rx).map(move |frame| {
        let _ = &guard;
        frame
    });
    Body::from_stream(frames)
}

/// Response head for a streamed relay: upstream status, SSE headers.
pub(crate) fn stream_response(status: StatusCode, body: Body) -> Response {
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .header("x-accel-buffering", "no") // Disable nginx buffering
        .body(body)
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
