//! Upstream relay.
//!
//! Forwards a rewritten request to the upstream API and hands the result back
//! to the caller in one of two modes:
//!
//! - **Buffered**: the whole upstream body is read, parsed as JSON and returned
//!   with the upstream's status code.
//! - **Streamed**: upstream chunks are forwarded as they arrive, byte for byte,
//!   through a bounded channel. Chunk boundaries and order are preserved and
//!   nothing is re-framed.
//!
//! Both modes refuse to open a connection when no API key is configured.

use std::convert::Infallible;
use std::sync::Arc;

use axum::Json;
use axum::body::Body;
use axum::http::StatusCode;
use axum::http::header::{CACHE_CONTROL, CONNECTION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures::StreamExt;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};

use crate::error::GatewayError;
use crate::upstream::{OutboundRequest, Transport, UpstreamError};

pub const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";
pub const COMPLETIONS_PATH: &str = "/v1/completions";

/// Chunks held between the upstream reader and the caller at most.
const STREAM_BUFFER: usize = 16;

/// Relays requests to the upstream API.
#[derive(Clone)]
pub struct Relay {
    transport: Arc<dyn Transport>,
    api_key: Option<Arc<str>>,
}

impl Relay {
    /// A blank `api_key` counts as missing.
    pub fn new(transport: Arc<dyn Transport>, api_key: Option<&str>) -> Self {
        let api_key = api_key
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(Arc::from);
        Self { transport, api_key }
    }

    /// Forward `body` and return the upstream's JSON response as-is.
    pub async fn forward<T>(&self, path: &str, body: &T) -> Result<RelayedJson, GatewayError>
    where
        T: Serialize + Sync,
    {
        let request = self.outbound(path, body)?;
        let reply = self.transport.post(request).await?;

        let body: Value = serde_json::from_slice(&reply.body).map_err(UpstreamError::Parse)?;
        let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::BAD_GATEWAY);
        if !status.is_success() {
            warn!(path, status = reply.status, "Upstream returned an error status");
        }
        Ok(RelayedJson { status, body })
    }

    /// Forward `body` and relay the upstream response chunk by chunk.
    ///
    /// Only the credential check can fail here. Connection failures after
    /// this point are reported in-band as a single `data: {"error": ...}`
    /// event before the stream closes.
    pub fn forward_stream<T>(&self, path: &str, body: &T) -> Result<EventStream, GatewayError>
    where
        T: Serialize,
    {
        let request = self.outbound(path, body)?;
        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        tokio::spawn(pump(Arc::clone(&self.transport), request, tx));
        Ok(EventStream { rx })
    }

    fn outbound<T>(&self, path: &str, body: &T) -> Result<OutboundRequest, GatewayError>
    where
        T: Serialize,
    {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(GatewayError::Configuration);
        };
        let body = serde_json::to_vec(body).map_err(UpstreamError::Encode)?;
        Ok(OutboundRequest {
            path: path.to_string(),
            api_key: api_key.to_string(),
            body: Bytes::from(body),
        })
    }
}

/// Buffered upstream response.
#[derive(Debug)]
pub struct RelayedJson {
    pub status: StatusCode,
    pub body: Value,
}

impl IntoResponse for RelayedJson {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Caller side of a streamed relay.
///
/// Dropping it (e.g. when the caller disconnects) makes the pump abandon the
/// upstream connection.
pub struct EventStream {
    rx: mpsc::Receiver<Bytes>,
}

impl EventStream {
    /// Next chunk, or `None` once the upstream stream has ended.
    pub async fn recv(&mut self) -> Option<Bytes> {
        self.rx.recv().await
    }
}

impl IntoResponse for EventStream {
    fn into_response(self) -> Response {
        let chunks = ReceiverStream::new(self.rx).map(Ok::<_, Infallible>);
        (
            [
                (CONTENT_TYPE, "text/event-stream"),
                (CACHE_CONTROL, "no-cache"),
                (CONNECTION, "keep-alive"),
            ],
            Body::from_stream(chunks),
        )
            .into_response()
    }
}

/// Copy upstream chunks into `tx` until the upstream ends, fails, or the
/// caller goes away. Returning drops the upstream stream and closes it.
async fn pump(transport: Arc<dyn Transport>, request: OutboundRequest, tx: mpsc::Sender<Bytes>) {
    let path = request.path.clone();

    let opened = tokio::select! {
        result = transport.post_stream(request) => result,
        () = tx.closed() => {
            debug!(path = %path, "Caller disconnected before upstream stream opened");
            return;
        }
    };

    let mut upstream = match opened {
        Ok(stream) => stream,
        Err(e) => {
            warn!(path = %path, error = %e, "Streaming error");
            let _ = tx.send(error_event(&e)).await;
            return;
        }
    };

    loop {
        let next = tokio::select! {
            chunk = upstream.next() => chunk,
            () = tx.closed() => {
                debug!(path = %path, "Caller disconnected, abandoning upstream stream");
                return;
            }
        };

        match next {
            Some(Ok(chunk)) => {
                if tx.send(chunk).await.is_err() {
                    debug!(path = %path, "Caller disconnected, abandoning upstream stream");
                    return;
                }
            }
            Some(Err(e)) => {
                warn!(path = %path, error = %e, "Streaming error");
                let _ = tx.send(error_event(&e)).await;
                return;
            }
            None => return,
        }
    }
}

fn error_event(error: &UpstreamError) -> Bytes {
    let payload = serde_json::json!({ "error": error.to_string() });
    Bytes::from(format!("data: {payload}\n\n"))
}
