//! Transport abstraction between the relay and the network.

use std::fmt;
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

use super::error::UpstreamError;

/// Raw upstream response body, chunk by chunk, in arrival order.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, UpstreamError>> + Send>>;

/// A fully prepared POST to the upstream API.
pub struct OutboundRequest {
    /// Endpoint path, e.g. `/v1/chat/completions`.
    pub path: String,
    pub api_key: String,
    /// Serialized JSON payload.
    pub body: Bytes,
}

impl fmt::Debug for OutboundRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutboundRequest")
            .field("path", &self.path)
            .field("api_key", &"<redacted>")
            .field("body_len", &self.body.len())
            .finish()
    }
}

/// A buffered upstream response.
#[derive(Debug)]
pub struct UpstreamReply {
    pub status: u16,
    pub body: Bytes,
}

/// Opens outbound connections to the upstream API.
///
/// Every call is a single attempt. Implementations must release the
/// connection when the returned value (or stream) is dropped.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST and collect the whole response body.
    async fn post(&self, request: OutboundRequest) -> Result<UpstreamReply, UpstreamError>;

    /// POST and hand back the response body as it arrives.
    async fn post_stream(&self, request: OutboundRequest) -> Result<ByteStream, UpstreamError>;
}
