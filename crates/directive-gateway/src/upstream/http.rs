//! reqwest-backed transport for OpenAI-compatible APIs.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;
use url::Url;

use super::error::UpstreamError;
use super::transport::{ByteStream, OutboundRequest, Transport, UpstreamReply};
use crate::config::UpstreamConfig;

/// Build the shared HTTP client for upstream calls.
pub fn build_client(config: &UpstreamConfig) -> Result<Client, UpstreamError> {
    Ok(Client::builder()
        .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
        .build()?)
}

/// Transport that reaches the upstream over HTTP(S).
pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    #[must_use]
    pub fn new(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    /// Full URL for an endpoint path. A path prefix on the base URL is kept.
    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    fn build_request(&self, request: OutboundRequest) -> reqwest::RequestBuilder {
        self.client
            .post(self.endpoint(&request.path))
            .header(CONTENT_TYPE, "application/json")
            .bearer_auth(&request.api_key)
            .body(request.body)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, request: OutboundRequest) -> Result<UpstreamReply, UpstreamError> {
        let response = self.build_request(request).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        debug!(status, bytes = body.len(), "Upstream response received");
        Ok(UpstreamReply { status, body })
    }

    async fn post_stream(&self, request: OutboundRequest) -> Result<ByteStream, UpstreamError> {
        let response = self.build_request(request).send().await?;
        debug!(status = response.status().as_u16(), "Upstream stream opened");
        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(UpstreamError::from));
        Ok(Box::pin(stream))
    }
}
