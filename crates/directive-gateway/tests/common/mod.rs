//! Shared fixtures: a recording stub transport and router helpers.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Request, Response};
use bytes::Bytes;
use directive_gateway::config::Config;
use directive_gateway::server::{AppState, build_app};
use directive_gateway::upstream::{
    ByteStream, OutboundRequest, Transport, UpstreamError, UpstreamReply,
};
use http_body_util::BodyExt;
use serde_json::Value;

pub const TEST_API_KEY: &str = "sk-test";
pub const TEST_DIRECTIVE: &str = "Respect everyone's pursuit of happiness.";

/// What the stub upstream does when called.
#[derive(Clone)]
pub enum Upstream {
    Json { status: u16, body: &'static str },
    Chunks(Vec<&'static str>),
    Unreachable,
}

/// One outbound call seen by the stub.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub path: String,
    pub api_key: String,
    pub body: Value,
    pub streaming: bool,
}

pub struct StubTransport {
    upstream: Upstream,
    calls: Mutex<Vec<RecordedCall>>,
}

impl StubTransport {
    pub fn new(upstream: Upstream) -> Arc<Self> {
        Arc::new(Self {
            upstream,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, request: &OutboundRequest, streaming: bool) {
        self.calls.lock().unwrap().push(RecordedCall {
            path: request.path.clone(),
            api_key: request.api_key.clone(),
            body: serde_json::from_slice(&request.body).unwrap(),
            streaming,
        });
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn post(&self, request: OutboundRequest) -> Result<UpstreamReply, UpstreamError> {
        self.record(&request, false);
        match &self.upstream {
            Upstream::Json { status, body } => Ok(UpstreamReply {
                status: *status,
                body: Bytes::from_static(body.as_bytes()),
            }),
            Upstream::Chunks(chunks) => Ok(UpstreamReply {
                status: 200,
                body: Bytes::from(chunks.concat()),
            }),
            Upstream::Unreachable => Err(UpstreamError::Transport("connection refused".into())),
        }
    }

    async fn post_stream(&self, request: OutboundRequest) -> Result<ByteStream, UpstreamError> {
        self.record(&request, true);
        match &self.upstream {
            Upstream::Chunks(chunks) => {
                let items: Vec<Result<Bytes, UpstreamError>> = chunks
                    .iter()
                    .map(|c| Ok(Bytes::from_static(c.as_bytes())))
                    .collect();
                Ok(Box::pin(futures::stream::iter(items)))
            }
            Upstream::Json { body, .. } => {
                let items: Vec<Result<Bytes, UpstreamError>> =
                    vec![Ok(Bytes::from_static(body.as_bytes()))];
                Ok(Box::pin(futures::stream::iter(items)))
            }
            Upstream::Unreachable => Err(UpstreamError::Transport("connection refused".into())),
        }
    }
}

pub fn test_config(api_key: Option<&str>) -> Config {
    let mut config = Config::default();
    config.upstream.api_key = api_key.map(str::to_string);
    config.directive = Some(TEST_DIRECTIVE.to_string());
    config
}

pub fn app(config: &Config, transport: Arc<StubTransport>) -> Router {
    let state = AppState::new(config, transport);
    build_app(state, &config.server)
}

pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
