use std::fmt;
use std::io::ErrorKind;
use std::path::Path;

use tokio::fs;

use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::directive::Directive;

/// Config file read when no `--config` is given.
pub const DEFAULT_CONFIG_PATH: &str = "gateway.yaml";

/// Environment variables that override the config file.
pub const ENV_PORT: &str = "GATEWAY_PORT";
pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_BASE_URL: &str = "OPENAI_BASE_URL";
pub const ENV_DEFAULT_MODEL: &str = "DEFAULT_MODEL";
pub const ENV_DIRECTIVE: &str = "CORE_DIRECTIVE";

// ============================================================================
// Config (root)
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// Directive text. Blank or missing uses the built-in default.
    #[serde(default)]
    pub directive: Option<String>,
}

impl Config {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(ConfigError::Io(e)),
        };
        Ok(serde_saphyr::from_str(&contents)?)
    }

    /// Override values from the environment.
    ///
    /// `lookup` is usually `|key| std::env::var(key).ok()`; tests pass a map.
    /// Unset and blank variables leave the current value in place.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(port) = lookup(ENV_PORT) {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort(port))?;
        }
        if let Some(key) = lookup(ENV_API_KEY) {
            self.upstream.api_key = Some(key);
        }
        if let Some(base_url) = lookup(ENV_BASE_URL) {
            self.upstream.base_url = base_url;
        }
        if let Some(model) = lookup(ENV_DEFAULT_MODEL) {
            self.upstream.default_model = model;
        }
        if let Some(directive) = lookup(ENV_DIRECTIVE) {
            self.directive = Some(directive);
        }
        Ok(())
    }

    pub fn directive(&self) -> Directive {
        self.directive
            .as_deref()
            .map(Directive::new)
            .unwrap_or_default()
    }
}

// ============================================================================
// ServerConfig
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_seconds: default_request_timeout(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_request_timeout() -> u64 {
    300
}

fn default_max_body_bytes() -> usize {
    10 * 1024 * 1024
}

// ============================================================================
// UpstreamConfig
// ============================================================================

#[derive(Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Missing key is not a startup error; completion requests fail instead.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub default_model: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
}

impl UpstreamConfig {
    /// The API key, treating a blank value as unset.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let invalid = || ConfigError::InvalidBaseUrl(self.base_url.clone());
        let url = Url::parse(&self.base_url).map_err(|_| invalid())?;
        if !matches!(url.scheme(), "http" | "https") || url.host().is_none() {
            return Err(invalid());
        }
        Ok(url)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            default_model: default_model(),
            connect_timeout_seconds: default_connect_timeout(),
        }
    }
}

impl fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key().map(|_| "<redacted>"))
            .field("default_model", &self.default_model)
            .field("connect_timeout_seconds", &self.connect_timeout_seconds)
            .finish()
    }
}

fn default_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_model() -> String {
    "gpt-4".to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

// ============================================================================
// ConfigError
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_saphyr::Error),

    #[error("invalid port: {0:?}")]
    InvalidPort(String),

    #[error("invalid upstream base url: {0:?}")]
    InvalidBaseUrl(String),
}

// ============================================================================
// Tests
// ============================================================================
