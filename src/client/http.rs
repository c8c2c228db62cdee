//! `reqwest`-backed [`ApiClient`] implementation.

use async_trait::async_trait;
use miette::Diagnostic;
use reqwest::{Method, StatusCode, Url};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use super::{ApiClient, FetchError};
use crate::config::LoaderConfig;
use crate::descriptor::{EndpointDescriptor, HttpMethod};

/// Errors raised while constructing an [`HttpClient`].
#[derive(Debug, Error, Diagnostic)]
pub enum ClientError {
    /// Neither the configuration nor the environment supplied a base URL.
    #[error("no base URL configured")]
    #[diagnostic(
        code(tributary::http::missing_base_url),
        help("Set LoaderConfig::new(base_url) or the TRIBUTARY_BASE_URL environment variable.")
    )]
    MissingBaseUrl,

    /// The configured base URL did not parse.
    #[error("invalid base URL {url:?}: {message}")]
    #[diagnostic(code(tributary::http::invalid_base_url))]
    InvalidBaseUrl { url: String, message: String },

    /// The underlying client could not be built.
    #[error("failed to build HTTP client")]
    #[diagnostic(code(tributary::http::build))]
    Build {
        #[source]
        source: reqwest::Error,
    },
}

/// Production [`ApiClient`] over a shared `reqwest::Client`.
///
/// Descriptor paths are resolved against the configured base URL; query
/// pairs and JSON bodies come straight from the descriptor. A per-request
/// timeout applies only when the configuration opted into one.
///
/// # Examples
///
/// ```rust,no_run
/// use tributary::client::HttpClient;
/// use tributary::config::LoaderConfig;
///
/// let client = HttpClient::from_config(&LoaderConfig::new("https://sentry.example.com"))?;
/// # Ok::<(), tributary::client::ClientError>(())
/// ```
#[derive(Clone, Debug)]
pub struct HttpClient {
    inner: reqwest::Client,
    base_url: Url,
    request_timeout: Option<std::time::Duration>,
}

impl HttpClient {
    /// Build a client from configuration.
    pub fn from_config(config: &LoaderConfig) -> Result<Self, ClientError> {
        let raw = config.base_url().ok_or(ClientError::MissingBaseUrl)?;
        let base_url = Url::parse(raw).map_err(|e| ClientError::InvalidBaseUrl {
            url: raw.to_string(),
            message: e.to_string(),
        })?;
        let inner = reqwest::Client::builder()
            .user_agent(config.user_agent())
            .build()
            .map_err(|source| ClientError::Build { source })?;
        Ok(Self {
            inner,
            base_url,
            request_timeout: config.request_timeout(),
        })
    }

    /// Shorthand for a default configuration with an explicit base URL.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::from_config(&LoaderConfig::new(base_url))
    }

    fn endpoint_url(&self, path: &str) -> Result<Url, FetchError> {
        let joined = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&joined).map_err(|e| FetchError::Transport {
            message: format!("invalid endpoint URL {joined:?}: {e}"),
        })
    }
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
    }
}

fn reason_phrase(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("HTTP error")
}

#[async_trait]
impl ApiClient for HttpClient {
    async fn fetch(&self, descriptor: &EndpointDescriptor) -> Result<Value, FetchError> {
        let url = self.endpoint_url(descriptor.path())?;
        debug!(%url, method = %descriptor.method(), state_key = descriptor.state_key(), "issuing request");

        let mut request = self
            .inner
            .request(to_reqwest_method(descriptor.method()), url);
        if !descriptor.query().is_empty() {
            request = request.query(descriptor.query());
        }
        if let Some(body) = descriptor.body() {
            request = request.json(body);
        }
        if let Some(timeout) = self.request_timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|e| FetchError::Transport {
            message: e.to_string(),
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| FetchError::Transport {
            message: e.to_string(),
        })?;

        if status.is_success() {
            if text.trim().is_empty() {
                return Ok(Value::Null);
            }
            return serde_json::from_str(&text).map_err(|source| FetchError::Decode { source });
        }

        // Error payloads are best-effort JSON; anything else becomes Null and
        // the reason phrase carries the message.
        let body: Value = serde_json::from_str(&text).unwrap_or(Value::Null);
        Err(FetchError::from_status(
            status.as_u16(),
            body,
            reason_phrase(status),
        ))
    }
}
