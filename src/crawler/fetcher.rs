//! HTTP transport
//!
//! This module defines the boundary the crawl engine talks to for network I/O:
//! - The `Transport` trait: one request in, status/headers/body out
//! - A reqwest-backed implementation with per-proxy client caching
//! - Building HTTP clients from the `[http]` configuration
//!
//! Redirects are never followed here; the fetch state machine does that itself.

use crate::config::HttpConfig;
use crate::hooks::ProxyTarget;
use crate::TransportError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, CONTENT_TYPE, LOCATION, USER_AGENT};
use reqwest::{redirect::Policy, Client, Proxy};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use url::Url;

/// One outgoing request, after request hooks have been applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    /// The URL to fetch
    pub url: Url,

    /// User-Agent override from the agent hook
    pub user_agent: Option<String>,

    /// Host/port override from the proxy hook
    pub proxy: Option<ProxyTarget>,
}

/// Body of a response, read only when someone asks for it
pub enum ResponseBody {
    /// Body already in memory
    Buffered(Vec<u8>),

    /// Live response whose body is pulled chunk by chunk
    Streaming(reqwest::Response),
}

impl ResponseBody {
    /// Reads the whole body
    pub async fn read_all(self) -> Result<Vec<u8>, TransportError> {
        match self {
            Self::Buffered(bytes) => Ok(bytes),
            Self::Streaming(mut response) => {
                let mut body = Vec::new();
                while let Some(chunk) = response.chunk().await? {
                    body.extend_from_slice(&chunk);
                }
                Ok(body)
            }
        }
    }
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buffered(bytes) => write!(f, "Buffered({} bytes)", bytes.len()),
            Self::Streaming(_) => write!(f, "Streaming"),
        }
    }
}

/// Result of a request that reached a server
#[derive(Debug)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,

    /// Response headers
    pub headers: HeaderMap,

    /// URL the response was served for
    pub final_url: Url,

    /// Response body
    pub body: ResponseBody,
}

impl TransportResponse {
    /// Returns the raw `Content-Type` header, if present and valid text
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }

    /// Returns the raw `Location` header, if present and valid text
    pub fn location(&self) -> Option<&str> {
        self.headers.get(LOCATION).and_then(|v| v.to_str().ok())
    }
}

/// Performs one HTTP(S) request
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The HTTP configuration (default user agent, timeouts)
/// * `proxy` - Optional proxy every request of this client goes through
///
/// # Example
///
/// ```no_run
/// use webtrawl::config::HttpConfig;
/// use webtrawl::crawler::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default(), None).unwrap();
/// ```
pub fn build_http_client(
    config: &HttpConfig,
    proxy: Option<&ProxyTarget>,
) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .redirect(Policy::none()) // Handle redirects manually
        .gzip(true)
        .brotli(true);

    if let Some(target) = proxy {
        builder = builder.proxy(Proxy::all(target.to_url())?);
    }

    builder.build()
}

/// Transport backed by reqwest
pub struct ReqwestTransport {
    config: HttpConfig,
    client: Client,
    proxied: Mutex<HashMap<ProxyTarget, Client>>,
}

impl ReqwestTransport {
    /// Creates a transport from the `[http]` configuration
    pub fn new(config: &HttpConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config, None)?,
            config: config.clone(),
            proxied: Mutex::new(HashMap::new()),
        })
    }

    /// Returns the client for a proxy, building and caching it on first use
    fn client_for(&self, proxy: Option<&ProxyTarget>) -> Result<Client, TransportError> {
        let Some(target) = proxy else {
            return Ok(self.client.clone());
        };

        let mut proxied = self.proxied.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(client) = proxied.get(target) {
            return Ok(client.clone());
        }

        tracing::debug!("Building HTTP client for proxy {}", target);
        let client = build_http_client(&self.config, Some(target))
            .map_err(|e| TransportError::Request(format!("proxy {}: {}", target, e)))?;
        proxied.insert(target.clone(), client.clone());
        Ok(client)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let client = self.client_for(request.proxy.as_ref())?;

        let mut builder = client.get(request.url.clone());
        if let Some(agent) = &request.user_agent {
            builder = builder.header(USER_AGENT, agent.as_str());
        }

        let response = builder.send().await?;

        Ok(TransportResponse {
            status: response.status().as_u16(),
            headers: response.headers().clone(),
            final_url: response.url().clone(),
            body: ResponseBody::Streaming(response),
        })
    }
}
