//! Capability traits for request interceptors and event observers
//!
//! Each trait has one async method. Plain async closures implement them too,
//! so callers can register either a type or a closure:
//!
//! ```no_run
//! use webtrawl::hooks::HookRegistry;
//! use webtrawl::HookError;
//!
//! let mut hooks = HookRegistry::new();
//! hooks.use_agent(|| async { Ok::<_, HookError>("MyBot/1.0".to_string()) });
//! hooks.on_fetch(|url: String, body: String| async move {
//!     println!("{} ({} bytes)", url, body.len());
//!     Ok::<_, HookError>(())
//! });
//! ```

use crate::{CrawlError, HookError};
use async_trait::async_trait;
use std::fmt;
use std::future::Future;

/// Host and port an outgoing request is routed through
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProxyTarget {
    pub host: String,
    pub port: u16,
}

impl ProxyTarget {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Parses `host:port`
    pub fn parse(value: &str) -> Option<Self> {
        let (host, port) = value.rsplit_once(':')?;
        if host.is_empty() {
            return None;
        }
        Some(Self::new(host, port.parse().ok()?))
    }

    /// Proxy URL understood by the HTTP client
    pub fn to_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl fmt::Display for ProxyTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Supplies the User-Agent of the next outgoing request
#[async_trait]
pub trait UserAgentHook: Send + Sync {
    async fn user_agent(&self) -> Result<String, HookError>;
}

/// Supplies the proxy the next outgoing request is routed through
#[async_trait]
pub trait ProxyHook: Send + Sync {
    async fn proxy(&self) -> Result<ProxyTarget, HookError>;
}

/// Observes every successfully fetched HTML/XML page
#[async_trait]
pub trait FetchObserver: Send + Sync {
    async fn on_fetch(&self, url: &str, body: &str) -> Result<(), HookError>;
}

/// Observes errors raised while fetching a URL
#[async_trait]
pub trait ErrorObserver: Send + Sync {
    async fn on_error(&self, url: &str, error: &CrawlError) -> Result<(), HookError>;
}

#[async_trait]
impl<F, Fut> UserAgentHook for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<String, HookError>> + Send,
{
    async fn user_agent(&self) -> Result<String, HookError> {
        (self)().await
    }
}

#[async_trait]
impl<F, Fut> ProxyHook for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<ProxyTarget, HookError>> + Send,
{
    async fn proxy(&self) -> Result<ProxyTarget, HookError> {
        (self)().await
    }
}

#[async_trait]
impl<F, Fut> FetchObserver for F
where
    F: Fn(String, String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), HookError>> + Send,
{
    async fn on_fetch(&self, url: &str, body: &str) -> Result<(), HookError> {
        (self)(url.to_string(), body.to_string()).await
    }
}

/// Closures receive the error rendered as text
#[async_trait]
impl<F, Fut> ErrorObserver for F
where
    F: Fn(String, String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), HookError>> + Send,
{
    async fn on_error(&self, url: &str, error: &CrawlError) -> Result<(), HookError> {
        (self)(url.to_string(), error.to_string()).await
    }
}
