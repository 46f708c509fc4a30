//! Webtrawl: a bounded-concurrency web crawler
//!
//! This crate crawls outward from a set of root URLs, staying inside the hosts
//! those roots name. It follows redirects, retries transient transport failures,
//! extracts links from HTML/XML pages and hands fetched content to caller-supplied
//! hooks.

pub mod config;
pub mod crawler;
pub mod hooks;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Webtrawl operations
///
/// This is also the value handed to the error observer, so every variant that
/// can happen during a fetch carries the URL it concerns.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transport error for {url}: {source}")]
    Transport { url: String, source: TransportError },

    #[error("Hook failed for {url}: {source}")]
    Hook { url: String, source: HookError },

    #[error("Redirect limit reached for {url} from {from}")]
    RedirectLimit { url: String, from: String },

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid exclude pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),
}

/// Failures of a single request issued through a [`crawler::Transport`]
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("Request timeout")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Failed to read response body: {0}")]
    Body(String),

    #[error("Request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::Connect(e.to_string())
        } else if e.is_body() || e.is_decode() {
            Self::Body(e.to_string())
        } else {
            Self::Request(e.to_string())
        }
    }
}

/// Error raised by a registered interceptor or observer
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct HookError(pub String);

impl HookError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Result type alias for Webtrawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{crawl, Crawler, ReqwestTransport, Transport};
pub use hooks::HookRegistry;
pub use output::CrawlSummary;
pub use state::FetchOutcome;
pub use crate::url::{urljoin, HostFilter};
