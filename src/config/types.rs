use serde::Deserialize;

/// Main configuration structure for Webtrawl
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

impl Config {
    /// Builds a configuration for the given roots with every other setting at its default
    pub fn from_roots<I, S>(roots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            crawler: CrawlerConfig {
                roots: roots.into_iter().map(Into::into).collect(),
                exclude: None,
                strict: default_strict(),
                max_redirect: default_max_redirect(),
                max_tries: default_max_tries(),
                max_tasks: default_max_tasks(),
                retry_delay_ms: 0,
            },
            http: HttpConfig::default(),
        }
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// URLs the crawl starts from; their hosts form the allowed domain set
    pub roots: Vec<String>,

    /// Regex; URLs matching it are never enqueued
    #[serde(default)]
    pub exclude: Option<String>,

    /// Exact (www-tolerant) host matching instead of two-label suffix matching
    #[serde(default = "default_strict")]
    pub strict: bool,

    /// Maximum number of redirect hops along one chain
    #[serde(rename = "max-redirect", default = "default_max_redirect")]
    pub max_redirect: u32,

    /// Maximum number of request attempts per URL
    #[serde(rename = "max-tries", default = "default_max_tries")]
    pub max_tries: u32,

    /// Maximum number of concurrent fetches
    #[serde(rename = "max-tasks", default = "default_max_tasks")]
    pub max_tasks: usize,

    /// Pause between two attempts on the same URL (milliseconds)
    #[serde(rename = "retry-delay-ms", default)]
    pub retry_delay_ms: u64,
}

/// HTTP transport configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// User-Agent sent when no agent hook is registered
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(rename = "connect-timeout-secs", default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

fn default_strict() -> bool {
    true
}

fn default_max_redirect() -> u32 {
    10
}

fn default_max_tries() -> u32 {
    4
}

fn default_max_tasks() -> usize {
    10
}

fn default_user_agent() -> String {
    format!("webtrawl/{}", env!("CARGO_PKG_VERSION"))
}

fn default_request_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}
