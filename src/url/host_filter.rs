use crate::config::CrawlerConfig;
use crate::ConfigError;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

/// A host made only of digits and dots (an IPv4 literal)
static NUMERIC_HOST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9.]+$").expect("numeric host pattern is valid")
});

/// Returns the host key of a URL: the lower-cased host, plus `:port` when the
/// URL names a non-default port
///
/// # Examples
///
/// ```
/// use url::Url;
/// use webtrawl::url::host_key;
///
/// let url = Url::parse("https://Example.COM/path").unwrap();
/// assert_eq!(host_key(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("http://127.0.0.1:8080/").unwrap();
/// assert_eq!(host_key(&url), Some("127.0.0.1:8080".to_string()));
/// ```
pub fn host_key(url: &Url) -> Option<String> {
    let host = url.host_str().filter(|h| !h.is_empty())?.to_lowercase();
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    })
}

/// Splits `host[:port]` into its host name and optional port
fn split_port(host: &str) -> (&str, Option<&str>) {
    if host.starts_with('[') {
        // Bracketed IPv6 literal
        return match host.find(']') {
            Some(end) => {
                let port = host[end + 1..].strip_prefix(':');
                (&host[..=end], port)
            }
            None => (host, None),
        };
    }

    match host.rsplit_once(':') {
        Some((name, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => {
            (name, Some(port))
        }
        _ => (host, None),
    }
}

fn join_port(name: &str, port: Option<&str>) -> String {
    match port {
        Some(port) => format!("{}:{}", name, port),
        None => name.to_string(),
    }
}

/// Returns true if the host name is an IP literal
pub fn is_ip_literal(name: &str) -> bool {
    name.starts_with('[') || NUMERIC_HOST.is_match(name)
}

/// Reduces a host name to its last two labels (`a.b.example.com` -> `example.com`)
pub fn lenient_host(name: &str) -> String {
    let labels: Vec<&str> = name.split('.').collect();
    let start = labels.len().saturating_sub(2);
    labels[start..].join(".")
}

/// Adds a leading `www.` or removes it if already present
fn toggle_www(name: &str) -> String {
    match name.strip_prefix("www.") {
        Some(bare) => bare.to_string(),
        None => format!("www.{}", name),
    }
}

/// The normalized hosts derived from the crawl roots
///
/// Each root contributes its IP literal as-is, or its lower-cased host name
/// (strict mode) or two-label suffix (lenient mode). Built once, read-only.
#[derive(Debug, Clone, Default)]
pub struct RootDomainSet {
    domains: HashSet<String>,
}

impl RootDomainSet {
    /// Derives the domain set from root URLs; roots without a host are skipped
    pub fn from_roots<S: AsRef<str>>(roots: &[S], strict: bool) -> Self {
        let mut domains = HashSet::new();

        for root in roots {
            let Some(key) = Url::parse(root.as_ref()).ok().as_ref().and_then(host_key) else {
                tracing::debug!("Root {} has no host, ignoring", root.as_ref());
                continue;
            };

            let (name, port) = split_port(&key);
            if is_ip_literal(name) || strict {
                domains.insert(key.clone());
            } else {
                domains.insert(join_port(&lenient_host(name), port));
            }
        }

        Self { domains }
    }

    pub fn contains(&self, host: &str) -> bool {
        self.domains.contains(host)
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.domains.iter().map(String::as_str)
    }
}

/// Decides whether URLs belong to the crawl
///
/// A pure function of the crawl configuration and its input.
#[derive(Debug, Clone)]
pub struct HostFilter {
    root_domains: RootDomainSet,
    strict: bool,
    exclude: Option<Regex>,
}

impl HostFilter {
    /// Builds the filter from the crawler configuration
    ///
    /// # Returns
    ///
    /// * `Ok(HostFilter)` - Filter ready to use
    /// * `Err(ConfigError)` - The exclude pattern is not a valid regex
    pub fn new(config: &CrawlerConfig) -> Result<Self, ConfigError> {
        let exclude = config
            .exclude
            .as_deref()
            .map(Regex::new)
            .transpose()
            .map_err(|e| ConfigError::InvalidPattern(e.to_string()))?;

        Ok(Self {
            root_domains: RootDomainSet::from_roots(&config.roots, config.strict),
            strict: config.strict,
            exclude,
        })
    }

    pub fn root_domains(&self) -> &RootDomainSet {
        &self.root_domains
    }

    /// Checks whether a `host[:port]` belongs to the allowed domain set
    ///
    /// Exact matches always pass. Otherwise, for non-IP hosts, strict mode
    /// retries with the `www.` prefix toggled and lenient mode compares
    /// two-label suffixes.
    pub fn host_okay(&self, host: &str) -> bool {
        if host.is_empty() {
            return false;
        }

        let host = host.to_lowercase();
        if self.root_domains.contains(&host) {
            return true;
        }

        let (name, port) = split_port(&host);
        if is_ip_literal(name) {
            return false;
        }

        let candidate = if self.strict {
            toggle_www(name)
        } else {
            lenient_host(name)
        };

        self.root_domains.contains(&join_port(&candidate, port))
    }

    /// Checks whether a URL may be crawled
    ///
    /// Rejects URLs matching the exclude pattern, non-http(s) schemes, and
    /// hosts outside the allowed domain set.
    pub fn url_allowed(&self, url: &str) -> bool {
        if self.exclude.as_ref().is_some_and(|re| re.is_match(url)) {
            return false;
        }

        let Ok(parsed) = Url::parse(url) else {
            return false;
        };

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return false;
        }

        host_key(&parsed).is_some_and(|host| self.host_okay(&host))
    }
}
