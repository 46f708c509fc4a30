//! Crawler coordinator - crawl orchestration and the per-URL fetch logic
//!
//! This module ties the crawl together:
//! - Seeding the frontier with the configured roots
//! - Running fetch tasks through the scheduler until the frontier drains
//! - Fetching one URL: request hooks, bounded retries, redirect following,
//!   link extraction and observer notification
//! - Collecting statistics into the final summary

use crate::config::{validate, validate_crawler_config, Config, CrawlerConfig};
use crate::crawler::fetcher::{ReqwestTransport, Transport, TransportRequest, TransportResponse};
use crate::crawler::frontier::Frontier;
use crate::crawler::parser::parse_links;
use crate::crawler::scheduler::Scheduler;
use crate::hooks::{ErrorObserver, FetchObserver, HookRegistry, ProxyHook, UserAgentHook};
use crate::output::{CrawlStats, CrawlSummary};
use crate::state::FetchOutcome;
use crate::url::{urljoin, HostFilter};
use crate::{CrawlError, UrlError};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Status codes treated as redirects
pub const REDIRECT_STATUSES: &[u16] = &[300, 301, 302, 303, 307];

/// One crawl: configuration, host filter, frontier, hooks and transport
///
/// # Example
///
/// ```no_run
/// use webtrawl::{Config, Crawler, HookError};
///
/// # async fn run() -> webtrawl::Result<()> {
/// let mut crawler = Crawler::new(Config::from_roots(["http://example.com/"]))?;
/// crawler.on_fetch(|url: String, _body: String| async move {
///     println!("{}", url);
///     Ok::<_, HookError>(())
/// });
///
/// let summary = crawler.start().await;
/// println!("{} URLs seen", summary.urls_seen);
/// # Ok(())
/// # }
/// ```
pub struct Crawler {
    config: Arc<CrawlerConfig>,
    filter: HostFilter,
    frontier: Arc<Frontier>,
    scheduler: Scheduler,
    transport: Arc<dyn Transport>,
    hooks: HookRegistry,
    stats: CrawlStats,
}

impl Crawler {
    /// Creates a crawler that fetches through reqwest
    ///
    /// # Arguments
    ///
    /// * `config` - The full configuration (`[crawler]` and `[http]`)
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Crawler ready to start
    /// * `Err(CrawlError)` - Invalid configuration or HTTP client setup failure
    pub fn new(config: Config) -> Result<Self, CrawlError> {
        validate(&config)?;
        let transport = ReqwestTransport::new(&config.http)?;
        Self::build(config.crawler, Arc::new(transport))
    }

    /// Creates a crawler that fetches through the given transport
    pub fn with_transport(
        config: CrawlerConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, CrawlError> {
        validate_crawler_config(&config)?;
        Self::build(config, transport)
    }

    fn build(config: CrawlerConfig, transport: Arc<dyn Transport>) -> Result<Self, CrawlError> {
        let filter = HostFilter::new(&config)?;
        let frontier = Arc::new(Frontier::new());
        let scheduler = Scheduler::new(config.max_tasks, Arc::clone(&frontier));

        tracing::debug!(
            "Allowed root domains: {:?}",
            filter.root_domains().iter().collect::<Vec<_>>()
        );

        Ok(Self {
            config: Arc::new(config),
            filter,
            frontier,
            scheduler,
            transport,
            hooks: HookRegistry::new(),
            stats: CrawlStats::new(),
        })
    }

    pub fn config(&self) -> &CrawlerConfig {
        &self.config
    }

    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut HookRegistry {
        &mut self.hooks
    }

    /// Registers the User-Agent interceptor
    pub fn use_agent(&mut self, hook: impl UserAgentHook + 'static) {
        self.hooks.use_agent(hook);
    }

    /// Registers the proxy interceptor
    pub fn use_proxy(&mut self, hook: impl ProxyHook + 'static) {
        self.hooks.use_proxy(hook);
    }

    /// Registers the observer called with every scanned page
    pub fn on_fetch(&mut self, observer: impl FetchObserver + 'static) {
        self.hooks.on_fetch(observer);
    }

    /// Registers the observer called with every fetch error
    pub fn on_error(&mut self, observer: impl ErrorObserver + 'static) {
        self.hooks.on_error(observer);
    }

    pub fn host_okay(&self, host: &str) -> bool {
        self.filter.host_okay(host)
    }

    pub fn url_allowed(&self, url: &str) -> bool {
        self.filter.url_allowed(url)
    }

    /// Records a URL as seen and queues it for fetching
    ///
    /// The URL is neither filtered nor checked against the seen-set; callers
    /// do that first.
    pub fn add_url(&self, url: impl Into<String>, remaining_redirects: u32) {
        self.frontier.add_url(url, remaining_redirects);
    }

    /// Seeds the frontier with every root and crawls until it drains
    pub async fn start(self) -> CrawlSummary {
        self.start_with_cancellation(CancellationToken::new()).await
    }

    /// Like [`Crawler::start`], stopping early once `cancel` fires
    ///
    /// After cancellation no queued URL is dispatched; fetches already running
    /// finish normally.
    pub async fn start_with_cancellation(self, cancel: CancellationToken) -> CrawlSummary {
        let started = Instant::now();
        let seeded = self.seed_roots();

        tracing::info!(
            "Starting crawl: {} roots, {} concurrent fetches, {} tries, {} redirects",
            seeded,
            self.scheduler.max_tasks(),
            self.config.max_tries,
            self.config.max_redirect
        );

        let crawler = Arc::new(self);
        let worker = Arc::clone(&crawler);
        let report = crawler
            .scheduler
            .run(
                move |task| {
                    let crawler = Arc::clone(&worker);
                    async move {
                        let outcome = crawler.fetch(&task.url, task.remaining_redirects).await;
                        tracing::debug!("{}: {}", task.url, outcome);
                        crawler.stats.record_outcome(&outcome);
                    }
                },
                &cancel,
            )
            .await;

        crawler.stats.record_panics(report.panicked);

        CrawlSummary {
            stats: crawler.stats.snapshot(),
            urls_seen: crawler.frontier.seen_count(),
            tasks_dispatched: report.dispatched,
            left_queued: report.abandoned,
            cancelled: report.cancelled,
            duration: started.elapsed(),
        }
    }

    /// Queues each distinct root with a full redirect budget
    fn seed_roots(&self) -> usize {
        let mut seeded = 0;
        for root in &self.config.roots {
            let Some(url) = normalize(root) else {
                tracing::warn!("Skipping unparseable root {}", root);
                continue;
            };
            if self.frontier.add_if_unseen(url, self.config.max_redirect) {
                seeded += 1;
            }
        }
        seeded
    }

    /// Runs the fetch state machine for one URL
    ///
    /// Requests the URL (retrying transport and request-hook failures up to
    /// `max_tries` attempts in total), then either follows a redirect by
    /// queueing its target with one hop less, or scans the page and queues
    /// every new allowed link with a fresh redirect budget.
    pub async fn fetch(&self, url: &str, remaining_redirects: u32) -> FetchOutcome {
        let target = match Url::parse(url) {
            Ok(target) => target,
            Err(e) => {
                let error = CrawlError::Url(UrlError::Parse(format!("{}: {}", url, e)));
                self.hooks.notify_error(url, &error).await;
                return FetchOutcome::InvalidUrl;
            }
        };

        let Some(response) = self.request_with_retries(url, &target).await else {
            return FetchOutcome::Exhausted {
                attempts: self.config.max_tries,
            };
        };

        if REDIRECT_STATUSES.contains(&response.status) {
            return self.follow_redirect(url, &response, remaining_redirects).await;
        }

        self.harvest(url, response).await
    }

    /// Issues the request until it succeeds or `max_tries` attempts have failed
    async fn request_with_retries(&self, url: &str, target: &Url) -> Option<TransportResponse> {
        let max_tries = self.config.max_tries;

        for attempt in 1..=max_tries {
            self.stats.record_request();

            match self.attempt(url, target).await {
                Ok(response) => return Some(response),
                Err(error) => {
                    tracing::debug!("Attempt {}/{} for {} failed: {}", attempt, max_tries, url, error);
                    self.hooks.notify_error(url, &error).await;

                    if attempt < max_tries && self.config.retry_delay_ms > 0 {
                        tokio::time::sleep(Duration::from_millis(self.config.retry_delay_ms)).await;
                    }
                }
            }
        }

        tracing::debug!("Giving up on {} after {} attempts", url, max_tries);
        None
    }

    /// One attempt: run the request hooks, then send
    async fn attempt(&self, url: &str, target: &Url) -> Result<TransportResponse, CrawlError> {
        let decoration = self.hooks.decorate().await.map_err(|source| {
            self.stats.record_hook_error();
            CrawlError::Hook {
                url: url.to_string(),
                source,
            }
        })?;

        let request = TransportRequest {
            url: target.clone(),
            user_agent: decoration.user_agent,
            proxy: decoration.proxy,
        };

        self.transport.send(request).await.map_err(|source| {
            self.stats.record_transport_error();
            CrawlError::Transport {
                url: url.to_string(),
                source,
            }
        })
    }

    async fn follow_redirect(
        &self,
        url: &str,
        response: &TransportResponse,
        remaining_redirects: u32,
    ) -> FetchOutcome {
        let Some(location) = response.location() else {
            tracing::debug!("Redirect {} from {} has no Location", response.status, url);
            return FetchOutcome::MissingLocation;
        };

        let joined = urljoin(url, location);
        let Some(next) = normalize(&joined) else {
            tracing::debug!("Unparseable redirect target {} from {}", joined, url);
            return FetchOutcome::RedirectDisallowed;
        };

        if self.frontier.contains(&next) {
            return FetchOutcome::RedirectAlreadySeen;
        }

        if !self.filter.url_allowed(&next) {
            tracing::debug!("Redirect target {} from {} is not allowed", next, url);
            return FetchOutcome::RedirectDisallowed;
        }

        if remaining_redirects == 0 {
            tracing::warn!("Redirect limit reached for {} from {}", next, url);
            let error = CrawlError::RedirectLimit {
                url: next,
                from: url.to_string(),
            };
            self.hooks.notify_error(url, &error).await;
            return FetchOutcome::RedirectLimit;
        }

        if self.frontier.add_if_unseen(next.clone(), remaining_redirects - 1) {
            FetchOutcome::Redirected { to: next }
        } else {
            FetchOutcome::RedirectAlreadySeen
        }
    }

    /// Scans a non-redirect response and queues the new links it holds
    async fn harvest(&self, url: &str, response: TransportResponse) -> FetchOutcome {
        let status = response.status;

        let page = match parse_links(response, &self.filter).await {
            Ok(Some(page)) => page,
            Ok(None) => return FetchOutcome::NotExtractable { status },
            Err(source) => {
                let error = CrawlError::Transport {
                    url: url.to_string(),
                    source,
                };
                tracing::debug!("{}", error);
                self.hooks.notify_error(url, &error).await;
                return FetchOutcome::BodyError;
            }
        };

        if let Err(source) = self.hooks.notify_fetch(url, &page.body).await {
            self.stats.record_hook_error();
            tracing::warn!("Fetch observer failed for {}: {}", url, source);
            let error = CrawlError::Hook {
                url: url.to_string(),
                source,
            };
            self.hooks.notify_error(url, &error).await;
        }

        let links_enqueued = page
            .links
            .into_iter()
            .filter(|link| self.frontier.add_if_unseen(link.as_str(), self.config.max_redirect))
            .count();

        tracing::debug!("{}: {} new links", url, links_enqueued);
        FetchOutcome::Processed { links_enqueued }
    }
}

/// Canonical string form of a URL, or `None` if it does not parse
fn normalize(url: &str) -> Option<String> {
    Url::parse(url).ok().map(String::from)
}
