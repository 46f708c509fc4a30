//! Crawl statistics
//!
//! Fetch tasks update a shared set of atomic counters as they run. A snapshot
//! of the counters goes into the summary returned when the crawl ends.

use crate::output::CrawlSummary;
use crate::state::FetchOutcome;
use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters shared by every fetch task of one crawl
#[derive(Debug, Default)]
pub struct CrawlStats {
    requests: AtomicU64,
    transport_errors: AtomicU64,
    hook_errors: AtomicU64,
    pages_fetched: AtomicU64,
    links_enqueued: AtomicU64,
    not_extractable: AtomicU64,
    redirects_followed: AtomicU64,
    redirects_dropped: AtomicU64,
    redirect_limits: AtomicU64,
    abandoned: AtomicU64,
    body_errors: AtomicU64,
    invalid_urls: AtomicU64,
    tasks_panicked: AtomicU64,
}

/// Point-in-time copy of [`CrawlStats`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Request attempts, retries included
    pub requests: u64,

    /// Attempts that failed in the transport
    pub transport_errors: u64,

    /// Interceptor or observer failures
    pub hook_errors: u64,

    /// HTML/XML pages scanned for links
    pub pages_fetched: u64,

    /// Links enqueued from scanned pages
    pub links_enqueued: u64,

    /// Responses that were not scanned
    pub not_extractable: u64,

    /// Redirect targets enqueued
    pub redirects_followed: u64,

    /// Redirects whose target was seen, disallowed or missing
    pub redirects_dropped: u64,

    /// Redirect chains stopped by the budget
    pub redirect_limits: u64,

    /// URLs dropped after every attempt failed
    pub abandoned: u64,

    /// Responses whose body could not be read
    pub body_errors: u64,

    /// Task URLs that did not parse
    pub invalid_urls: u64,

    /// Fetch tasks that panicked
    pub tasks_panicked: u64,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_transport_error(&self) {
        self.transport_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_hook_error(&self) {
        self.hook_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_panics(&self, count: u64) {
        self.tasks_panicked.fetch_add(count, Ordering::Relaxed);
    }

    /// Records the terminal outcome of one fetch task
    pub fn record_outcome(&self, outcome: &FetchOutcome) {
        let counter = match outcome {
            FetchOutcome::Processed { links_enqueued } => {
                self.links_enqueued
                    .fetch_add(*links_enqueued as u64, Ordering::Relaxed);
                &self.pages_fetched
            }
            FetchOutcome::NotExtractable { .. } => &self.not_extractable,
            FetchOutcome::Redirected { .. } => &self.redirects_followed,
            FetchOutcome::RedirectAlreadySeen
            | FetchOutcome::RedirectDisallowed
            | FetchOutcome::MissingLocation => &self.redirects_dropped,
            FetchOutcome::RedirectLimit => &self.redirect_limits,
            FetchOutcome::Exhausted { .. } => &self.abandoned,
            FetchOutcome::BodyError => &self.body_errors,
            FetchOutcome::InvalidUrl => &self.invalid_urls,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);

        StatsSnapshot {
            requests: load(&self.requests),
            transport_errors: load(&self.transport_errors),
            hook_errors: load(&self.hook_errors),
            pages_fetched: load(&self.pages_fetched),
            links_enqueued: load(&self.links_enqueued),
            not_extractable: load(&self.not_extractable),
            redirects_followed: load(&self.redirects_followed),
            redirects_dropped: load(&self.redirects_dropped),
            redirect_limits: load(&self.redirect_limits),
            abandoned: load(&self.abandoned),
            body_errors: load(&self.body_errors),
            invalid_urls: load(&self.invalid_urls),
            tasks_panicked: load(&self.tasks_panicked),
        }
    }
}

/// Prints a crawl summary to stdout in a formatted manner
///
/// # Arguments
///
/// * `summary` - The summary returned by the crawl
pub fn print_statistics(summary: &CrawlSummary) {
    let stats = &summary.stats;

    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  URLs seen: {}", summary.urls_seen);
    println!("  Fetch tasks run: {}", summary.tasks_dispatched);
    println!("  Duration: {:.2}s", summary.duration.as_secs_f64());
    if summary.cancelled {
        println!(
            "  Cancelled with {} URLs still queued",
            summary.left_queued
        );
    }
    println!();

    println!("Requests:");
    println!("  Attempts: {}", stats.requests);
    println!("  Transport errors: {}", stats.transport_errors);
    println!("  Hook errors: {}", stats.hook_errors);
    println!();

    println!("Outcomes:");
    println!("  Pages fetched: {}", stats.pages_fetched);
    println!("  Links enqueued: {}", stats.links_enqueued);
    println!("  Not extractable: {}", stats.not_extractable);
    println!("  Redirects followed: {}", stats.redirects_followed);
    println!("  Redirects dropped: {}", stats.redirects_dropped);
    println!("  Redirect limits hit: {}", stats.redirect_limits);
    println!();

    let failures = stats.abandoned + stats.body_errors + stats.invalid_urls;
    if failures > 0 || stats.tasks_panicked > 0 {
        println!("Failures:");
        println!("  Abandoned after retries: {}", stats.abandoned);
        println!("  Unreadable bodies: {}", stats.body_errors);
        println!("  Invalid URLs: {}", stats.invalid_urls);
        println!("  Panicked tasks: {}", stats.tasks_panicked);
        println!();
    }

    let success_rate = if summary.tasks_dispatched > 0 {
        (stats.pages_fetched as f64 / summary.tasks_dispatched as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Success Rate: {:.1}% ({} / {} fetch tasks produced a page)",
        success_rate, stats.pages_fetched, summary.tasks_dispatched
    );
}
