//! Summary of a finished crawl

use crate::output::StatsSnapshot;
use std::time::Duration;

/// What a crawl did, returned once the frontier drains or the crawl is cancelled
#[derive(Debug, Clone, Default)]
pub struct CrawlSummary {
    /// Final counter values
    pub stats: StatsSnapshot,

    /// Distinct URLs enqueued during the crawl
    pub urls_seen: usize,

    /// Fetch tasks handed to a worker
    pub tasks_dispatched: u64,

    /// Tasks still queued when the crawl stopped
    pub left_queued: usize,

    /// Whether the crawl was stopped by cancellation
    pub cancelled: bool,

    /// Wall-clock time of the crawl
    pub duration: Duration,
}

impl CrawlSummary {
    /// Returns true if the crawl ran until the frontier drained
    pub fn is_complete(&self) -> bool {
        !self.cancelled && self.left_queued == 0
    }
}
