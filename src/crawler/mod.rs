//! Crawler module for fetching and link following
//!
//! This module contains the core crawling logic, including:
//! - The frontier and seen-set shared by all fetch tasks
//! - The bounded-concurrency scheduler
//! - HTTP transport (trait plus reqwest implementation)
//! - Link extraction from HTML/XML responses
//! - Overall crawl coordination and the per-URL fetch logic

mod coordinator;
mod fetcher;
mod frontier;
mod parser;
mod scheduler;

pub use coordinator::{Crawler, REDIRECT_STATUSES};
pub use fetcher::{
    build_http_client, ReqwestTransport, ResponseBody, Transport, TransportRequest,
    TransportResponse,
};
pub use frontier::{FetchTask, Frontier};
pub use parser::{
    decode_body, extract_links, extractable_content_type, parse_links, ContentType, ParsedPage,
};
pub use scheduler::{Scheduler, SchedulerReport};

use crate::config::Config;
use crate::output::CrawlSummary;
use crate::CrawlError;

/// Runs a complete crawl over the reqwest transport
///
/// This is the shortest way to crawl when no hooks are needed. It will:
/// 1. Validate the configuration
/// 2. Build the HTTP client
/// 3. Seed the frontier with the roots and fetch until it drains
///
/// # Returns
///
/// * `Ok(CrawlSummary)` - Crawl ran to completion
/// * `Err(CrawlError)` - The crawler could not be built
pub async fn crawl(config: Config) -> Result<CrawlSummary, CrawlError> {
    Ok(Crawler::new(config)?.start().await)
}
