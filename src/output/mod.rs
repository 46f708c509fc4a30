//! Output module for crawl statistics and summaries
//!
//! This module handles:
//! - Counting what fetch tasks did while the crawl runs
//! - Building the summary returned when the crawl ends
//! - Printing that summary

pub mod stats;
mod summary;

pub use stats::{print_statistics, CrawlStats, StatsSnapshot};
pub use summary::CrawlSummary;
