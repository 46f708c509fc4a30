//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `FetchOutcome`: the terminal state of one fetch task (processed, redirected, abandoned, ...)

mod fetch_outcome;

// Re-export main types
pub use fetch_outcome::FetchOutcome;
