//! Configuration module for Webtrawl
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use webtrawl::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("webtrawl.toml")).unwrap();
//! println!("Crawler will run {} fetches at once", config.crawler.max_tasks);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, HttpConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::{validate, validate_crawler_config};
