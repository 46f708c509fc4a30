//! URL handling module for Webtrawl
//!
//! This module provides the host filter that keeps a crawl inside its root
//! domains, and the join rule used to resolve extracted links.

mod host_filter;
mod join;

// Re-export main functions
pub use host_filter::{host_key, is_ip_literal, lenient_host, HostFilter, RootDomainSet};
pub use join::urljoin;
