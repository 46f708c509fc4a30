use crate::config::types::{Config, CrawlerConfig, HttpConfig};
use crate::ConfigError;
use regex::Regex;
use url::Url;

/// Upper bound on `max-tasks`
const MAX_TASKS_LIMIT: usize = 1000;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_http_config(&config.http)?;
    Ok(())
}

/// Validates crawler configuration
pub fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.roots.is_empty() {
        return Err(ConfigError::Validation(
            "roots must contain at least one URL".to_string(),
        ));
    }

    for root in &config.roots {
        validate_root(root)?;
    }

    if let Some(pattern) = &config.exclude {
        Regex::new(pattern)
            .map_err(|e| ConfigError::InvalidPattern(format!("'{}': {}", pattern, e)))?;
    }

    if config.max_tries < 1 {
        return Err(ConfigError::Validation(format!(
            "max_tries must be >= 1, got {}",
            config.max_tries
        )));
    }

    if config.max_tasks < 1 || config.max_tasks > MAX_TASKS_LIMIT {
        return Err(ConfigError::Validation(format!(
            "max_tasks must be between 1 and {}, got {}",
            MAX_TASKS_LIMIT, config.max_tasks
        )));
    }

    Ok(())
}

/// Validates a root URL: parseable, http(s), and carrying a host
fn validate_root(root: &str) -> Result<(), ConfigError> {
    let url = Url::parse(root)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid root URL '{}': {}", root, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Root URL '{}' must use http or https",
            root
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(ConfigError::InvalidUrl(format!(
            "Root URL '{}' has no host",
            root
        )));
    }

    Ok(())
}

/// Validates HTTP transport configuration
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.request_timeout_secs == 0 || config.connect_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeouts must be at least one second".to_string(),
        ));
    }

    Ok(())
}
