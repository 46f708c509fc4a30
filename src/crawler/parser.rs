//! Link extraction
//!
//! This module handles scanning fetched responses for links:
//! - Deciding whether a response is scannable (status 200, HTML or XML)
//! - Splitting `Content-Type` into media type and charset
//! - Decoding the buffered body
//! - Finding `href` attribute values, joining and filtering them

use crate::crawler::fetcher::TransportResponse;
use crate::url::{urljoin, HostFilter};
use crate::TransportError;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

/// Media types whose bodies are scanned for links
pub const EXTRACTABLE_TYPES: &[&str] = &["text/html", "application/xml"];

/// Charset assumed when the response names none
pub const DEFAULT_CHARSET: &str = "utf-8";

/// An `href="..."` or `href='...'` attribute value
static HREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"href=["']([^\s"'<>]+)"#).expect("href pattern is valid")
});

/// A `Content-Type` header split into its parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// Media type, lower-cased (`text/html`)
    pub media_type: String,

    /// Charset parameter, lower-cased; `utf-8` when absent
    pub charset: String,
}

impl ContentType {
    /// Parses a `Content-Type` header value
    ///
    /// # Examples
    ///
    /// ```
    /// use webtrawl::crawler::ContentType;
    ///
    /// let ct = ContentType::parse("text/html; charset=ISO-8859-1");
    /// assert_eq!(ct.media_type, "text/html");
    /// assert_eq!(ct.charset, "iso-8859-1");
    /// ```
    pub fn parse(value: &str) -> Self {
        let mut parts = value.split(';');
        let media_type = parts.next().unwrap_or("").trim().to_lowercase();

        let charset = parts
            .filter_map(|param| {
                let param: String = param.chars().filter(|c| !c.is_whitespace()).collect();
                let lower = param.to_lowercase();
                lower
                    .strip_prefix("charset=")
                    .map(|cs| cs.trim_matches(|c| c == '"' || c == '\'').to_string())
            })
            .find(|cs| !cs.is_empty())
            .unwrap_or_else(|| DEFAULT_CHARSET.to_string());

        Self {
            media_type,
            charset,
        }
    }

    pub fn is_extractable(&self) -> bool {
        EXTRACTABLE_TYPES.contains(&self.media_type.as_str())
    }
}

/// A scanned page: its decoded body and the links worth following
#[derive(Debug, Clone)]
pub struct ParsedPage {
    /// Decoded body text
    pub body: String,

    /// Allowed, deduplicated absolute URLs found in the body
    pub links: Vec<String>,
}

/// Decides whether a response should be scanned for links
///
/// Returns the parsed content type for status 200 responses whose media type
/// is HTML or XML. A missing or unreadable `Content-Type` is not scannable.
pub fn extractable_content_type(response: &TransportResponse) -> Option<ContentType> {
    if response.status != 200 {
        return None;
    }

    let content_type = ContentType::parse(response.content_type()?);
    content_type.is_extractable().then_some(content_type)
}

/// Reads a response and extracts the links it contains
///
/// # Returns
///
/// * `Ok(Some(ParsedPage))` - The response was scannable
/// * `Ok(None)` - The response is not HTML/XML with status 200; the body is not read
/// * `Err(TransportError)` - The body could not be read
pub async fn parse_links(
    response: TransportResponse,
    filter: &HostFilter,
) -> Result<Option<ParsedPage>, TransportError> {
    let Some(content_type) = extractable_content_type(&response) else {
        return Ok(None);
    };

    let base_url = response.final_url.to_string();
    let bytes = response.body.read_all().await?;
    let body = decode_body(&bytes, &content_type.charset);
    let links = extract_links(&body, &base_url, filter);

    Ok(Some(ParsedPage { body, links }))
}

/// Decodes a body using the charset named by the response
///
/// UTF-8 and Latin-1 are decoded exactly; other charsets fall back to lossy UTF-8.
pub fn decode_body(bytes: &[u8], charset: &str) -> String {
    match charset {
        "utf-8" | "utf8" | "us-ascii" | "ascii" => String::from_utf8_lossy(bytes).into_owned(),
        "iso-8859-1" | "latin1" | "latin-1" => bytes.iter().map(|&b| char::from(b)).collect(),
        other => {
            tracing::debug!("Unsupported charset {}, decoding as UTF-8", other);
            String::from_utf8_lossy(bytes).into_owned()
        }
    }
}

/// Extracts allowed links from a body
///
/// Every `href` value is joined onto `base_url` with the rooted join rule,
/// normalized, kept only if the filter allows the normalized URL, and
/// deduplicated. The first occurrence of each link keeps its position.
pub fn extract_links(body: &str, base_url: &str, filter: &HostFilter) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for capture in HREF.captures_iter(body) {
        let joined = urljoin(base_url, &capture[1]);
        let Ok(resolved) = Url::parse(&joined) else {
            continue;
        };

        // The filter sees the same form the frontier will
        let resolved = resolved.to_string();
        if !filter.url_allowed(&resolved) {
            continue;
        }

        if seen.insert(resolved.clone()) {
            links.push(resolved);
        }
    }

    links
}
