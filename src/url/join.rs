use regex::Regex;
use std::sync::LazyLock;

/// A URL scheme prefix such as `http:` or `mailto:`
static SCHEME_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:").expect("scheme pattern is valid")
});

/// Joins a link onto a base URL using the crawler's rooted join rule
///
/// - A link that starts with a scheme is returned unchanged.
/// - Otherwise a single leading `/` is dropped and the link is appended to
///   the base, with a `/` inserted if the base does not end in one.
///
/// Root-relative links therefore land under the base path rather than at the
/// origin root; this is intentional and differs from RFC 3986 resolution.
///
/// # Examples
///
/// ```
/// use webtrawl::url::urljoin;
///
/// assert_eq!(urljoin("http://example.com/dir/", "foo.html"), "http://example.com/dir/foo.html");
/// assert_eq!(urljoin("http://example.com/dir/", "/abs.html"), "http://example.com/dir/abs.html");
/// assert_eq!(urljoin("http://example.com/dir/", "https://other.com/"), "https://other.com/");
/// ```
pub fn urljoin(base: &str, link: &str) -> String {
    if SCHEME_PREFIX.is_match(link) {
        return link.to_string();
    }

    let link = link.strip_prefix('/').unwrap_or(link);
    if base.ends_with('/') {
        format!("{}{}", base, link)
    } else {
        format!("{}/{}", base, link)
    }
}
