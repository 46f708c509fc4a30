//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run full crawls
//! through the reqwest transport. Scenarios that need real host names use an
//! in-memory transport instead.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use std::collections::HashMap;
use std::io::Write;
use std::sync::{Arc, Mutex};
use webtrawl::config::{load_config, Config};
use webtrawl::crawler::{ResponseBody, TransportRequest, TransportResponse};
use webtrawl::{Crawler, HookError, Transport, TransportError};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html(body: impl Into<String>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.into().into_bytes(), "text/html")
}

fn redirect(status: u16, location: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).insert_header("Location", location)
}

/// Registers a fetch observer that records every URL it sees
fn record_fetches(crawler: &mut Crawler) -> Arc<Mutex<Vec<String>>> {
    let fetched = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&fetched);
    crawler.on_fetch(move |url: String, _body: String| {
        let sink = Arc::clone(&sink);
        async move {
            sink.lock().unwrap().push(url);
            Ok::<_, HookError>(())
        }
    });
    fetched
}

/// Registers an error observer that records every reported error
fn record_errors(crawler: &mut Crawler) -> Arc<Mutex<Vec<String>>> {
    let errors = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&errors);
    crawler.on_error(move |url: String, error: String| {
        let sink = Arc::clone(&sink);
        async move {
            sink.lock().unwrap().push(format!("{} {}", url, error));
            Ok::<_, HookError>(())
        }
    });
    errors
}

fn sorted(urls: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
    let mut urls = urls.lock().unwrap().clone();
    urls.sort();
    urls
}

#[tokio::test]
async fn test_full_crawl_single_host() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(format!(
            r#"<html><body>
            <a href="{0}/page1">Page 1</a>
            <a href='{0}/page2'>Page 2</a>
            <a href="https://elsewhere.example/">Elsewhere</a>
            </body></html>"#,
            base_url
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page1"))
        .respond_with(html(format!(r#"<a href="{}/">Home</a>"#, base_url)))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page2"))
        .respond_with(html("<p>No links here</p>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut crawler = Crawler::new(Config::from_roots([base_url.clone()])).unwrap();
    let fetched = record_fetches(&mut crawler);

    let summary = crawler.start().await;

    assert_eq!(
        sorted(&fetched),
        vec![
            format!("{}/", base_url),
            format!("{}/page1", base_url),
            format!("{}/page2", base_url),
        ]
    );
    assert_eq!(summary.urls_seen, 3);
    assert_eq!(summary.stats.pages_fetched, 3);
    assert_eq!(summary.stats.transport_errors, 0);
    assert!(summary.is_complete());
}

#[tokio::test]
async fn test_redirects_are_followed() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(redirect(301, &format!("{}/new", base_url)))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(html("<p>Moved here</p>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut crawler =
        Crawler::new(Config::from_roots([format!("{}/old", base_url)])).unwrap();
    let fetched = record_fetches(&mut crawler);

    let summary = crawler.start().await;

    assert_eq!(sorted(&fetched), vec![format!("{}/new", base_url)]);
    assert_eq!(summary.stats.redirects_followed, 1);
}

#[tokio::test]
async fn test_redirect_loop_stops_at_limit() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    for hop in 0..5 {
        Mock::given(method("GET"))
            .and(path(format!("/hop{}", hop)))
            .respond_with(redirect(302, &format!("{}/hop{}", base_url, hop + 1)))
            .mount(&mock_server)
            .await;
    }

    let mut config = Config::from_roots([format!("{}/hop0", base_url)]);
    config.crawler.max_redirect = 2;
    let mut crawler = Crawler::new(config).unwrap();
    let errors = record_errors(&mut crawler);

    let summary = crawler.start().await;

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
    assert_eq!(summary.stats.redirect_limits, 1);

    let errors = errors.lock().unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains(&format!("{}/hop3", base_url)));
}

#[tokio::test]
async fn test_unreachable_host_is_retried_max_tries_times() {
    // Bind then drop a listener so the port refuses connections
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let mut config = Config::from_roots([format!("http://127.0.0.1:{}/", port)]);
    config.crawler.max_tries = 3;
    let mut crawler = Crawler::new(config).unwrap();
    let errors = record_errors(&mut crawler);
    let fetched = record_fetches(&mut crawler);

    let summary = crawler.start().await;

    assert_eq!(errors.lock().unwrap().len(), 3);
    assert!(fetched.lock().unwrap().is_empty());
    assert_eq!(summary.stats.requests, 3);
    assert_eq!(summary.stats.abandoned, 1);
}

#[tokio::test]
async fn test_agent_hook_sets_user_agent_header() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("user-agent", "TestBot/1.0"))
        .respond_with(html("<p>hello bot</p>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut crawler = Crawler::new(Config::from_roots([mock_server.uri()])).unwrap();
    crawler.use_agent(|| async { Ok::<_, HookError>("TestBot/1.0".to_string()) });
    let fetched = record_fetches(&mut crawler);

    crawler.start().await;

    assert_eq!(fetched.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_content_type_handling() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(format!(
            r#"<a href="{0}/data.json">json</a> <a href="{0}/feed.xml">xml</a> <a href="{0}/missing">404</a>"#,
            base_url
        )))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/data.json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            format!(r#"{{"href":"{}/hidden"}}"#, base_url).into_bytes(),
            "application/json",
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/feed.xml"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(b"<feed><link href=\"entry\"/></feed>".to_vec(), "application/xml"),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/feed.xml/entry"))
        .respond_with(html("<p>entry</p>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/hidden"))
        .respond_with(html(""))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut crawler = Crawler::new(Config::from_roots([base_url.clone()])).unwrap();
    let fetched = record_fetches(&mut crawler);

    let summary = crawler.start().await;

    assert_eq!(
        sorted(&fetched),
        vec![
            format!("{}/", base_url),
            format!("{}/feed.xml", base_url),
            format!("{}/feed.xml/entry", base_url),
        ]
    );
    assert_eq!(summary.stats.not_extractable, 2);
}

#[tokio::test]
async fn test_exclude_pattern_from_config_file() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(format!(
            r#"<a href="{0}/report.pdf">pdf</a> <a href="{0}/about">about</a>"#,
            base_url
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(html("<p>about</p>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/report.pdf"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[crawler]
roots = ["{}"]
exclude = "\\.pdf$"
max-tasks = 2

[http]
user-agent = "webtrawl-test"
"#,
        base_url
    )
    .unwrap();

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.crawler.max_tasks, 2);

    let summary = Crawler::new(config).unwrap().start().await;
    assert_eq!(summary.stats.pages_fetched, 2);
}

/// Serves canned HTML pages for host names that do not resolve
struct StaticSite {
    pages: HashMap<String, String>,
    requested: Mutex<Vec<String>>,
}

impl StaticSite {
    fn new(pages: &[(&str, &str)]) -> Self {
        Self {
            pages: pages
                .iter()
                .map(|(url, body)| (url.to_string(), body.to_string()))
                .collect(),
            requested: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Transport for StaticSite {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let url = request.url.to_string();
        self.requested.lock().unwrap().push(url.clone());

        let body = self
            .pages
            .get(&url)
            .ok_or_else(|| TransportError::Connect(format!("no route to {}", url)))?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/html"));

        Ok(TransportResponse {
            status: 200,
            headers,
            final_url: request.url,
            body: ResponseBody::Buffered(body.clone().into_bytes()),
        })
    }
}

#[tokio::test]
async fn test_end_to_end_scenario() {
    let site = Arc::new(StaticSite::new(&[
        (
            "http://a.test/",
            r#"<a href="/">self</a> <a href="http://a.test/b">b</a> <a href="http://x.test">x</a>"#,
        ),
        ("http://a.test/b", "<p>leaf</p>"),
    ]));

    let config = Config::from_roots(["http://a.test"]).crawler;
    let mut crawler = Crawler::with_transport(config, site.clone()).unwrap();
    let fetched = record_fetches(&mut crawler);

    crawler.start().await;

    assert_eq!(
        sorted(&fetched),
        vec!["http://a.test/".to_string(), "http://a.test/b".to_string()]
    );

    let requested = site.requested.lock().unwrap();
    assert_eq!(requested.len(), 2);
    assert!(requested.iter().all(|url| !url.contains("x.test")));
}

#[tokio::test]
async fn test_concurrent_crawl_fetches_each_page_once() {
    let mut pages = vec![(
        "http://a.test/".to_string(),
        (0..20)
            .map(|i| format!(r#"<a href="/p{}">{}</a>"#, i, i))
            .collect::<String>(),
    )];
    for i in 0..20 {
        // Every page links to every other page
        let body = (0..20)
            .map(|j| format!(r#"<a href="http://a.test/p{}">{}</a>"#, j, j))
            .collect::<String>();
        pages.push((format!("http://a.test/p{}", i), body));
    }
    let pages: Vec<(&str, &str)> = pages.iter().map(|(u, b)| (u.as_str(), b.as_str())).collect();
    let site = Arc::new(StaticSite::new(&pages));

    let mut config = Config::from_roots(["http://a.test/"]).crawler;
    config.max_tasks = 8;
    let crawler = Crawler::with_transport(config, site.clone()).unwrap();

    let summary = crawler.start().await;

    let requested = site.requested.lock().unwrap();
    assert_eq!(requested.len(), 21);
    assert_eq!(summary.urls_seen, 21);
    assert_eq!(summary.stats.pages_fetched, 21);
}
