//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a front page, story pages and comment
//! links, and a temporary directory as the archive root.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use ycrawler::archive::{ArchiveError, ArchiveResult, Archiver, FsArchiver};
use ycrawler::config::Config;
use ycrawler::crawler::{
    ContentKind, CrawlLoop, Fetcher, FetcherSettings, StopReason, TIMEOUT_STATUS,
};
use ycrawler::extract::HackerNewsExtractor;
use ycrawler::state::CrawlState;
use ycrawler::CrawlerError;

/// Creates a single-pass test configuration pointing at the mock server
fn create_test_config(site: &str, root: &Path) -> Config {
    let mut config = Config::default();
    config.crawler.site = site.to_string();
    config.crawler.top_news_count = 5;
    config.crawler.max_concurrent_fetches = 4;
    config.crawler.request_timeout = 2;
    config.crawler.run_once = true;
    config.output.archive_root = root.display().to_string();
    config
}

/// Front page markup listing `(id, title, href)` stories in order
fn front_page(stories: &[(&str, &str, &str)]) -> String {
    let rows: String = stories
        .iter()
        .enumerate()
        .map(|(i, (id, title, href))| {
            format!(
                r#"<tr class="athing submission" id="{id}">
                     <td class="title"><span class="rank">{rank}.</span></td>
                     <td class="title"><span class="titleline"><a href="{href}">{title}</a></span></td>
                   </tr>
                   <tr><td class="subtext">1 point</td></tr>"#,
                rank = i + 1
            )
        })
        .collect();

    format!(
        r#"<html><body><center><table id="hnmain"><tr><td><table>{rows}</table></td></tr></table></center></body></html>"#
    )
}

/// Story detail page with `(comment id, [links])` comments
fn story_page(id: &str, title: &str, href: &str, comments: &[(&str, Vec<String>)]) -> String {
    let rows: String = comments
        .iter()
        .map(|(comment_id, links)| {
            let anchors: String = links
                .iter()
                .map(|l| format!(r#" <a href="{l}" rel="nofollow">{l}</a>"#))
                .collect();
            format!(
                r#"<tr class="athing comtr" id="{comment_id}"><td><table><tr><td class="default">
                     <div class="comment"><div class="commtext c00">Look:{anchors}</div>
                     <div class="reply"><a href="reply?id={comment_id}">reply</a></div></div>
                   </td></tr></table></td></tr>"#
            )
        })
        .collect();

    format!(
        r#"<html><body><table id="hnmain"><tr><td>
             <table class="fatitem"><tr class="athing submission" id="{id}">
               <td class="title"><span class="titleline"><a href="{href}">{title}</a></span></td>
             </tr></table>
             <table class="comment-tree">{rows}</table>
           </td></tr></table></body></html>"#
    )
}

/// 200 response typed as HTML
///
/// `set_body_string` would force `text/plain` over any inserted header.
fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8")
}

async fn mount_front_page(server: &MockServer, body: String) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(body))
        .mount(server)
        .await;
}

async fn mount_story(server: &MockServer, id: &str, body: String) {
    Mock::given(method("GET"))
        .and(path("/item"))
        .and(query_param("id", id))
        .respond_with(html(body))
        .mount(server)
        .await;
}

/// Detail page with comments but no title line
fn untitled_story_page() -> String {
    r#"<html><body><table id="hnmain"><tr><td>
         <table class="comment-tree"></table>
       </td></tr></table></body></html>"#
        .to_string()
}

/// Archiver whose writes always fail
struct ReadOnlyArchiver;

#[async_trait]
impl Archiver for ReadOnlyArchiver {
    async fn persist(&self, relative_path: &Path, _payload: Bytes) -> ArchiveResult<PathBuf> {
        Err(ArchiveError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            format!("read-only archive: {}", relative_path.display()),
        )))
    }
}

/// Counts recorded requests for `path`
async fn requests_to(server: &MockServer, path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == path)
        .count()
}

/// Counts recorded requests for the detail page of `id`
async fn story_requests(server: &MockServer, id: &str) -> usize {
    let expected = format!("id={}", id);
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == "/item" && r.url.query() == Some(expected.as_str()))
        .count()
}

#[tokio::test]
async fn test_single_cycle_archives_story_and_comment_link() {
    let server = MockServer::start().await;
    let base = server.uri();
    let archive = TempDir::new().unwrap();

    mount_front_page(&server, front_page(&[("123", "Hello World", "http://x/a")])).await;
    mount_story(
        &server,
        "123",
        story_page(
            "123",
            "Hello World",
            "http://x/a",
            &[("456", vec![format!("{}/b", base)])],
        ),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(html("<html><body>linked</body></html>".to_string()))
        .mount(&server)
        .await;

    let config = create_test_config(&base, archive.path());
    let mut crawl = CrawlLoop::new(&config, CancellationToken::new()).unwrap();
    let reason = crawl.run().await.expect("Crawl failed");

    assert_eq!(reason, StopReason::Completed);
    assert_eq!(crawl.state(), CrawlState::Stopped);

    let story_file = archive.path().join("123").join("Hello World.html");
    assert!(story_file.is_file(), "missing {}", story_file.display());
    let story_body = std::fs::read_to_string(&story_file).unwrap();
    assert!(story_body.contains("comment-tree"));

    let comment_file = archive.path().join("123/comments/456_0.html");
    assert_eq!(
        std::fs::read_to_string(&comment_file).unwrap(),
        "<html><body>linked</body></html>"
    );

    let entry = crawl.seen().get("123").expect("story should be recorded");
    assert_eq!(entry.title, "Hello World");
    assert_eq!(entry.url, "http://x/a");
}

#[tokio::test]
async fn test_seen_story_is_not_processed_again() {
    let server = MockServer::start().await;
    let archive = TempDir::new().unwrap();

    mount_front_page(&server, front_page(&[("1", "One", "http://x/1")])).await;
    mount_story(&server, "1", story_page("1", "One", "http://x/1", &[])).await;

    let mut config = create_test_config(&server.uri(), archive.path());
    config.crawler.run_once = false;
    let mut crawl = CrawlLoop::new(&config, CancellationToken::new()).unwrap();

    let first = crawl.run_cycle().await.unwrap();
    assert_eq!(first.stories_archived, 1);
    assert_eq!(crawl.state(), CrawlState::Sleeping);

    let second = crawl.run_cycle().await.unwrap();
    assert_eq!(second.stories_archived, 0);
    assert_eq!(second.stories_already_seen, 1);

    assert_eq!(story_requests(&server, "1").await, 1);
    assert_eq!(crawl.seen().len(), 1);
    assert_eq!(crawl.cycles(), 2);
}

#[tokio::test]
async fn test_only_top_stories_dispatched_in_order() {
    let server = MockServer::start().await;
    let archive = TempDir::new().unwrap();

    let stories = [
        ("11", "Eleven", "http://x/11"),
        ("12", "Twelve", "http://x/12"),
        ("13", "Thirteen", "http://x/13"),
        ("14", "Fourteen", "http://x/14"),
    ];
    mount_front_page(&server, front_page(&stories)).await;
    for (id, title, href) in stories {
        mount_story(&server, id, story_page(id, title, href, &[])).await;
    }

    let mut config = create_test_config(&server.uri(), archive.path());
    config.crawler.top_news_count = 2;
    let mut crawl = CrawlLoop::new(&config, CancellationToken::new()).unwrap();

    let stats = crawl.run_cycle().await.unwrap();

    assert_eq!(stats.stories_listed, 4);
    assert_eq!(stats.stories_considered, 2);
    let ids: Vec<&str> = crawl.seen().iter().map(|(id, _)| id).collect();
    assert_eq!(ids, vec!["11", "12"]);
    assert_eq!(story_requests(&server, "13").await, 0);
    assert_eq!(story_requests(&server, "14").await, 0);
}

#[tokio::test]
async fn test_links_in_one_comment_get_ordinal_names() {
    let server = MockServer::start().await;
    let base = server.uri();
    let archive = TempDir::new().unwrap();

    mount_front_page(&server, front_page(&[("7", "Seven", "http://x/7")])).await;
    mount_story(
        &server,
        "7",
        story_page(
            "7",
            "Seven",
            "http://x/7",
            &[(
                "70",
                vec![format!("{}/slow", base), format!("{}/files/paper.pdf?dl=1", base)],
            )],
        ),
    )
    .await;
    // The first link finishes last
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html("slow".to_string()).set_delay(Duration::from_millis(300)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/paper.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"%PDF-1.4".to_vec())
                .insert_header("content-type", "application/pdf"),
        )
        .mount(&server)
        .await;

    let config = create_test_config(&base, archive.path());
    let mut crawl = CrawlLoop::new(&config, CancellationToken::new()).unwrap();
    let stats = crawl.run_cycle().await.unwrap();

    assert_eq!(stats.comment_links_archived, 2);
    let comments = archive.path().join("7/comments");
    assert_eq!(std::fs::read(comments.join("70_0.html")).unwrap(), b"slow");
    assert_eq!(
        std::fs::read(comments.join("70_1_paper.pdf")).unwrap(),
        b"%PDF-1.4"
    );
}

#[tokio::test]
async fn test_failed_comment_link_does_not_abort_story() {
    let server = MockServer::start().await;
    let base = server.uri();
    let archive = TempDir::new().unwrap();

    mount_front_page(&server, front_page(&[("5", "Five", "http://x/5")])).await;
    mount_story(
        &server,
        "5",
        story_page(
            "5",
            "Five",
            "http://x/5",
            &[
                ("50", vec![format!("{}/missing", base), format!("{}/ok", base)]),
                ("51", vec![format!("{}/also-ok", base)]),
            ],
        ),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("gone"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(html("ok".to_string()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/also-ok"))
        .respond_with(html("also ok".to_string()))
        .mount(&server)
        .await;

    let config = create_test_config(&base, archive.path());
    let mut crawl = CrawlLoop::new(&config, CancellationToken::new()).unwrap();
    let stats = crawl.run_cycle().await.unwrap();

    assert_eq!(stats.stories_archived, 1);
    assert_eq!(stats.comment_links_archived, 2);
    assert_eq!(stats.comment_links_failed, 1);

    let comments = archive.path().join("5/comments");
    assert!(!comments.join("50_0.html").exists());
    assert!(comments.join("50_1.html").is_file());
    assert!(comments.join("51_0.html").is_file());
    assert!(crawl.seen().contains("5"));
}

#[tokio::test]
async fn test_unfetchable_story_retried_next_cycle() {
    let server = MockServer::start().await;
    let archive = TempDir::new().unwrap();

    mount_front_page(
        &server,
        front_page(&[("1", "Broken", "http://x/1"), ("2", "Fine", "http://x/2")]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/item"))
        .and(query_param("id", "1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_story(&server, "2", story_page("2", "Fine", "http://x/2", &[])).await;

    let mut config = create_test_config(&server.uri(), archive.path());
    config.crawler.run_once = false;
    let mut crawl = CrawlLoop::new(&config, CancellationToken::new()).unwrap();

    let first = crawl.run_cycle().await.unwrap();
    assert_eq!(first.stories_failed, 1);
    assert_eq!(first.stories_archived, 1);
    assert!(!crawl.seen().contains("1"));
    assert!(crawl.seen().contains("2"));

    let second = crawl.run_cycle().await.unwrap();
    assert_eq!(second.stories_failed, 1);
    assert_eq!(second.stories_already_seen, 1);

    assert_eq!(story_requests(&server, "1").await, 2);
    assert_eq!(story_requests(&server, "2").await, 1);
}

#[tokio::test]
async fn test_html_fixture_is_classified_as_html() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(html("<p>hi</p>".to_string()))
        .mount(&server)
        .await;

    let fetcher = Fetcher::new(&FetcherSettings::default()).unwrap();
    let result = fetcher.fetch(&format!("{}/page", server.uri())).await;

    assert_eq!(result.status, 200);
    assert_eq!(result.content_kind, ContentKind::Html);
}

#[tokio::test]
async fn test_headline_falls_back_to_front_page_entry() {
    let server = MockServer::start().await;
    let archive = TempDir::new().unwrap();

    mount_front_page(&server, front_page(&[("1", "From Front", "http://x/1")])).await;
    mount_story(&server, "1", untitled_story_page()).await;

    let config = create_test_config(&server.uri(), archive.path());
    let mut crawl = CrawlLoop::new(&config, CancellationToken::new()).unwrap();
    let stats = crawl.run_cycle().await.unwrap();

    assert_eq!(stats.stories_archived, 1);
    assert!(archive.path().join("1/From Front.html").is_file());
    let entry = crawl.seen().get("1").unwrap();
    assert_eq!(entry.title, "From Front");
    assert_eq!(entry.url, "http://x/1");
}

#[tokio::test]
async fn test_story_without_headline_is_retried() {
    let server = MockServer::start().await;
    let archive = TempDir::new().unwrap();

    mount_front_page(
        &server,
        front_page(&[("1", "Titled", "http://x/1"), ("2", "", "http://x/2")]),
    )
    .await;
    mount_story(&server, "1", untitled_story_page()).await;
    mount_story(&server, "2", untitled_story_page()).await;

    let mut config = create_test_config(&server.uri(), archive.path());
    config.crawler.run_once = false;
    let mut crawl = CrawlLoop::new(&config, CancellationToken::new()).unwrap();

    let first = crawl.run_cycle().await.unwrap();
    assert_eq!(first.stories_archived, 1);
    assert_eq!(first.stories_failed, 1);
    assert!(crawl.seen().contains("1"));
    assert!(!crawl.seen().contains("2"));
    assert!(!archive.path().join("2").exists());

    let second = crawl.run_cycle().await.unwrap();
    assert_eq!(second.stories_failed, 1);
    assert_eq!(story_requests(&server, "2").await, 2);
}

#[tokio::test]
async fn test_story_write_failure_skips_story() {
    let server = MockServer::start().await;
    let base = server.uri();
    let archive = TempDir::new().unwrap();

    mount_front_page(&server, front_page(&[("4", "Four", "http://x/4")])).await;
    mount_story(
        &server,
        "4",
        story_page("4", "Four", "http://x/4", &[("40", vec![format!("{}/c", base)])]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/c"))
        .respond_with(html("c".to_string()))
        .mount(&server)
        .await;

    let mut config = create_test_config(&base, archive.path());
    config.crawler.run_once = false;
    let site = url::Url::parse(&base).unwrap();
    let mut crawl = CrawlLoop::from_parts(
        &config,
        Fetcher::new(&FetcherSettings::from_config(&config)).unwrap(),
        Arc::new(HackerNewsExtractor::new(site)),
        Arc::new(ReadOnlyArchiver),
        CancellationToken::new(),
    )
    .unwrap();

    let first = crawl.run_cycle().await.unwrap();
    assert_eq!(first.stories_archived, 0);
    assert_eq!(first.stories_failed, 1);
    assert!(crawl.seen().is_empty());
    assert_eq!(requests_to(&server, "/c").await, 0);

    crawl.run_cycle().await.unwrap();
    assert_eq!(story_requests(&server, "4").await, 2);
}

#[tokio::test]
async fn test_front_page_failure_is_fatal() {
    let server = MockServer::start().await;
    let archive = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503).set_body_string("down"))
        .mount(&server)
        .await;

    let mut config = create_test_config(&server.uri(), archive.path());
    config.crawler.run_once = false;
    let mut crawl = CrawlLoop::new(&config, CancellationToken::new()).unwrap();

    let result = crawl.run().await;

    assert!(matches!(
        result,
        Err(CrawlerError::FrontPageUnavailable { status: 503, .. })
    ));
    assert_eq!(crawl.state(), CrawlState::Stopped);
    assert_eq!(crawl.cycles(), 1);
}

#[tokio::test]
async fn test_front_page_without_stories_is_fatal() {
    let server = MockServer::start().await;
    let archive = TempDir::new().unwrap();

    mount_front_page(&server, "<html><body>Sorry.</body></html>".to_string()).await;

    let config = create_test_config(&server.uri(), archive.path());
    let mut crawl = CrawlLoop::new(&config, CancellationToken::new()).unwrap();

    assert!(matches!(
        crawl.run().await,
        Err(CrawlerError::FrontPageUnavailable { status: 200, .. })
    ));
}

#[tokio::test]
async fn test_timeout_yields_sentinel_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html("late".to_string()).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let settings = FetcherSettings {
        max_concurrent: 2,
        request_timeout: Duration::from_millis(200),
        user_agent: "TestBot/1.0".to_string(),
        proxy: None,
    };
    let fetcher = Fetcher::new(&settings).unwrap();

    let result = fetcher.fetch(&format!("{}/slow", server.uri())).await;

    assert_eq!(result.status, TIMEOUT_STATUS);
    assert!(result.body.is_empty());
    assert!(result.is_timeout());
}

#[tokio::test]
async fn test_timed_out_comment_link_is_skipped() {
    let server = MockServer::start().await;
    let base = server.uri();
    let archive = TempDir::new().unwrap();

    mount_front_page(&server, front_page(&[("8", "Eight", "http://x/8")])).await;
    mount_story(
        &server,
        "8",
        story_page("8", "Eight", "http://x/8", &[("80", vec![format!("{}/hang", base)])]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/hang"))
        .respond_with(html("never".to_string()).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let config = create_test_config(&base, archive.path());
    let mut crawl = CrawlLoop::new(&config, CancellationToken::new()).unwrap();
    let stats = crawl.run_cycle().await.unwrap();

    assert_eq!(stats.stories_archived, 1);
    assert_eq!(stats.comment_links_failed, 1);
    assert!(archive.path().join("8/Eight.html").is_file());
    assert!(!archive.path().join("8/comments").exists());
}

#[tokio::test]
async fn test_concurrency_never_exceeds_limit() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(html("x".to_string()).set_delay(Duration::from_millis(100)))
        .mount(&server)
        .await;

    let settings = FetcherSettings {
        max_concurrent: 3,
        request_timeout: Duration::from_secs(5),
        user_agent: "TestBot/1.0".to_string(),
        proxy: None,
    };
    let fetcher = Fetcher::new(&settings).unwrap();

    let urls: Vec<String> = (0..20).map(|i| format!("{}/page{}", server.uri(), i)).collect();
    let results = futures::future::join_all(urls.iter().map(|u| fetcher.fetch(u))).await;

    assert!(results.iter().all(|r| r.status == 200));
    assert!(fetcher.peak_in_flight() <= 3);
    assert!(fetcher.peak_in_flight() >= 1);
    assert_eq!(fetcher.in_flight(), 0);
}

#[tokio::test]
async fn test_comment_fanout_shares_fetcher_limit() {
    let server = MockServer::start().await;
    let base = server.uri();
    let archive = TempDir::new().unwrap();

    let links: Vec<String> = (0..12).map(|i| format!("{}/r{}", base, i)).collect();
    mount_front_page(&server, front_page(&[("9", "Nine", "http://x/9")])).await;
    mount_story(
        &server,
        "9",
        story_page("9", "Nine", "http://x/9", &[("90", links)]),
    )
    .await;
    Mock::given(method("GET"))
        .respond_with(html("r".to_string()).set_delay(Duration::from_millis(50)))
        .mount(&server)
        .await;

    let mut config = create_test_config(&base, archive.path());
    config.crawler.max_concurrent_fetches = 2;
    config.crawler.comment_fanout = Some(8);

    let settings = FetcherSettings::from_config(&config);
    let fetcher = Fetcher::new(&settings).unwrap();
    let site = url::Url::parse(&base).unwrap();
    let mut crawl = CrawlLoop::from_parts(
        &config,
        fetcher,
        Arc::new(HackerNewsExtractor::new(site)),
        Arc::new(FsArchiver::new(archive.path())),
        CancellationToken::new(),
    )
    .unwrap();

    let stats = crawl.run_cycle().await.unwrap();

    assert_eq!(stats.comment_links_archived, 12);
    assert!(crawl.fetcher().peak_in_flight() <= 2);
    for i in 0..12 {
        assert!(archive
            .path()
            .join(format!("9/comments/90_{}.html", i))
            .is_file());
    }
}

#[tokio::test]
async fn test_write_index_lists_archived_stories() {
    let server = MockServer::start().await;
    let archive = TempDir::new().unwrap();

    mount_front_page(&server, front_page(&[("3", "Three", "http://x/3")])).await;
    mount_story(&server, "3", story_page("3", "Three", "http://x/3", &[])).await;

    let mut config = create_test_config(&server.uri(), archive.path());
    config.output.write_index = true;
    let mut crawl = CrawlLoop::new(&config, CancellationToken::new()).unwrap();
    crawl.run().await.unwrap();

    let index = std::fs::read_to_string(archive.path().join("index.md")).unwrap();
    assert!(index.contains("| 3 | [Three](<3/Three.html>)"));
}

#[tokio::test]
async fn test_cancellation_stops_continuous_run() {
    let server = MockServer::start().await;
    let archive = TempDir::new().unwrap();

    mount_front_page(&server, front_page(&[("1", "One", "http://x/1")])).await;
    mount_story(&server, "1", story_page("1", "One", "http://x/1", &[])).await;

    let mut config = create_test_config(&server.uri(), archive.path());
    config.crawler.run_once = false;
    config.crawler.poll_interval = 3600;

    let cancel = CancellationToken::new();
    let mut crawl = CrawlLoop::new(&config, cancel.clone()).unwrap();

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        cancel.cancel();
    });

    let reason = tokio::time::timeout(Duration::from_secs(10), crawl.run())
        .await
        .expect("run should stop after cancellation")
        .unwrap();
    canceller.await.unwrap();

    assert_eq!(reason, StopReason::Cancelled);
    assert_eq!(crawl.state(), CrawlState::Stopped);
    assert!(crawl.seen().contains("1"));
}
