//! Integration tests for the crawler
//!
//! Traversal properties are checked against the in-memory fixture; the
//! HTTP fetcher is exercised end-to-end against wiremock servers.

use ripple_crawl::crawler::{CancelToken, Coordinator};
use ripple_crawl::fetch::{FixtureFetcher, HttpFetcher};
use ripple_crawl::output::{CrawlReport, MemorySink};
use ripple_crawl::config::UserAgentConfig;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn run_fixture(
    fetcher: &Arc<FixtureFetcher>,
    seed: &str,
    depth: u32,
) -> (CrawlReport, MemorySink) {
    let mut sink = MemorySink::new();
    let report = Coordinator::new(Arc::clone(fetcher))
        .run(seed, depth, &mut sink)
        .await;
    (report, sink)
}

fn assert_each_fetched_once(fetcher: &FixtureFetcher) {
    let calls = fetcher.calls();
    let unique: HashSet<&String> = calls.iter().collect();
    assert_eq!(unique.len(), calls.len(), "duplicate fetches: {:?}", calls);
}

#[tokio::test]
async fn test_triangle_at_depth_one() {
    let fetcher = Arc::new(
        FixtureFetcher::builder()
            .page("A", "alpha", ["B", "C"])
            .page("B", "beta", ["A"])
            .page("C", "gamma", Vec::<String>::new())
            .build(),
    );

    let (report, sink) = run_fixture(&fetcher, "A", 1).await;

    let lines = sink.lines();
    assert_eq!(lines[0], r#"found: A "alpha""#);
    let rest: HashSet<&str> = lines[1..].iter().map(String::as_str).collect();
    assert_eq!(
        rest,
        HashSet::from([r#"found: B "beta""#, r#"found: C "gamma""#])
    );
    assert_eq!(fetcher.call_count("A"), 1);
    assert_eq!(report.found, 3);
}

#[tokio::test]
async fn test_missing_seed() {
    let fetcher = Arc::new(FixtureFetcher::builder().page("A", "alpha", ["B"]).build());

    let (report, sink) = run_fixture(&fetcher, "X", 5).await;

    assert_eq!(sink.lines(), vec!["not found: X".to_string()]);
    assert_eq!(fetcher.calls(), vec!["X"]);
    assert_eq!(report.completed(), 1);
}

#[tokio::test]
async fn test_depth_zero() {
    let fetcher = Arc::new(FixtureFetcher::builder().page("A", "alpha", ["B"]).build());

    let (_, sink) = run_fixture(&fetcher, "A", 0).await;

    assert_eq!(sink.found_ids(), vec!["A"]);
    assert_eq!(fetcher.call_count("B"), 0);
}

#[tokio::test]
async fn test_sample_site_full_crawl() {
    let fetcher = Arc::new(FixtureFetcher::sample_site());

    let (report, sink) = run_fixture(&fetcher, FixtureFetcher::SAMPLE_ROOT, 4).await;

    let found: HashSet<&str> = sink.found_ids().into_iter().collect();
    assert_eq!(
        found,
        HashSet::from([
            "http://golang.org/",
            "http://golang.org/pkg/",
            "http://golang.org/pkg/fmt/",
            "http://golang.org/pkg/os/",
        ])
    );
    assert_eq!(sink.failures(), vec!["not found: http://golang.org/cmd/"]);
    assert_eq!(report.dispatched, 5);
    assert_each_fetched_once(&fetcher);
}

#[tokio::test]
async fn test_uniqueness_under_concurrent_discovery() {
    // Every page links to every other page, so each node is discovered many times
    let ids = ["A", "B", "C", "D", "E", "F"];
    let mut builder = FixtureFetcher::builder().latency(Duration::from_millis(5));
    for id in ids {
        builder = builder.page(id, id, ids);
    }
    let fetcher = Arc::new(builder.build());

    let (report, sink) = run_fixture(&fetcher, "A", 10).await;

    assert_eq!(sink.found_ids().len(), ids.len());
    assert_each_fetched_once(&fetcher);
    assert_eq!(report.dispatched, ids.len());
    assert!(report.duplicates_skipped > 0);
}

#[tokio::test]
async fn test_children_are_fetched_in_parallel() {
    let mut builder = FixtureFetcher::builder().page("root", "root", ["a", "b", "c", "d"]);
    for id in ["a", "b", "c", "d"] {
        builder = builder.page(id, id, Vec::<String>::new());
    }
    let fetcher = Arc::new(builder.latency(Duration::from_millis(20)).build());

    let (report, _) = run_fixture(&fetcher, "root", 1).await;

    assert_eq!(report.found, 5);
    assert_eq!(report.peak_in_flight, 4);
}

#[tokio::test]
async fn test_depth_boundary_is_respected() {
    // A chain: 0 -> 1 -> 2 -> 3 -> 4
    let mut builder = FixtureFetcher::builder();
    for i in 0..5 {
        let next = (i + 1).to_string();
        builder = builder.page(&i.to_string(), "page", [next]);
    }
    let fetcher = Arc::new(builder.build());

    let (report, sink) = run_fixture(&fetcher, "0", 2).await;

    assert_eq!(sink.found_ids(), vec!["0", "1", "2"]);
    assert_eq!(fetcher.call_count("3"), 0);
    assert_eq!(report.depth_exhausted, 1);
}

#[tokio::test]
async fn test_failure_does_not_stop_siblings() {
    let fetcher = Arc::new(
        FixtureFetcher::builder()
            .page("A", "alpha", ["missing", "B", "gone", "C"])
            .page("B", "beta", ["D"])
            .page("C", "gamma", Vec::<String>::new())
            .page("D", "delta", Vec::<String>::new())
            .delay("B", Duration::from_millis(20))
            .build(),
    );

    let (report, sink) = run_fixture(&fetcher, "A", 2).await;

    let found: HashSet<&str> = sink.found_ids().into_iter().collect();
    assert_eq!(found, HashSet::from(["A", "B", "C", "D"]));
    let failures: HashSet<&str> = sink.failures().into_iter().collect();
    assert_eq!(
        failures,
        HashSet::from(["not found: missing", "not found: gone"])
    );
    assert_eq!(report.failed, 2);
    assert_eq!(report.found, 4);
}

#[tokio::test]
async fn test_slow_first_child_does_not_block_others() {
    let fetcher = Arc::new(
        FixtureFetcher::builder()
            .page("root", "root", ["slow", "fast"])
            .page("slow", "slow", Vec::<String>::new())
            .page("fast", "fast", Vec::<String>::new())
            .delay("slow", Duration::from_millis(100))
            .build(),
    );

    let (_, sink) = run_fixture(&fetcher, "root", 1).await;

    assert_eq!(sink.found_ids(), vec!["root", "fast", "slow"]);
}

#[tokio::test]
async fn test_cancel_mid_crawl() {
    let fetcher = Arc::new(
        FixtureFetcher::builder()
            .page("root", "root", ["stuck"])
            .page("stuck", "stuck", Vec::<String>::new())
            .delay("stuck", Duration::from_secs(30))
            .build(),
    );
    let cancel = CancelToken::new();
    let coordinator = Coordinator::new(Arc::clone(&fetcher)).with_cancel_token(cancel.clone());

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
    });

    let mut sink = MemorySink::new();
    let report = tokio::time::timeout(Duration::from_secs(5), coordinator.run("root", 1, &mut sink))
        .await
        .expect("cancelled crawl should return");

    assert!(report.cancelled);
    assert_eq!(report.abandoned, 1);
    assert_eq!(sink.found_ids(), vec!["root"]);
}

#[tokio::test]
async fn test_fetch_timeout_is_a_dead_end() {
    let fetcher = Arc::new(
        FixtureFetcher::builder()
            .page("root", "root", ["slow", "ok"])
            .page("slow", "slow", ["never"])
            .page("ok", "ok", Vec::<String>::new())
            .delay("slow", Duration::from_secs(30))
            .build(),
    );

    let mut sink = MemorySink::new();
    let report = Coordinator::new(Arc::clone(&fetcher))
        .with_fetch_timeout(Duration::from_millis(50))
        .run("root", 3, &mut sink)
        .await;

    assert_eq!(sink.failures(), vec!["timed out after 50ms fetching slow"]);
    assert_eq!(fetcher.call_count("never"), 0);
    assert_eq!(report.found, 2);
}

// HTTP fetcher, end to end

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html")
}

async fn mount_page(server: &MockServer, route: &str, title: &str, links: &[String]) {
    let anchors: String = links
        .iter()
        .map(|link| format!(r#"<a href="{}">link</a>"#, link))
        .collect();
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(format!(
            "<html><head><title>{}</title></head><body>{}</body></html>",
            title, anchors
        )))
        .expect(1)
        .mount(server)
        .await;
}

fn http_fetcher() -> HttpFetcher {
    HttpFetcher::from_config(&UserAgentConfig::default(), Some(Duration::from_secs(5)))
        .expect("client should build")
}

#[tokio::test]
async fn test_http_crawl_single_site() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        "Home",
        &[
            format!("{}/page1", base),
            "/page2".to_string(),
            format!("{}/page1#section", base),
        ],
    )
    .await;
    mount_page(&server, "/page1", "Page 1", &[format!("{}/", base)]).await;
    mount_page(&server, "/page2", "Page 2", &["/missing".to_string()]).await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let seed = format!("{}/", base);
    let mut sink = MemorySink::new();
    let report = Coordinator::new(http_fetcher())
        .run(&seed, 2, &mut sink)
        .await;

    let lines: HashSet<String> = sink.lines().into_iter().collect();
    assert!(lines.contains(&format!(r#"found: {}/ "Home""#, base)));
    assert!(lines.contains(&format!(r#"found: {}/page1 "Page 1""#, base)));
    assert!(lines.contains(&format!(r#"found: {}/page2 "Page 2""#, base)));
    assert!(lines.contains(&format!("not found: {}/missing", base)));
    assert_eq!(report.found, 3);
    assert_eq!(report.failed, 1);
    // Mock expectations verify each page was requested exactly once
}

#[tokio::test]
async fn test_http_depth_limit() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", "Home", &["/level1".to_string()]).await;
    mount_page(&server, "/level1", "Level 1", &["/level2".to_string()]).await;
    Mock::given(method("GET"))
        .and(path("/level2"))
        .respond_with(html("<html></html>".to_string()))
        .expect(0)
        .mount(&server)
        .await;

    let mut sink = MemorySink::new();
    Coordinator::new(http_fetcher())
        .run(&format!("{}/", base), 1, &mut sink)
        .await;

    assert_eq!(
        sink.found_ids(),
        vec![format!("{}/", base).as_str(), format!("{}/level1", base).as_str()]
    );
}

#[tokio::test]
async fn test_http_non_html_is_a_failure() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", "Home", &["/data.json".to_string()]).await;
    Mock::given(method("GET"))
        .and(path("/data.json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
        .mount(&server)
        .await;

    let mut sink = MemorySink::new();
    let report = Coordinator::new(http_fetcher())
        .run(&format!("{}/", base), 1, &mut sink)
        .await;

    assert_eq!(report.failed, 1);
    let failure = sink.failures()[0].to_string();
    assert!(failure.contains("expected HTML"), "{}", failure);
    assert!(failure.contains("application/json"), "{}", failure);
}

#[tokio::test]
async fn test_http_server_error_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let seed = format!("{}/", server.uri());
    let mut sink = MemorySink::new();
    Coordinator::new(http_fetcher()).run(&seed, 1, &mut sink).await;

    assert_eq!(sink.failures(), vec![format!("HTTP 503 for {}", seed).as_str()]);
}

#[tokio::test]
async fn test_http_same_host_restriction() {
    let local = MockServer::start().await;
    let remote = MockServer::start().await;

    // Two wiremock servers share a host and differ by port, so use a different host name
    let remote_link = remote.uri().replace("127.0.0.1", "localhost");

    mount_page(
        &local,
        "/",
        "Home",
        &["/inside".to_string(), format!("{}/outside", remote_link)],
    )
    .await;
    mount_page(&local, "/inside", "Inside", &[]).await;
    Mock::given(method("GET"))
        .and(path("/outside"))
        .respond_with(html("<html></html>".to_string()))
        .expect(0)
        .mount(&remote)
        .await;

    let seed = format!("{}/", local.uri());
    let fetcher = http_fetcher().restrict_to_host_of(&seed);
    let mut sink = MemorySink::new();
    let report = Coordinator::new(fetcher).run(&seed, 2, &mut sink).await;

    assert_eq!(report.found, 2);
    assert_eq!(report.dispatched, 2);
}

#[tokio::test]
async fn test_http_normalized_seed_is_fetched_once() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", "Home", &["/about".to_string()]).await;
    mount_page(&server, "/about", "About", &[format!("{}/#top", base)]).await;

    // No trailing slash: the raw seed differs from the link the page reports
    let seed = HttpFetcher::normalize_seed(&base).expect("seed should normalize");
    assert_eq!(seed, format!("{}/", base));

    let mut sink = MemorySink::new();
    let report = Coordinator::new(http_fetcher()).run(&seed, 3, &mut sink).await;

    assert_eq!(report.found, 2);
    assert_eq!(report.duplicates_skipped, 1);
    // Mock expectations verify the root was requested exactly once
}
