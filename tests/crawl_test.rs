use anyhow::Result;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use site_mirror::crawler::config::default_extensions;
use site_mirror::url_parser::map_url_to_path;
use site_mirror::{CrawlConfig, Crawler, NormalizedUrl, PageResult, RenderError, Renderer, ScopeFilter};

/// In-memory site: URL -> HTML. URLs missing from the map fail to render.
struct MockSite {
    pages: HashMap<String, String>,
    failing: HashSet<String>,
    calls: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
    cancel_after: Option<(usize, Arc<AtomicBool>)>,
}

impl MockSite {
    fn new(pages: &[(&str, &str)]) -> Self {
        Self {
            pages: pages.iter().map(|(u, h)| (u.to_string(), h.to_string())).collect(),
            failing: HashSet::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
            closed: Arc::new(AtomicBool::new(false)),
            cancel_after: None,
        }
    }

    fn failing_on(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    fn cancelling_after(mut self, renders: usize, flag: Arc<AtomicBool>) -> Self {
        self.cancel_after = Some((renders, flag));
        self
    }
}

#[async_trait]
impl Renderer for MockSite {
    async fn render(&mut self, url: &NormalizedUrl, timeout: Duration) -> PageResult {
        let calls = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(url.to_string());
            calls.len()
        };
        if let Some((limit, flag)) = &self.cancel_after {
            if calls >= *limit {
                flag.store(true, Ordering::Release);
            }
        }

        if self.failing.contains(url.as_str()) {
            return PageResult::Failed { url: url.clone(), error: RenderError::Timeout(timeout) };
        }
        match self.pages.get(url.as_str()) {
            Some(html) => PageResult::Rendered { url: url.clone(), html: html.clone() },
            None => PageResult::Failed {
                url: url.clone(),
                error: RenderError::Navigation("net::ERR_ABORTED 404".to_string()),
            },
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

fn config(seed: &str, output: &Path) -> CrawlConfig {
    CrawlConfig::new(seed, output).with_politeness_delay(Duration::ZERO)
}

fn docs_site() -> MockSite {
    MockSite::new(&[
        (
            "https://example.test/docs/",
            r#"<html><body>
                <a href="a.html">A</a>
                <a href="b.html">B</a>
                <a href="https://other.test/x">elsewhere</a>
            </body></html>"#,
        ),
        ("https://example.test/docs/a.html", r#"<html><body><a href="/docs/">up</a></body></html>"#),
        ("https://example.test/docs/b.html", "<html><body>leaf</body></html>"),
        ("https://other.test/x", "<html>must never be rendered</html>"),
    ])
}

fn read_tree(root: &Path) -> Vec<(String, Vec<u8>)> {
    fn walk(dir: &Path, root: &Path, out: &mut Vec<(String, Vec<u8>)>) {
        for entry in std::fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(&path, root, out);
            } else {
                let relative = path.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/");
                out.push((relative, std::fs::read(&path).unwrap()));
            }
        }
    }
    let mut files = Vec::new();
    walk(root, root, &mut files);
    files.sort();
    files
}

#[tokio::test]
async fn test_docs_scenario_writes_three_files() {
    let dir = tempfile::tempdir().unwrap();
    let site = docs_site();
    let calls = site.calls.clone();

    let summary = Crawler::new(site, config("https://example.test/docs/", dir.path()))
        .run()
        .await
        .unwrap();

    assert_eq!(summary.visited, 3);
    assert_eq!(summary.rendered, 3);
    assert!(summary.render_failures.is_empty());
    assert_eq!(summary.pending, 0);

    let files: Vec<String> = read_tree(dir.path()).into_iter().map(|(p, _)| p).collect();
    assert_eq!(files, vec!["docs/a.html", "docs/b.html", "docs/index.html"]);

    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 3);
    assert!(!calls.iter().any(|c| c.starts_with("https://other.test")));
}

#[tokio::test]
async fn test_cyclic_site_terminates_and_visits_each_page_once() {
    let dir = tempfile::tempdir().unwrap();
    // 5 pages: a ring p0 -> p1 -> ... -> p4 -> seed, plus extra cross links
    let site = MockSite::new(&[
        ("https://example.test/site/", r#"<a href="p1">1</a><a href="p3">3</a>"#),
        ("https://example.test/site/p1", r#"<a href="p2">2</a><a href="/site/">home</a>"#),
        ("https://example.test/site/p2", r#"<a href="p3">3</a><a href="p1#again">1</a>"#),
        ("https://example.test/site/p3", r#"<a href="p4">4</a><a href="p2">2</a>"#),
        ("https://example.test/site/p4", r#"<a href="https://example.test/site/">seed</a>"#),
    ]);
    let calls = site.calls.clone();

    let summary = Crawler::new(site, config("https://example.test/site/", dir.path()))
        .run()
        .await
        .unwrap();

    let calls = calls.lock().unwrap();
    let unique: HashSet<&String> = calls.iter().collect();
    assert_eq!(calls.len(), 5);
    assert_eq!(unique.len(), 5);
    assert_eq!(summary.visited, 5);
    assert_eq!(summary.saved.len(), 5);
    assert!(dir.path().join("site/p4/index.html").exists());
}

#[tokio::test]
async fn test_failed_page_is_skipped_and_crawl_completes() {
    let dir = tempfile::tempdir().unwrap();
    let site = MockSite::new(&[
        ("https://example.test/docs/", r#"<a href="ok.html">ok</a><a href="broken.html">broken</a>"#),
        ("https://example.test/docs/ok.html", "<p>fine</p>"),
        ("https://example.test/docs/broken.html", r#"<a href="hidden.html">only linked from here</a>"#),
        ("https://example.test/docs/hidden.html", "<p>unreachable</p>"),
    ])
    .failing_on("https://example.test/docs/broken.html");

    let summary = Crawler::new(site, config("https://example.test/docs/", dir.path()))
        .run()
        .await
        .unwrap();

    assert_eq!(summary.visited, 3);
    assert_eq!(summary.saved.len(), 2);
    assert_eq!(summary.render_failures.len(), 1);
    assert_eq!(summary.render_failures[0].url.as_str(), "https://example.test/docs/broken.html");
    assert!(summary.render_failures[0].reason.contains("timed out"));

    assert!(dir.path().join("docs/index.html").exists());
    assert!(dir.path().join("docs/ok.html").exists());
    assert!(!dir.path().join("docs/broken.html").exists());
    assert!(!dir.path().join("docs/hidden.html").exists());
}

#[tokio::test]
async fn test_rerun_produces_identical_tree() {
    let dir = tempfile::tempdir().unwrap();

    Crawler::new(docs_site(), config("https://example.test/docs/", dir.path()))
        .run()
        .await
        .unwrap();
    let first = read_tree(dir.path());

    Crawler::new(docs_site(), config("https://example.test/docs/", dir.path()))
        .run()
        .await
        .unwrap();
    let second = read_tree(dir.path());

    assert_eq!(first.len(), 3);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_every_rendered_url_is_in_scope() {
    let dir = tempfile::tempdir().unwrap();
    let site = MockSite::new(&[
        (
            "https://example.test/docs/",
            r#"<a href="guide/">guide</a>
               <a href="manual.pdf">pdf</a>
               <a href="/blog/post.html">blog</a>
               <a href="http://example.test/docs/insecure.html">http</a>
               <a href="https://cdn.example.test/docs/x.html">cdn</a>
               <a href="mailto:docs@example.test">mail</a>
               <a href="javascript:void(0)">js</a>"#,
        ),
        ("https://example.test/docs/guide/", r#"<a href="../style.css">css</a><a href="intro">intro</a>"#),
        ("https://example.test/docs/guide/intro", "<p>intro</p>"),
    ]);
    let calls = site.calls.clone();
    let config = config("https://example.test/docs/", dir.path());
    let scope = ScopeFilter::from_config(&config).unwrap();

    let summary = Crawler::new(site, config).run().await.unwrap();

    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 3);
    for call in calls.iter() {
        assert!(scope.admits(&NormalizedUrl::parse(call).unwrap()), "{} escaped the scope", call);
    }
    assert_eq!(summary.saved.len(), 3);
    assert!(dir.path().join("docs/guide/intro/index.html").exists());
}

#[tokio::test]
async fn test_explicit_extension_set() {
    let dir = tempfile::tempdir().unwrap();
    let site = MockSite::new(&[
        ("https://example.test/docs/", r#"<a href="a.htm">a</a><a href="b.html">b</a>"#),
        ("https://example.test/docs/a.htm", "<p>a</p>"),
        ("https://example.test/docs/b.html", "<p>b</p>"),
    ]);
    let calls = site.calls.clone();
    let config = config("https://example.test/docs/", dir.path()).with_allowed_extensions(["", ".htm"]);

    Crawler::new(site, config).run().await.unwrap();

    let calls = calls.lock().unwrap();
    assert_eq!(*calls, vec!["https://example.test/docs/", "https://example.test/docs/a.htm"]);
}

#[tokio::test]
async fn test_cancellation_stops_at_next_page() {
    let dir = tempfile::tempdir().unwrap();
    let flag = Arc::new(AtomicBool::new(false));
    let site = docs_site().cancelling_after(1, flag.clone());
    let calls = site.calls.clone();
    let closed = site.closed.clone();

    let summary = Crawler::new(site, config("https://example.test/docs/", dir.path()))
        .with_shutdown_flag(flag)
        .run()
        .await
        .unwrap();

    assert!(summary.cancelled);
    assert_eq!(summary.visited, 1);
    assert_eq!(summary.pending, 2);
    assert_eq!(calls.lock().unwrap().len(), 1);
    assert!(dir.path().join("docs/index.html").exists());
    assert!(closed.load(Ordering::Acquire));
}

#[tokio::test]
async fn test_write_failure_does_not_abort_crawl() {
    let dir = tempfile::tempdir().unwrap();
    let site = MockSite::new(&[
        ("https://example.test/docs/", r#"<a href="blocked/page.html">x</a><a href="ok.html">ok</a>"#),
        ("https://example.test/docs/blocked/page.html", "<p>cannot be stored</p>"),
        ("https://example.test/docs/ok.html", "<p>ok</p>"),
    ]);
    std::fs::create_dir_all(dir.path().join("docs")).unwrap();
    std::fs::write(dir.path().join("docs/blocked"), "a file where a directory is needed").unwrap();

    let summary = Crawler::new(site, config("https://example.test/docs/", dir.path()))
        .run()
        .await
        .unwrap();

    assert_eq!(summary.visited, 3);
    assert_eq!(summary.rendered, 3);
    assert_eq!(summary.write_failures.len(), 1);
    assert_eq!(summary.write_failures[0].url.as_str(), "https://example.test/docs/blocked/page.html");
    assert!(dir.path().join("docs/ok.html").exists());
}

#[tokio::test]
async fn test_politeness_delay_between_pages() {
    let dir = tempfile::tempdir().unwrap();
    let delay = Duration::from_millis(40);
    let config = config("https://example.test/docs/", dir.path()).with_politeness_delay(delay);

    let started = Instant::now();
    let summary = Crawler::new(docs_site(), config).run().await.unwrap();

    // No pause is needed after the last page
    assert_eq!(summary.visited, 3);
    assert!(started.elapsed() >= delay * 2);
}

#[tokio::test]
async fn test_invalid_seed_is_a_setup_error() {
    let dir = tempfile::tempdir().unwrap();
    let site = MockSite::new(&[]);
    let calls = site.calls.clone();
    let closed = site.closed.clone();

    let result = Crawler::new(site, config("example.test/docs/", dir.path())).run().await;

    assert!(result.is_err());
    assert!(calls.lock().unwrap().is_empty());
    assert!(closed.load(Ordering::Acquire));
}

#[test]
fn test_path_mapping_matches_written_layout() {
    let url = NormalizedUrl::parse("https://example.test/docs/").unwrap();
    assert_eq!(map_url_to_path(&url), map_url_to_path(&url));
    assert_eq!(map_url_to_path(&url), Path::new("docs/index.html"));
    assert!(default_extensions().contains(""));
}
