use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use wayparam::{run_harvest, ArchiveSource, Domain, FetchError, HarvestConfig, UrlStream};

/// Serves canned URL lists; domains without an entry get HTTP 500.
#[derive(Default)]
struct CannedSource {
    urls: HashMap<String, Vec<String>>,
    delay: Duration,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl CannedSource {
    fn with(mut self, domain: &str, urls: &[&str]) -> Self {
        self.urls
            .insert(domain.to_string(), urls.iter().map(|u| u.to_string()).collect());
        self
    }
}

#[async_trait]
impl ArchiveSource for CannedSource {
    async fn open(&self, domain: &Domain) -> Result<UrlStream, FetchError> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.active.fetch_sub(1, Ordering::SeqCst);

        match self.urls.get(domain.as_str()) {
            Some(urls) => Ok(stream::iter(urls.clone().into_iter().map(Ok)).boxed()),
            None => Err(FetchError::Status { status: 500 }),
        }
    }
}

fn config(dir: &Path, concurrency: usize) -> HarvestConfig {
    HarvestConfig {
        concurrency,
        filter_workers: 2,
        all_urls_path: dir.join("all_urls.txt"),
        param_urls_path: dir.join("param_urls.txt"),
        ..HarvestConfig::default()
    }
}

fn domains(names: &[&str]) -> Vec<Domain> {
    names.iter().filter_map(|n| Domain::parse(n)).collect()
}

fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn two_domains_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), 2);
    let source = Arc::new(
        CannedSource::default()
            .with("a.com", &["http://a.com/x?y=1", "http://a.com/z"])
            .with("b.com", &["http://b.com/?q=2"]),
    );

    let summary = run_harvest(source, domains(&["a.com", "b.com"]), &config)
        .await
        .unwrap();

    assert_eq!(summary.domains, 2);
    assert_eq!(summary.totals.domains_completed, 2);
    assert_eq!(summary.totals.total_urls, 3);
    assert_eq!(summary.totals.param_urls, 2);
    assert!(summary.totals.failed.is_empty());

    let mut all = read_lines(&config.all_urls_path);
    all.sort();
    assert_eq!(all, vec!["http://a.com/x?y=1", "http://a.com/z", "http://b.com/?q=2"]);

    // a.com's block stays contiguous whatever order the domains finished in.
    let raw = read_lines(&config.all_urls_path);
    let a_pos = raw.iter().position(|l| l == "http://a.com/x?y=1").unwrap();
    assert_eq!(raw[a_pos + 1], "http://a.com/z");

    let mut params = read_lines(&config.param_urls_path);
    params.sort();
    assert_eq!(params, vec!["http://a.com/x?y=1", "http://b.com/?q=2"]);
}

#[tokio::test]
async fn failed_domain_does_not_stop_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), 4);
    let source = Arc::new(
        CannedSource::default()
            .with("a.com", &["http://a.com/?id=1"])
            .with("c.com", &["http://c.com/plain"]),
    );

    let summary = run_harvest(source, domains(&["a.com", "down.com", "c.com"]), &config)
        .await
        .unwrap();

    assert_eq!(summary.totals.domains_completed, 2);
    assert_eq!(summary.totals.failed.len(), 1);
    assert_eq!(summary.totals.failed[0].domain.as_str(), "down.com");
    assert!(summary.totals.failed[0].reason.contains("500"));
    assert_eq!(read_lines(&config.all_urls_path).len(), 2);
    assert_eq!(read_lines(&config.param_urls_path), vec!["http://a.com/?id=1"]);
}

#[tokio::test]
async fn rerun_starts_from_clean_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), 2);
    std::fs::write(&config.all_urls_path, "left over from a crashed run\n").unwrap();

    for _ in 0..2 {
        let source = Arc::new(CannedSource::default().with("a.com", &["http://a.com/?k=v"]));
        run_harvest(source, domains(&["a.com"]), &config).await.unwrap();
    }

    assert_eq!(read_lines(&config.all_urls_path), vec!["http://a.com/?k=v"]);
    assert_eq!(read_lines(&config.param_urls_path), vec!["http://a.com/?k=v"]);
}

#[tokio::test]
async fn concurrent_domains_are_capped() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), 3);
    let names: Vec<String> = (0..12).map(|i| format!("d{i}.com")).collect();

    let mut source = CannedSource {
        delay: Duration::from_millis(20),
        ..CannedSource::default()
    };
    for name in &names {
        let url = format!("http://{name}/?i=1");
        source = source.with(name, &[url.as_str()]);
    }
    let source = Arc::new(source);

    let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let summary = run_harvest(Arc::clone(&source), domains(&name_refs), &config)
        .await
        .unwrap();

    assert_eq!(summary.totals.domains_completed, 12);
    assert!(source.peak.load(Ordering::SeqCst) <= 3);
    assert_eq!(read_lines(&config.param_urls_path).len(), 12);
}

#[tokio::test]
async fn empty_domain_list_finishes_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), 2);

    let summary = run_harvest(Arc::new(CannedSource::default()), Vec::new(), &config)
        .await
        .unwrap();

    assert_eq!(summary.totals.domains_completed, 0);
    assert!(read_lines(&config.all_urls_path).is_empty());
}
