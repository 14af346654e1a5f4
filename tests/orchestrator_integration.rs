//! Integration tests for batch orchestration.
//!
//! Catalog and transfer are in-process fakes so concurrency, deduplication
//! and cancellation can be observed without a network.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use beatportdl_core::{
    Catalog, DownloadError, FileDescriptor, FileSubmission, Orchestrator, ResolveError, Store,
    Transfer, WorkerPools,
};
use tokio::sync::Notify;

/// Tracks the current and peak number of concurrent callers.
#[derive(Default)]
struct Gauge {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl Gauge {
    fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }

    fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// Catalog answering from a fixed table, optionally slowly.
struct TableCatalog {
    table: HashMap<String, Vec<FileDescriptor>>,
    delay: Duration,
    gauge: Gauge,
}

impl TableCatalog {
    fn new(entries: Vec<(&str, Vec<FileDescriptor>)>) -> Self {
        Self {
            table: entries
                .into_iter()
                .map(|(url, files)| (url.to_string(), files))
                .collect(),
            delay: Duration::ZERO,
            gauge: Gauge::default(),
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl Catalog for TableCatalog {
    async fn resolve(&self, url: &str) -> Result<Vec<FileDescriptor>, ResolveError> {
        self.gauge.enter();
        tokio::time::sleep(self.delay).await;
        self.gauge.leave();
        self.table
            .get(url)
            .cloned()
            .ok_or_else(|| ResolveError::unsupported(url))
    }
}

/// Transfer that records calls, can be held at a gate, and fails on demand.
#[derive(Default)]
struct FakeTransfer {
    calls: Mutex<Vec<String>>,
    gauge: Gauge,
    delay: Duration,
    gated: bool,
    gate: Notify,
    failing: Vec<u64>,
}

impl FakeTransfer {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transfer for FakeTransfer {
    async fn transfer(
        &self,
        file: &FileDescriptor,
        output_dir: &Path,
    ) -> Result<PathBuf, DownloadError> {
        self.calls.lock().unwrap().push(file.file_id());
        self.gauge.enter();
        if self.gated {
            self.gate.notified().await;
        }
        tokio::time::sleep(self.delay).await;
        self.gauge.leave();
        if self.failing.contains(&file.track_id) {
            return Err(DownloadError::http_status("https://cdn.test/file", 500));
        }
        Ok(output_dir.join(format!("{}.flac", file.track_id)))
    }
}

fn track(id: u64) -> FileDescriptor {
    FileDescriptor::new(Store::Beatport, id)
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[tokio::test]
async fn test_same_file_from_many_urls_transfers_once() {
    let n = 8;
    let urls: Vec<String> = (0..n).map(|i| format!("https://x/{i}")).collect();
    let catalog = Arc::new(TableCatalog::new(
        urls.iter().map(|u| (u.as_str(), vec![track(42)])).collect(),
    ));
    let transfer = Arc::new(FakeTransfer {
        gated: true,
        ..FakeTransfer::default()
    });
    let orch = Orchestrator::new(
        WorkerPools::new(n, 4),
        catalog,
        Arc::clone(&transfer) as Arc<dyn Transfer>,
        "/out",
    );

    let batch = {
        let orch = orch.clone();
        let urls = urls.clone();
        tokio::spawn(async move { orch.run_batch(urls).await })
    };

    wait_until(|| orch.stats().duplicates_skipped() == n - 1).await;
    assert_eq!(orch.stats().urls_resolved(), n);
    assert!(orch.active_files().contains("beatport:42"));
    transfer.gate.notify_one();
    batch.await.unwrap();

    assert_eq!(transfer.calls(), vec!["beatport:42".to_string()]);
    assert_eq!(orch.stats().duplicates_skipped(), n - 1);
    assert_eq!(orch.stats().files_completed(), 1);
    assert!(!orch.active_files().contains("beatport:42"));
}

#[tokio::test]
async fn test_direct_duplicate_submissions_are_rejected_while_in_flight() {
    let transfer = Arc::new(FakeTransfer {
        gated: true,
        ..FakeTransfer::default()
    });
    let orch = Orchestrator::new(
        WorkerPools::new(1, 1),
        Arc::new(TableCatalog::new(Vec::new())),
        Arc::clone(&transfer) as Arc<dyn Transfer>,
        "/out",
    );

    assert_eq!(orch.submit_file(track(1)), FileSubmission::Accepted);
    for _ in 0..5 {
        assert_eq!(orch.submit_file(track(1)), FileSubmission::Duplicate);
    }
    assert_eq!(orch.active_files().len(), 1);

    transfer.gate.notify_one();
    orch.wait().await;

    assert!(orch.active_files().is_empty());
    assert_eq!(orch.submit_file(track(1)), FileSubmission::Accepted);
    transfer.gate.notify_one();
    orch.wait().await;
    assert_eq!(transfer.calls().len(), 2);
}

#[tokio::test]
async fn test_concurrency_never_exceeds_pool_capacities() {
    let global = 3;
    let download = 2;
    let entries: Vec<(String, Vec<FileDescriptor>)> = (0..12)
        .map(|i| (format!("https://x/{i}"), vec![track(i * 10), track(i * 10 + 1)]))
        .collect();
    let catalog = Arc::new(
        TableCatalog::new(
            entries
                .iter()
                .map(|(u, f)| (u.as_str(), f.clone()))
                .collect(),
        )
        .with_delay(Duration::from_millis(15)),
    );
    let transfer = Arc::new(FakeTransfer {
        delay: Duration::from_millis(10),
        ..FakeTransfer::default()
    });
    let orch = Orchestrator::new(
        WorkerPools::new(global, download),
        Arc::clone(&catalog) as Arc<dyn Catalog>,
        Arc::clone(&transfer) as Arc<dyn Transfer>,
        "/out",
    );

    orch.run_batch(entries.into_iter().map(|(u, _)| u).collect())
        .await;

    assert_eq!(orch.stats().files_completed(), 24);
    assert!(catalog.gauge.peak() <= global, "peak {}", catalog.gauge.peak());
    assert!(
        transfer.gauge.peak() <= download,
        "peak {}",
        transfer.gauge.peak()
    );
    assert!(transfer.gauge.peak() >= 1);
}

#[tokio::test]
async fn test_failures_do_not_abort_sibling_jobs() {
    let catalog = Arc::new(TableCatalog::new(vec![
        ("https://x/a", vec![track(1), track(2), track(3)]),
        ("https://x/b", vec![track(4)]),
    ]));
    let transfer = Arc::new(FakeTransfer {
        failing: vec![2],
        ..FakeTransfer::default()
    });
    let orch = Orchestrator::new(
        WorkerPools::new(2, 2),
        catalog,
        Arc::clone(&transfer) as Arc<dyn Transfer>,
        "/out",
    );

    orch.run_batch(vec![
        "https://x/a".to_string(),
        "https://x/unknown".to_string(),
        "https://x/b".to_string(),
    ])
    .await;

    let stats = orch.stats();
    assert_eq!(stats.urls_resolved(), 2);
    assert_eq!(stats.urls_failed(), 1);
    assert_eq!(stats.files_completed(), 3);
    assert_eq!(stats.files_failed(), 1);
    assert!(orch.active_files().is_empty());
}

#[tokio::test]
async fn test_cancellation_stops_new_jobs_and_drains_running_ones() {
    let urls: Vec<String> = (0..6).map(|i| format!("https://x/{i}")).collect();
    let catalog = Arc::new(TableCatalog::new(
        urls.iter()
            .enumerate()
            .map(|(i, u)| (u.as_str(), vec![track(i as u64)]))
            .collect(),
    ));
    let transfer = Arc::new(FakeTransfer {
        gated: true,
        ..FakeTransfer::default()
    });
    // One download slot: the first transfer holds it, the rest queue.
    let orch = Orchestrator::new(
        WorkerPools::new(6, 1),
        catalog,
        Arc::clone(&transfer) as Arc<dyn Transfer>,
        "/out",
    );

    let done = Arc::new(AtomicBool::new(false));
    let batch = {
        let orch = orch.clone();
        let done = Arc::clone(&done);
        tokio::spawn(async move {
            orch.run_batch(urls).await;
            done.store(true, Ordering::SeqCst);
        })
    };

    wait_until(|| transfer.calls().len() == 1 && orch.stats().urls_resolved() == 6).await;
    assert!(orch.has_active_batch());

    orch.cancel();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!done.load(Ordering::SeqCst), "running transfer must be awaited");

    transfer.gate.notify_one();
    batch.await.unwrap();

    assert_eq!(transfer.calls().len(), 1);
    assert_eq!(orch.stats().files_completed(), 1);
    assert_eq!(orch.stats().cancelled(), 5);
    assert!(orch.active_files().is_empty());
    assert!(!orch.has_active_batch());
}
