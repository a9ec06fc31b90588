//! Two-phase scrape pipeline: listing scan → per-record detail resolution.
//!
//! Phase 1 fetches the listing once; any failure there aborts the run.
//! Phase 2 fetches every record's detail page on a bounded worker pool. A
//! failing detail task only marks its own record `Failed`, and records keep
//! listing order regardless of completion order.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{Instrument, debug, info, instrument, warn};
use uuid::Uuid;

use billtrack_crawler::{
    DetailExtractor, DocumentExtractor, FetchOptions, Fetcher, ListExtractor, Listing,
};
use billtrack_shared::{BilltrackError, CrawlConfig, Record, ResolutionState, Result, SourceConfig};

/// Outcome of one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// Final records in listing order.
    pub records: Vec<Record>,
    /// Listing rows skipped for missing title or link.
    pub dropped_rows: usize,
    /// Wall time of the run.
    pub elapsed: Duration,
}

impl PipelineReport {
    /// Records whose detail page failed.
    pub fn failed(&self) -> usize {
        self.count(ResolutionState::Failed)
    }

    /// Records whose detail page was fetched and parsed.
    pub fn resolved(&self) -> usize {
        self.count(ResolutionState::Resolved)
    }

    /// Records with a document URL.
    pub fn with_document(&self) -> usize {
        self.records.iter().filter(|r| r.pdf().is_some()).count()
    }

    fn count(&self, state: ResolutionState) -> usize {
        self.records
            .iter()
            .filter(|r| r.resolution_state() == state)
            .count()
    }
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called as each detail task settles, in completion order.
    fn detail_settled(&self, url: &str, current: usize, total: usize);
    /// Called when the pipeline completes.
    fn done(&self, report: &PipelineReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn detail_settled(&self, _url: &str, _current: usize, _total: usize) {}
    fn done(&self, _report: &PipelineReport) {}
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Listing scan plus bounded-concurrency detail resolution.
///
/// Holds no state between runs; every [`Pipeline::run`] starts from scratch.
pub struct Pipeline {
    fetcher: Arc<dyn Fetcher>,
    source: SourceConfig,
    crawl: CrawlConfig,
    listing: ListExtractor,
    detail: Arc<DetailExtractor>,
}

impl Pipeline {
    /// Build a pipeline; fails only if the configured selectors do not compile.
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        source: SourceConfig,
        crawl: CrawlConfig,
    ) -> Result<Self> {
        let listing = ListExtractor::new(source.origin.clone(), &source.selectors)?;
        let detail = DetailExtractor::new(source.origin.clone(), &source.selectors)?;

        Ok(Self {
            fetcher,
            source,
            crawl,
            listing,
            detail: Arc::new(detail),
        })
    }

    /// The source this pipeline scrapes.
    pub fn source(&self) -> &SourceConfig {
        &self.source
    }

    /// Run both phases and return every record in listing order.
    #[instrument(
        skip_all,
        fields(run_id = %Uuid::now_v7(), listing_url = %self.source.listing_url)
    )]
    pub async fn run(&self, progress: &dyn ProgressReporter) -> Result<PipelineReport> {
        let start = Instant::now();

        progress.phase("Scanning listing");
        let listing = self.scan_listing().await?;

        let mut records: Vec<Record> = listing.records.into_iter().map(Record::pending).collect();

        progress.phase("Resolving documents");
        self.resolve_details(&mut records, progress).await;

        let report = PipelineReport {
            records,
            dropped_rows: listing.dropped,
            elapsed: start.elapsed(),
        };

        info!(
            records = report.records.len(),
            resolved = report.resolved(),
            failed = report.failed(),
            documents = report.with_document(),
            dropped_rows = report.dropped_rows,
            duration_ms = report.elapsed.as_millis(),
            "pipeline completed"
        );
        progress.done(&report);

        Ok(report)
    }

    /// Phase 1: fetch and extract the listing. Errors here are fatal.
    pub async fn scan_listing(&self) -> Result<Listing> {
        let body = self
            .fetcher
            .fetch(&self.source.listing_url, self.fetch_options())
            .await?;

        let listing = self.listing.extract_text(&body);

        if listing.dropped > 0 {
            warn!(
                dropped = listing.dropped,
                kept = listing.records.len(),
                "listing rows without title or link were skipped"
            );
        }
        info!(rows = listing.records.len(), "listing scanned");

        Ok(listing)
    }

    /// Phase 2: resolve every record's document link on the worker pool.
    ///
    /// Task `i` reports back with its index and only `records[i]` is written.
    /// Failures are logged and recorded as `Failed`; nothing propagates.
    /// Dropping the returned future aborts every outstanding task.
    async fn resolve_details(&self, records: &mut [Record], progress: &dyn ProgressReporter) {
        let total = records.len();
        let semaphore = Arc::new(Semaphore::new(self.crawl.concurrency));
        let opts = self.fetch_options();

        debug!(total, concurrency = self.crawl.concurrency, "starting detail phase");

        let mut tasks = JoinSet::new();
        for (index, record) in records.iter().enumerate() {
            let fetcher = Arc::clone(&self.fetcher);
            let extractor = Arc::clone(&self.detail);
            let sem = Arc::clone(&semaphore);
            let url = record.link.clone();

            tasks.spawn(
                async move {
                    let outcome = async {
                        let _permit = sem.acquire_owned().await.map_err(|_| {
                            BilltrackError::validation("detail worker pool closed")
                        })?;
                        let body = fetcher.fetch(&url, opts).await?;
                        Ok::<_, BilltrackError>(extractor.extract_text(&body))
                    }
                    .await;
                    (index, outcome)
                }
                .in_current_span(),
            );
        }

        let mut settled = 0;
        while let Some(joined) = tasks.join_next().await {
            settled += 1;
            let (index, outcome) = match joined {
                Ok(done) => done,
                Err(e) => {
                    // The index is lost with the task; the record stays
                    // `Pending` and is failed below.
                    warn!(error = %e, "detail task aborted");
                    continue;
                }
            };

            let record = &mut records[index];
            match outcome {
                Ok(document) => {
                    debug!(
                        id = record.id,
                        url = %record.link,
                        found = document.is_some(),
                        "detail resolved"
                    );
                    record.resolve(document);
                }
                Err(e) => {
                    warn!(id = record.id, url = %record.link, error = %e, "detail fetch failed");
                    record.mark_failed();
                }
            }
            progress.detail_settled(record.link.as_str(), settled, total);
        }

        for record in records
            .iter_mut()
            .filter(|r| r.resolution_state() == ResolutionState::Pending)
        {
            record.mark_failed();
        }
    }

    fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            no_cache: self.crawl.no_cache,
        }
    }
}
