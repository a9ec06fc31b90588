//! The bill listing service: run the pipeline, persist best-effort, answer.

use std::sync::Arc;

use tracing::{info, warn};

use billtrack_crawler::HttpFetcher;
use billtrack_shared::{AppConfig, CrawlConfig, Record, Result, SourceConfig};
use billtrack_storage::{JsonFileStore, SnapshotStore};

use crate::pipeline::{Pipeline, PipelineReport, ProgressReporter, SilentProgress};

/// Runs the full pipeline on every call and snapshots the result.
///
/// There is no request-level caching: every call pays one listing fetch plus
/// one fetch per record. Snapshot failures are logged and never change what
/// the caller receives.
pub struct BillService {
    pipeline: Pipeline,
    store: Arc<dyn SnapshotStore>,
}

impl BillService {
    pub fn new(pipeline: Pipeline, store: Arc<dyn SnapshotStore>) -> Self {
        Self { pipeline, store }
    }

    /// Wire up the HTTP fetcher and JSON snapshot store from configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let source = SourceConfig::try_from(config)?;
        let crawl = CrawlConfig::try_from(config)?;
        let fetcher = Arc::new(HttpFetcher::new(&crawl)?);
        let pipeline = Pipeline::new(fetcher, source, crawl)?;
        let store = Arc::new(JsonFileStore::new(
            &config.store.dir,
            &config.store.snapshot_name,
        ));

        Ok(Self::new(pipeline, store))
    }

    /// The snapshot store backing this service.
    pub fn store(&self) -> &Arc<dyn SnapshotStore> {
        &self.store
    }

    /// List current records: full scrape, best-effort snapshot.
    pub async fn list_bills(&self) -> Result<Vec<Record>> {
        Ok(self.scrape(&SilentProgress).await?.records)
    }

    /// Full scrape with progress reporting, returning the whole report.
    pub async fn scrape(&self, progress: &dyn ProgressReporter) -> Result<PipelineReport> {
        let report = self.pipeline.run(progress).await?;
        self.persist(&report.records).await;
        Ok(report)
    }

    async fn persist(&self, records: &[Record]) {
        match self.store.save(records).await {
            Ok(()) => info!(
                store = %self.store.describe(),
                records = records.len(),
                "snapshot saved"
            ),
            Err(e) => warn!(
                store = %self.store.describe(),
                error = %e,
                "snapshot write failed; serving computed records anyway"
            ),
        }
    }
}
