//! Snapshot persistence for scraped records.
//!
//! A snapshot is the complete record collection of one run, stored under a
//! fixed name and replaced in full by the next run. The store is an audit
//! trail, never the source of truth for a live response.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use billtrack_shared::{BilltrackError, Record, Result};
use uuid::Uuid;

/// Persists and reloads the current snapshot.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Replace the snapshot with `records`.
    async fn save(&self, records: &[Record]) -> Result<()>;

    /// Load the last saved snapshot, if any.
    async fn load(&self) -> Result<Option<Vec<Record>>>;

    /// Human-readable location for logs.
    fn describe(&self) -> String;
}

// ---------------------------------------------------------------------------
// JSON file store
// ---------------------------------------------------------------------------

/// Writes the snapshot as a pretty-printed JSON array at `<dir>/<name>`.
///
/// Saves are serialized: each one stages its own file and the last rename wins.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Arc<tokio::sync::Mutex<()>>,
}

impl JsonFileStore {
    /// Store the snapshot named `name` inside `dir`.
    pub fn new(dir: impl AsRef<Path>, name: &str) -> Self {
        Self {
            path: dir.as_ref().join(name),
            write_lock: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    /// Full path of the snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A fresh `.<name>.<uuid>.tmp` path next to the snapshot.
    fn staging_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.path.with_file_name(format!(".{name}.{}.tmp", Uuid::now_v7()))
    }
}

#[async_trait]
impl SnapshotStore for JsonFileStore {
    async fn save(&self, records: &[Record]) -> Result<()> {
        let json = serde_json::to_vec_pretty(records)
            .map_err(|e| BilltrackError::Persistence(format!("serialize snapshot: {e}")))?;

        let _guard = self.write_lock.lock().await;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| BilltrackError::io(parent, e))?;
        }

        // Write aside, then rename over the old snapshot.
        let staging = self.staging_path();
        if let Err(e) = tokio::fs::write(&staging, &json).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(BilltrackError::io(&staging, e));
        }
        if let Err(e) = tokio::fs::rename(&staging, &self.path).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(BilltrackError::io(&self.path, e));
        }

        tracing::debug!(path = %self.path.display(), records = records.len(), "snapshot written");
        Ok(())
    }

    async fn load(&self) -> Result<Option<Vec<Record>>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(BilltrackError::io(&self.path, e)),
        };

        serde_json::from_slice(&bytes).map(Some).map_err(|e| {
            BilltrackError::Persistence(format!("{}: invalid snapshot: {e}", self.path.display()))
        })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Keeps the snapshot in memory. Used by tests and ephemeral servers.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshot: Mutex<Option<Vec<Record>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn save(&self, records: &[Record]) -> Result<()> {
        let mut guard = self
            .snapshot
            .lock()
            .map_err(|_| BilltrackError::Persistence("memory store poisoned".into()))?;
        *guard = Some(records.to_vec());
        Ok(())
    }

    async fn load(&self) -> Result<Option<Vec<Record>>> {
        let guard = self
            .snapshot
            .lock()
            .map_err(|_| BilltrackError::Persistence("memory store poisoned".into()))?;
        Ok(guard.clone())
    }

    fn describe(&self) -> String {
        "memory".into()
    }
}
