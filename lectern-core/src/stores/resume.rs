//! Local resume cache.
//!
//! A single JSON file in the platform data directory holding the last
//! watched lecture and position. The contract is deliberately infallible:
//! storage that is missing, unreadable, or unwritable degrades to "no saved
//! record" and playback carries on. Expired records and records below the
//! 5-second floor are purged on read.

use std::path::PathBuf;

use async_trait::async_trait;
use directories::ProjectDirs;
use lectern_model::ResumeRecord;
use tracing::{debug, warn};

const RESUME_FILE: &str = "resume.json";

/// Key-value persistence of the single "last watched" slot
#[async_trait]
pub trait ResumeStore: Send + Sync {
    /// Persist the record. Records below the 5-second floor are dropped.
    async fn write(&self, record: &ResumeRecord);

    /// The saved record, or `None` when absent, expired, malformed, or the
    /// backing storage is unavailable.
    async fn read(&self) -> Option<ResumeRecord>;

    async fn clear(&self);
}

/// File-backed [`ResumeStore`] writing pretty JSON under the platform data
/// directory.
#[derive(Debug)]
pub struct JsonResumeStore {
    /// `None` when no usable data directory exists; every operation is then
    /// a no-op returning absent.
    path: Option<PathBuf>,
}

impl JsonResumeStore {
    pub fn new() -> Self {
        let path = ProjectDirs::from("", "lectern", "lectern")
            .map(|dirs| dirs.data_dir().join(RESUME_FILE));
        if path.is_none() {
            warn!("No data directory available; resume persistence disabled");
        }
        Self { path }
    }

    /// Store backed by an explicit file path (used by tests)
    pub fn with_path(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }

    fn now_ms() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    async fn purge(path: &PathBuf) {
        if let Err(e) = tokio::fs::remove_file(path).await
            && e.kind() != std::io::ErrorKind::NotFound
        {
            debug!("Failed to remove resume record: {}", e);
        }
    }
}

impl Default for JsonResumeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResumeStore for JsonResumeStore {
    async fn write(&self, record: &ResumeRecord) {
        let Some(path) = &self.path else { return };
        if !record.is_persistable() {
            return;
        }

        let json = match serde_json::to_string_pretty(record) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize resume record: {}", e);
                return;
            }
        };

        if let Some(parent) = path.parent()
            && let Err(e) = tokio::fs::create_dir_all(parent).await
        {
            warn!("Failed to create resume directory: {}", e);
            return;
        }
        if let Err(e) = tokio::fs::write(path, json).await {
            warn!("Failed to write resume record: {}", e);
        }
    }

    async fn read(&self) -> Option<ResumeRecord> {
        let Some(path) = &self.path else { return None };

        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    debug!("Failed to read resume record: {}", e);
                }
                return None;
            }
        };

        let record: ResumeRecord = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(e) => {
                debug!("Discarding malformed resume record: {}", e);
                Self::purge(path).await;
                return None;
            }
        };

        if record.is_expired(Self::now_ms()) || !record.is_persistable() {
            Self::purge(path).await;
            return None;
        }

        Some(record)
    }

    async fn clear(&self) {
        if let Some(path) = &self.path {
            Self::purge(path).await;
        }
    }
}
