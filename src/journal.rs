//! Run journal
//!
//! Appends one JSON line per precomputation event to a log file next to
//! the store. Off by default; enabled with `general.journal = true`.

use chrono::Utc;
use std::path::PathBuf;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::warn;
use uuid::Uuid;

/// File-based journal that appends JSON lines tagged with a run id
#[derive(Debug, Clone)]
pub struct RunJournal {
    enabled: bool,
    path: PathBuf,
    run_id: Uuid,
}

impl RunJournal {
    /// Create a journal writing to `path`
    pub fn new(path: PathBuf, enabled: bool) -> Self {
        Self {
            enabled,
            path,
            run_id: Uuid::new_v4(),
        }
    }

    /// A journal that records nothing
    pub fn disabled() -> Self {
        Self::new(PathBuf::new(), false)
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Record an event
    ///
    /// IO failures are logged and dropped; the journal never fails a run.
    pub async fn record(&self, event: &str, data: &serde_json::Value) {
        if !self.enabled {
            return;
        }

        let entry = serde_json::json!({
            "timestamp": Utc::now().to_rfc3339(),
            "run_id": self.run_id.to_string(),
            "event": event,
            "data": data,
        });

        let mut line = match serde_json::to_string(&entry) {
            Ok(s) => s,
            Err(e) => {
                warn!("Failed to serialize journal event: {}", e);
                return;
            }
        };
        line.push('\n');

        if let Err(e) = self.append(&line).await {
            warn!("Failed to write run journal {}: {}", self.path.display(), e);
        }
    }

    async fn append(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}
