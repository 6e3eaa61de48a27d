//! Per-event metrics file (§4.1 step 4, §6, §5 "append-only metrics file").
//!
//! One line per triggered event: `case;activity;timestamp;peers_queried\n`,
//! appended to `<dir>/<stem>_opt.csv`. Writes are serialized per AN by
//! holding the file handle behind a `tokio::sync::Mutex`, matching §5's
//! "file writes are serialized per AN" resource policy.

use std::path::PathBuf;

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::AlphaError;
use crate::types::{ActivityId, CaseId, Timestamp};

/// Append-only writer for one Activity Node's metrics CSV.
pub struct MetricsWriter {
    path: PathBuf,
    lock: Mutex<()>,
}

impl MetricsWriter {
    /// Build a writer targeting `<dir>/<stem>_opt.csv`.
    pub fn new(dir: &str, stem: &str) -> Self {
        let path = PathBuf::from(dir).join(format!("{stem}_opt.csv"));
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    /// Append one metrics line for a triggered event.
    pub async fn record(
        &self,
        case_id: &CaseId,
        activity: ActivityId,
        timestamp: Timestamp,
        peers_queried: u32,
    ) -> Result<(), AlphaError> {
        let _guard = self.lock.lock().await;
        let line = format!(
            "{case_id};{activity};{};{peers_queried}\n",
            timestamp.to_rfc3339()
        );
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| AlphaError::Config(format!("opening metrics file: {e}")))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| AlphaError::Config(format!("writing metrics file: {e}")))?;
        Ok(())
    }
}
