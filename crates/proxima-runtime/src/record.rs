//! Append-only CSV history of accepted measurements
//!
//! One row per measurement that made it through validation and dedup. A
//! write failure is logged and dropped; persistence trouble must never
//! touch in-memory state or counters.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use proxima_core::{epoch_to_system_time, HubError, HubResult, Measurement};
use proxima_state::CSV_HEADER;

/// Appending CSV writer with header-on-create
pub struct CsvRecorder {
    path: PathBuf,
    file: File,
}

impl CsvRecorder {
    /// Open (or create) the history file, writing the header when new
    pub fn open(path: impl AsRef<Path>) -> HubResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| HubError::Persistence(format!("{}: {}", parent.display(), e)))?;
            }
        }

        let is_new = !path.exists();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| HubError::Persistence(format!("{}: {}", path.display(), e)))?;

        if is_new {
            writeln!(file, "{}", CSV_HEADER)
                .map_err(|e| HubError::Persistence(e.to_string()))?;
        }

        tracing::info!(path = %path.display(), "measurement history open");
        Ok(CsvRecorder { path, file })
    }

    /// Append one accepted measurement with its derived volume.
    /// Errors are logged, never propagated.
    pub fn append(&mut self, m: &Measurement, volume: f64) {
        let ts = humantime::format_rfc3339_millis(epoch_to_system_time(m.received_at));
        let row = format!(
            "{},{},{},{:.3},{:.3},{:.3}",
            ts, m.node, m.peer, m.distance, m.quality, volume
        );
        if let Err(e) = writeln!(self.file, "{}", row) {
            tracing::error!(path = %self.path.display(), error = %e, "history append failed");
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
