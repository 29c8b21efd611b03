//! Snapshot file: the ledger export written to disk on an interval and
//! loaded back at startup.

use crate::state::export::{ImportError, LedgerExport};
use crate::state::AppState;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("Snapshot I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Snapshot {path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Snapshot rejected: {0}")]
    Import(#[from] ImportError),
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> PersistError + '_ {
    move |source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Read a snapshot file. A missing file is `Ok(None)`.
pub async fn load_snapshot(path: &Path) -> Result<Option<LedgerExport>, PersistError> {
    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(io_error(path)(e)),
    };

    let export = serde_json::from_str(&text).map_err(|source| PersistError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(export))
}

/// Write to a sibling temp file, then rename over the target
pub async fn write_snapshot(path: &Path, export: &LedgerExport) -> Result<(), PersistError> {
    let json = serde_json::to_vec_pretty(export).map_err(|source| PersistError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, json).await.map_err(io_error(&tmp))?;
    tokio::fs::rename(&tmp, path).await.map_err(io_error(path))?;
    Ok(())
}

/// Load the snapshot into `state` if one exists. Returns whether anything was loaded.
pub async fn restore(state: &AppState, path: &Path) -> Result<bool, PersistError> {
    match load_snapshot(path).await? {
        Some(export) => {
            state.import_ledger(export).await?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Spawn a background task that writes the ledger to `path` whenever it
/// changed. The state as it is now counts as already written.
pub async fn spawn_snapshot_writer(state: Arc<AppState>, path: PathBuf, every: Duration) {
    let mut written_version = state.version().await;

    tokio::spawn(async move {
        loop {
            tokio::time::sleep(every).await;

            let version = state.version().await;
            if version == written_version {
                continue;
            }

            let export = state.export_ledger().await;
            match write_snapshot(&path, &export).await {
                Ok(()) => {
                    tracing::debug!(version, path = %path.display(), "Snapshot written");
                    written_version = version;
                }
                Err(e) => tracing::error!("Failed to write snapshot: {}", e),
            }
        }
    });
}
