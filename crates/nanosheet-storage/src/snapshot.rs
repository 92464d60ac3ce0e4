use crate::blob::{BlobStore, LocalBlobStore, MemoryBlobStore};
use nanosheet_model::SheetState;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Blob path prefix shared by every sheet snapshot.
const SNAPSHOT_PREFIX: &str = "sheets/";

/// Blob path of one sheet's snapshot.
///
/// Part of the addressing scheme shared with operational tooling; media
/// blobs live under a separate prefix and are not managed here.
pub fn snapshot_path(sheet_id: &str) -> String {
    format!("{SNAPSHOT_PREFIX}{sheet_id}/snapshot.bin")
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("blob io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot codec error: {0}")]
    Codec(#[from] bincode::Error),
}

pub type Result<T> = std::result::Result<T, SnapshotError>;

/// Loads and saves whole-document snapshots against a blob store.
///
/// Both directions are best-effort from the room's point of view: a failed
/// load yields a fresh document, a failed save is logged and retried only
/// by the next debounce cycle.
#[derive(Clone)]
pub struct SnapshotStore {
    blobs: Arc<dyn BlobStore>,
}

impl SnapshotStore {
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self { blobs }
    }

    /// Snapshots under a local directory.
    pub fn open_local(root: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(LocalBlobStore::new(root)))
    }

    /// Snapshots held in process memory (tests, ephemeral deployments).
    pub fn open_in_memory() -> Self {
        Self::new(Arc::new(MemoryBlobStore::new()))
    }

    /// Load the snapshot for `sheet_id`.
    ///
    /// Absent snapshots and read failures yield `None` (fresh document). A
    /// snapshot that is present but fails to decode yields `None` **and**
    /// purges every stored snapshot: an incompatible encoding is assumed
    /// to affect all sheets uniformly (schema migration scenario).
    pub fn load(&self, sheet_id: &str) -> Option<SheetState> {
        let path = snapshot_path(sheet_id);
        let bytes = match self.blobs.read(&path) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                log::info!("no snapshot found for sheet {sheet_id}");
                return None;
            }
            Err(err) => {
                log::error!("error reading snapshot for sheet {sheet_id}: {err}");
                return None;
            }
        };

        match bincode::deserialize::<SheetState>(&bytes) {
            Ok(state) => {
                log::info!("loaded snapshot for sheet {sheet_id} ({} bytes)", bytes.len());
                Some(state)
            }
            Err(err) => {
                log::error!(
                    "snapshot for sheet {sheet_id} failed to decode ({err}); purging all snapshots"
                );
                match self.purge_all() {
                    Ok(deleted) => log::warn!("purged {deleted} snapshot blob(s)"),
                    Err(purge_err) => log::error!("snapshot purge failed: {purge_err}"),
                }
                None
            }
        }
    }

    /// Encode the document state and overwrite the snapshot for `sheet_id`.
    pub fn save(&self, sheet_id: &str, state: &SheetState) -> Result<()> {
        let bytes = bincode::serialize(state)?;
        self.blobs.write(&snapshot_path(sheet_id), &bytes)?;
        log::info!("saved snapshot for sheet {sheet_id} ({} bytes)", bytes.len());
        Ok(())
    }

    /// Delete every stored snapshot, for every sheet.
    ///
    /// Returns the number of blobs deleted; per-blob failures are logged
    /// and skipped.
    pub fn purge_all(&self) -> Result<usize> {
        let mut deleted = 0;
        for path in self.blobs.list(SNAPSHOT_PREFIX)? {
            match self.blobs.delete(&path) {
                Ok(()) => deleted += 1,
                Err(err) => log::warn!("failed to delete snapshot blob {path}: {err}"),
            }
        }
        Ok(deleted)
    }
}

impl fmt::Debug for SnapshotStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotStore").finish_non_exhaustive()
    }
}
