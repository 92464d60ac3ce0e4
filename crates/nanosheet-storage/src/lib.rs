//! Durable snapshot persistence for nanosheet documents.
//!
//! This crate owns everything between a live document and the blob store:
//! - a blob-store seam with local-filesystem and in-memory backends
//! - binary whole-document snapshot load/save, with a global
//!   purge-on-corruption recovery policy
//! - per-room debounced snapshot scheduling, so a burst of edits costs one
//!   write

mod blob;
mod debounce;
pub mod snapshot;

pub use blob::{BlobStore, LocalBlobStore, MemoryBlobStore};
pub use debounce::{DebounceConfig, SnapshotDebouncer};
pub use snapshot::{snapshot_path, SnapshotError, SnapshotStore};
