use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Durable blob storage seam consumed by the snapshot store.
///
/// Paths are forward-slash separated keys relative to the store root, e.g.
/// `sheets/{sheet_id}/snapshot.bin`. Payloads are opaque bytes.
pub trait BlobStore: Send + Sync + 'static {
    /// Read a blob. `Ok(None)` when the path does not exist.
    fn read(&self, path: &str) -> io::Result<Option<Vec<u8>>>;

    /// Create or overwrite a blob.
    fn write(&self, path: &str, bytes: &[u8]) -> io::Result<()>;

    /// Delete a blob. Deleting a missing path is not an error.
    fn delete(&self, path: &str) -> io::Result<()>;

    /// List every blob path starting with `prefix`.
    fn list(&self, prefix: &str) -> io::Result<Vec<String>>;
}

/// Filesystem-backed blob store rooted at a directory.
///
/// Writes are atomic (temp file + rename), so a crashed write never leaves
/// a torn blob behind.
#[derive(Clone, Debug)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn blob_path(&self, path: &str) -> PathBuf {
        let mut out = self.root.clone();
        for part in path.split('/').filter(|p| !p.is_empty()) {
            out.push(part);
        }
        out
    }

    fn collect_files(&self, dir: &Path, out: &mut Vec<String>) -> io::Result<()> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(err),
        };
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                self.collect_files(&path, out)?;
            } else if let Ok(relative) = path.strip_prefix(&self.root) {
                let key = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                out.push(key);
            }
        }
        Ok(())
    }
}

impl BlobStore for LocalBlobStore {
    fn read(&self, path: &str) -> io::Result<Option<Vec<u8>>> {
        match fs::read(self.blob_path(path)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn write(&self, path: &str, bytes: &[u8]) -> io::Result<()> {
        nanosheet_fs::atomic_write_bytes(self.blob_path(path), bytes)
    }

    fn delete(&self, path: &str) -> io::Result<()> {
        match fs::remove_file(self.blob_path(path)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err),
        }
    }

    fn list(&self, prefix: &str) -> io::Result<Vec<String>> {
        let mut out = Vec::new();
        self.collect_files(&self.blob_path(prefix), &mut out)?;
        out.retain(|key| key.starts_with(prefix));
        out.sort();
        Ok(out)
    }
}

/// In-memory blob store for tests and ephemeral deployments.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Vec<u8>>> {
        self.blobs.lock().expect("blob mutex poisoned")
    }
}

impl BlobStore for MemoryBlobStore {
    fn read(&self, path: &str) -> io::Result<Option<Vec<u8>>> {
        Ok(self.lock().get(path).cloned())
    }

    fn write(&self, path: &str, bytes: &[u8]) -> io::Result<()> {
        self.lock().insert(path.to_string(), bytes.to_vec());
        Ok(())
    }

    fn delete(&self, path: &str) -> io::Result<()> {
        self.lock().remove(path);
        Ok(())
    }

    fn list(&self, prefix: &str) -> io::Result<Vec<String>> {
        Ok(self
            .lock()
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }
}
