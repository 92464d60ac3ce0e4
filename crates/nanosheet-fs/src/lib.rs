//! Small filesystem utilities shared across workspace crates.
//!
//! Provides atomic whole-file writes for blob payloads:
//! - write to a temp file in the destination directory (avoids cross-device
//!   renames)
//! - flush + `sync_all`
//! - persist into place with replace semantics

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

fn parent_dir_or_dot(path: &Path) -> &Path {
    // `Path::parent` returns `Some("")` for bare relative file names like
    // `snapshot.bin`. Treat that as the current directory so callers can use
    // relative paths without prepending `./`.
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

/// Atomically replace the file at `dest` with `bytes`.
///
/// Creates parent directories as needed. Readers of `dest` observe either
/// the previous contents or the full new contents, never a torn write; on
/// error the destination is left untouched.
pub fn atomic_write_bytes(dest: impl AsRef<Path>, bytes: &[u8]) -> io::Result<()> {
    let dest = dest.as_ref();
    let dir = parent_dir_or_dot(dest);
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.as_file_mut().write_all(bytes)?;
    tmp.as_file_mut().flush()?;
    tmp.as_file().sync_all()?;

    // `persist` renames with replace semantics on every supported platform.
    tmp.persist(dest).map_err(|err| err.error)?;

    // Best-effort: sync directory metadata after the rename. The file is
    // already in place, so a failure here is not a write failure.
    let _ = sync_parent_dir(dest);

    Ok(())
}

fn sync_parent_dir(path: &Path) -> io::Result<()> {
    // Windows does not support opening directories for sync.
    #[cfg(not(windows))]
    {
        fs::File::open(parent_dir_or_dot(path))?.sync_all()?;
    }
    #[cfg(windows)]
    {
        let _ = path;
    }
    Ok(())
}
