//! Atomic file operations for the disk cache, options and save files.
//!
//! Writes go to a temp file in the target directory, are synced, and are then
//! renamed over the target. When the rename fails (some network filesystems
//! refuse it) the bytes are written directly as a best-effort fallback.

use crate::{KartError, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Read and parse a JSON file.
///
/// Returns `None` if the file doesn't exist, or an error if parsing fails.
pub fn atomic_read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let contents = match fs::read(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(KartError::io_with_path(e, path)),
    };

    let data: T = serde_json::from_slice(&contents).map_err(|e| KartError::Json {
        message: format!("Failed to parse {}: {}", path.display(), e),
        source: Some(e),
    })?;

    Ok(Some(data))
}

/// Serialize `data` as pretty JSON and write it atomically.
pub fn atomic_write_json<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    let serialized = serde_json::to_vec_pretty(data).map_err(|e| KartError::Json {
        message: format!("Failed to serialize {}: {}", path.display(), e),
        source: Some(e),
    })?;

    atomic_write_bytes(path, &serialized)
}

/// Write raw bytes to `path`, replacing any previous content atomically where
/// the filesystem allows it.
pub fn atomic_write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    if !parent.exists() {
        fs::create_dir_all(parent).map_err(|e| KartError::Io {
            message: format!("Failed to create directory {}", parent.display()),
            path: Some(parent.to_path_buf()),
            source: Some(e),
        })?;
    }

    match write_via_temp(parent, path, bytes) {
        Ok(()) => {
            debug!("Atomically wrote {}", path.display());
            Ok(())
        }
        Err(e) => {
            warn!(
                "Atomic replace of {} failed ({}), writing directly",
                path.display(),
                e
            );
            fs::write(path, bytes).map_err(|e| KartError::io_with_path(e, path))
        }
    }
}

fn write_via_temp(parent: &Path, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut temp = NamedTempFile::new_in(parent)?;
    temp.write_all(bytes)?;
    temp.flush()?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Remove a file, treating "already gone" as success.
pub fn remove_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(KartError::io_with_path(e, path)),
    }
}
