//! On-disk mirror of downloaded resources.
//!
//! One file per resource, named after the resource. The file's modification
//! time doubles as the resource's last-modified time, which is sent back as
//! `If-Modified-Since` after a restart.

use crate::storage::{atomic_write_bytes, remove_if_exists};
use crate::Result;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Bytes and modification time read back from the mirror.
#[derive(Debug, Clone)]
pub struct DiskCopy {
    pub bytes: Vec<u8>,
    pub modified: DateTime<Utc>,
}

/// Directory-backed resource mirror.
#[derive(Debug, Clone)]
pub struct DiskMirror {
    dir: PathBuf,
}

impl DiskMirror {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Stable path for a resource name.
    pub fn path_for(&self, name: &str) -> PathBuf {
        // Names are flat file names; keep anything path-like inside the dir.
        let safe_name: String = name
            .chars()
            .map(|c| if c == '/' || c == '\\' { '-' } else { c })
            .collect();
        let safe_name = if safe_name.starts_with('.') {
            format!("_{}", safe_name)
        } else {
            safe_name
        };
        self.dir.join(safe_name)
    }

    /// Read a resource back. Missing or unreadable files yield `None`; the
    /// mirror is an optimization and never a source of errors on read.
    pub fn read(&self, name: &str) -> Option<DiskCopy> {
        let path = self.path_for(name);
        let metadata = match std::fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("Failed to stat disk cache {}: {}", path.display(), e);
                return None;
            }
        };

        let modified = match metadata.modified() {
            Ok(time) => DateTime::<Utc>::from(time),
            Err(e) => {
                warn!("No modification time for {}: {}", path.display(), e);
                return None;
            }
        };

        match std::fs::read(&path) {
            Ok(bytes) => Some(DiskCopy { bytes, modified }),
            Err(e) => {
                warn!("Failed to read disk cache {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Write (or replace) the mirror copy of `name`.
    pub fn write(&self, name: &str, bytes: &[u8]) -> Result<()> {
        atomic_write_bytes(&self.path_for(name), bytes)
    }

    /// Delete the mirror copy of `name` if there is one.
    pub fn remove(&self, name: &str) -> Result<bool> {
        remove_if_exists(&self.path_for(name))
    }
}
