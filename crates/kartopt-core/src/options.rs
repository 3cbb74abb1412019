//! User-editable runtime options.
//!
//! Options are loaded once at startup from `options.json` and can be changed
//! at runtime. The resource cache reads them on every store and eviction
//! decision, so a lowered budget takes effect on the next store or explicit
//! shrink.

use crate::config::CacheDefaults;
use crate::storage::{atomic_read_json, atomic_write_json};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{info, warn};

/// Persisted option values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Options {
    /// In-memory image cache budget in bytes.
    pub memory_cache_bytes: u64,
    /// Mirror downloads to the cache directory.
    pub use_disk_cache: bool,
    /// Locale identifier used by front ends for their string tables.
    pub locale: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            memory_cache_bytes: CacheDefaults::MEMORY_BUDGET_BYTES,
            use_disk_cache: CacheDefaults::USE_DISK_CACHE,
            locale: "en-US".to_string(),
        }
    }
}

/// Shared access to the current [`Options`].
#[derive(Debug)]
pub struct OptionsManager {
    /// `None` for purely in-memory managers (tests, embedders).
    path: Option<PathBuf>,
    current: RwLock<Options>,
}

impl OptionsManager {
    /// Load options from `path`.
    ///
    /// A missing file yields defaults. A malformed or unreadable file is
    /// logged and also yields defaults; it is overwritten on the next save.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let options = match atomic_read_json::<Options>(&path) {
            Ok(Some(options)) => options,
            Ok(None) => Options::default(),
            Err(e) => {
                warn!("Error reading options from {}: {}", path.display(), e);
                Options::default()
            }
        };

        Self {
            path: Some(path),
            current: RwLock::new(options),
        }
    }

    /// Manager that never touches the filesystem.
    pub fn in_memory(options: Options) -> Self {
        Self {
            path: None,
            current: RwLock::new(options),
        }
    }

    /// Snapshot of the current options.
    pub fn get(&self) -> Options {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Replace the options and persist them.
    ///
    /// The in-memory value is updated even when the write fails, so the
    /// running process honors the new settings; the write error is returned
    /// for the caller to surface.
    pub fn set(&self, options: Options) -> Result<()> {
        {
            let mut current = self
                .current
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if *current == options {
                return Ok(());
            }
            *current = options.clone();
        }

        info!(
            "Options updated: memory budget {} bytes, disk cache {}",
            options.memory_cache_bytes, options.use_disk_cache
        );

        match &self.path {
            Some(path) => atomic_write_json(path, &options),
            None => Ok(()),
        }
    }

    /// Where the options are persisted, if anywhere.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
