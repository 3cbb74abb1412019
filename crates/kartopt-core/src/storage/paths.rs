//! Platform-specific data directory resolution.
//!
//! Everything the optimizer persists lives under one root directory; the
//! rest of the crate receives that root (or a child of it) as a plain path.

use crate::config::{AppConfig, PathsConfig};
use crate::error::{KartError, Result};
use std::path::{Path, PathBuf};

/// Get the default data root for the current user.
///
/// # Platform Behavior
/// - **Windows**: `%APPDATA%/MariokartOptimizer`
/// - **Everything else**: `~/.mkopt`
pub fn default_root() -> Result<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        let data_dir = dirs::data_dir().ok_or_else(|| KartError::Config {
            message: "Could not determine app data directory".to_string(),
        })?;
        Ok(data_dir.join(AppConfig::WINDOWS_DIR_NAME))
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = dirs::home_dir().ok_or_else(|| KartError::Config {
            message: "Could not determine home directory".to_string(),
        })?;
        Ok(home.join(AppConfig::UNIX_DIR_NAME))
    }
}

/// Directory holding cached downloads.
pub fn cache_dir(root: &Path) -> PathBuf {
    root.join(PathsConfig::CACHE_DIR_NAME)
}

/// Directory holding user save files.
pub fn saves_dir(root: &Path) -> PathBuf {
    root.join(PathsConfig::SAVES_DIR_NAME)
}

/// Path of the options file.
pub fn options_file(root: &Path) -> PathBuf {
    root.join(PathsConfig::OPTIONS_FILE_NAME)
}

/// Create the root, cache and saves directories if they are missing.
pub fn ensure_layout(root: &Path) -> Result<()> {
    for dir in [root.to_path_buf(), cache_dir(root), saves_dir(root)] {
        std::fs::create_dir_all(&dir).map_err(|e| KartError::Io {
            message: format!("Failed to create directory: {}", dir.display()),
            path: Some(dir.clone()),
            source: Some(e),
        })?;
    }
    Ok(())
}
