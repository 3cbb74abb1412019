//! Centralized configuration constants.
//!
//! Runtime, user-editable settings live in [`crate::options`]; this module
//! only holds values that are fixed at compile time.

use std::time::Duration;

/// Application-level configuration.
pub struct AppConfig;

impl AppConfig {
    pub const APP_NAME: &'static str = "Kart Optimizer";
    /// Directory name under `$HOME` on Unix-likes.
    pub const UNIX_DIR_NAME: &'static str = ".mkopt";
    /// Directory name under `%APPDATA%` on Windows.
    pub const WINDOWS_DIR_NAME: &'static str = "MariokartOptimizer";
}

/// Network-related configuration.
pub struct NetworkConfig;

impl NetworkConfig {
    pub const ORIGIN: &'static str = "https://bbrk24.github.io/mariokart-optimizer/";
    pub const DATASET_PLATFORM: &'static str = "switch";
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
    pub const USER_AGENT: &'static str = "kart-optimizer/0.3";
    pub const DATASET_ACCEPT: &'static str = "application/json";
    pub const IMAGE_ACCEPT: &'static str = "image/png, image/webp, image/jpeg;q=0.75";
    /// Maximum number of image downloads in flight at once.
    pub const IMAGE_CONCURRENCY_LIMIT: usize = 6;
}

/// Shared directory and file names.
pub struct PathsConfig;

impl PathsConfig {
    pub const CACHE_DIR_NAME: &'static str = "cache";
    pub const SAVES_DIR_NAME: &'static str = "saves";
    pub const OPTIONS_FILE_NAME: &'static str = "options.json";
    pub const DATASET_FILE_NAME: &'static str = "data.json";
    pub const SAVE_FILE_EXTENSION: &'static str = "json";
}

/// Defaults for the in-memory resource cache.
pub struct CacheDefaults;

impl CacheDefaults {
    pub const MEMORY_BUDGET_BYTES: u64 = 4_200_000;
    pub const USE_DISK_CACHE: bool = true;
    /// Bookkeeping overhead charged to every entry on top of its payload.
    pub const ENTRY_OVERHEAD_BYTES: u64 = 64;
}

/// Combination search limits.
pub struct SearchConfig;

impl SearchConfig {
    /// Number of results a front end shows before warning about truncation.
    pub const DISPLAY_LIMIT: usize = 75;
    pub const DEFAULT_MIN: f32 = 0.75;
    pub const DEFAULT_MAX: f32 = 5.75;
}
