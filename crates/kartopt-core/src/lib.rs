//! Kart Optimizer Core - headless data loading, caching and build search.
//!
//! This crate provides everything the optimizer needs besides a user
//! interface:
//! - Cache-then-network loading of the game dataset and component images,
//!   with deduplicated conditional requests and a bounded image cache
//! - The combination search over characters, karts, wheels and gliders
//! - Persisted options and saved filters
//!
//! # Example
//!
//! ```rust,ignore
//! use kartopt_core::{KartOpt, OptimizerFilter};
//!
//! #[tokio::main]
//! async fn main() -> kartopt_core::Result<()> {
//!     let app = KartOpt::open_default()?;
//!
//!     let data = app.load_game_data().await.expect("dataset unavailable");
//!     println!("{} character groups", data.characters.len());
//!
//!     let results = app.search(&OptimizerFilter::default(), &Default::default()).await;
//!     println!("{:?}", results.map(|r| r.len()));
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod models;
pub mod network;
pub mod optimizer;
pub mod options;
pub mod report;
pub mod saves;
pub mod storage;

mod api;

// Re-export commonly used types
pub use api::KartOptBuilder;
pub use cache::{CacheStats, CachedResource, DiskMirror, ResourceCache, ResourceDecoder};
pub use error::{KartError, Result};
pub use fetch::{DatasetKind, FetchOrchestrator, GameDataManager, ImageKind, ImageManager, ResourceStream};
pub use models::{Category, GameData, Selection, StatAxis, StatBlock, TerrainStat};
pub use network::{Fetcher, HttpClient, HttpResponse, RequestDeduplicator};
pub use optimizer::{Direction, FilterInputs, OptimizerFilter, SearchResults};
pub use options::{Options, OptionsManager};
pub use report::ErrorLog;
pub use saves::{SaveData, SaveDataStore, SaveEntry};

use image::RgbaImage;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Main entry point for the optimizer.
///
/// Owns the options, the error log, both resource loaders and the save
/// store, all rooted at one data directory.
pub struct KartOpt {
    root: PathBuf,
    options: Arc<OptionsManager>,
    errors: Arc<ErrorLog>,
    images: ImageManager,
    game_data: GameDataManager,
    saves: SaveDataStore,
}

impl KartOpt {
    /// Create a builder for KartOpt.
    pub fn builder(root: impl Into<PathBuf>) -> KartOptBuilder {
        KartOptBuilder::new(root)
    }

    /// Open the per-user data directory, creating it if needed.
    pub fn open_default() -> Result<Self> {
        let root = storage::paths::default_root()?;
        Self::builder(root).auto_create_dirs(true).build()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn cache_dir(&self) -> PathBuf {
        storage::paths::cache_dir(&self.root)
    }

    pub fn saves_dir(&self) -> PathBuf {
        storage::paths::saves_dir(&self.root)
    }

    // ========================================
    // Options
    // ========================================

    pub fn options(&self) -> Options {
        self.options.get()
    }

    /// Apply and persist new options, then re-enforce the image cache budget.
    ///
    /// The new options take effect even if persisting them fails; the write
    /// error is both reported to the error log and returned.
    pub fn save_options(&self, options: Options) -> Result<()> {
        let result = self.options.set(options);
        let evicted = self.images.cache().shrink_to_fit();
        if evicted > 0 {
            debug!("Options change evicted {} cached images", evicted);
        }
        if let Err(e) = &result {
            warn!("Failed to save options: {}", e);
            self.errors.report(e);
        }
        result
    }

    // ========================================
    // Errors
    // ========================================

    pub fn errors(&self) -> &Arc<ErrorLog> {
        &self.errors
    }

    // ========================================
    // Resources
    // ========================================

    pub fn images(&self) -> &ImageManager {
        &self.images
    }

    /// Start loading a component image (e.g. `"Mario.webp"`).
    pub fn load_image(&self, name: impl Into<String>) -> ResourceStream<RgbaImage> {
        self.images.request(name)
    }

    /// Load the dataset (once) and return it.
    pub async fn load_game_data(&self) -> Option<Arc<GameData>> {
        self.game_data.load().await
    }

    pub fn game_data(&self) -> &GameDataManager {
        &self.game_data
    }

    // ========================================
    // Search
    // ========================================

    /// Run the combination search on the loaded dataset, loading it first if
    /// needed. `None` if no dataset is available.
    pub async fn search(&self, filter: &OptimizerFilter, disallowed: &BTreeSet<String>) -> Option<SearchResults> {
        let data = self.load_game_data().await?;
        Some(optimizer::search_game_data(&data, filter, disallowed))
    }

    /// Run the search described by a saved filter.
    pub async fn search_saved(&self, save: &SaveData) -> Option<SearchResults> {
        self.search(&save.filter(), &save.disallowed).await
    }

    // ========================================
    // Saves
    // ========================================

    pub fn saves(&self) -> &SaveDataStore {
        &self.saves
    }
}
