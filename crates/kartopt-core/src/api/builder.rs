//! Builder for configuring KartOpt initialization.

use crate::cache::{DiskMirror, ImageDecoder, JsonDecoder, ResourceCache};
use crate::config::NetworkConfig;
use crate::error::{KartError, Result};
use crate::fetch::{DatasetKind, FetchOrchestrator, GameDataManager, ImageKind};
use crate::models::GameData;
use crate::network::{Fetcher, HttpClient};
use crate::options::OptionsManager;
use crate::report::ErrorLog;
use crate::saves::SaveDataStore;
use crate::storage::paths;
use crate::KartOpt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use url::Url;

/// Builder for configuring KartOpt initialization.
///
/// # Example
///
/// ```rust,ignore
/// use kartopt_core::KartOpt;
///
/// let app = KartOpt::builder("/home/me/.mkopt")
///     .auto_create_dirs(true)
///     .build()?;
/// ```
pub struct KartOptBuilder {
    root: PathBuf,
    auto_create_dirs: bool,
    origin: Option<Url>,
    platform: String,
    fetcher: Option<Arc<dyn Fetcher>>,
}

impl KartOptBuilder {
    /// Create a new builder with the data root directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            auto_create_dirs: false,
            origin: None,
            platform: NetworkConfig::DATASET_PLATFORM.to_string(),
            fetcher: None,
        }
    }

    /// Create the root, cache and saves directories if they are missing.
    ///
    /// Default: `false` (the root must exist)
    pub fn auto_create_dirs(mut self, enable: bool) -> Self {
        self.auto_create_dirs = enable;
        self
    }

    /// Fetch from a different origin (must end with `/`).
    ///
    /// Default: [`NetworkConfig::ORIGIN`]
    pub fn with_origin(mut self, origin: Url) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Dataset platform, as in `data/<platform>.json`.
    ///
    /// Default: `switch`
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }

    /// Use a custom HTTP fetcher instead of the reqwest client.
    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Build the KartOpt instance.
    pub fn build(self) -> Result<KartOpt> {
        if self.auto_create_dirs {
            paths::ensure_layout(&self.root)?;
        } else if !self.root.exists() {
            return Err(KartError::Config {
                message: format!("Data root does not exist: {}", self.root.display()),
            });
        }

        let origin = match self.origin {
            Some(origin) => origin,
            None => Url::parse(NetworkConfig::ORIGIN).map_err(|e| KartError::Config {
                message: format!("Invalid origin {}: {}", NetworkConfig::ORIGIN, e),
            })?,
        };
        let fetcher: Arc<dyn Fetcher> = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Arc::new(HttpClient::new()?),
        };

        let options = Arc::new(OptionsManager::load(paths::options_file(&self.root)));
        let errors = Arc::new(ErrorLog::new());
        let mirror = DiskMirror::new(paths::cache_dir(&self.root));

        let image_cache = Arc::new(ResourceCache::new(ImageDecoder, Arc::clone(&options)).with_disk(mirror.clone()));
        let images = FetchOrchestrator::new(
            ImageKind,
            origin.clone(),
            image_cache,
            Arc::clone(&fetcher),
            Arc::clone(&errors),
        );

        let dataset_cache = Arc::new(
            ResourceCache::new(JsonDecoder::<GameData>::new(), Arc::clone(&options))
                .unbounded()
                .with_disk(mirror),
        );
        let game_data = GameDataManager::new(FetchOrchestrator::new(
            DatasetKind::new(self.platform),
            origin,
            dataset_cache,
            fetcher,
            Arc::clone(&errors),
        ));

        info!("Kart optimizer initialized at {}", self.root.display());

        Ok(KartOpt {
            saves: SaveDataStore::new(paths::saves_dir(&self.root)),
            root: self.root,
            options,
            errors,
            images,
            game_data,
        })
    }
}
