//! Per-resource-kind fetch policy.

use crate::cache::{ImageDecoder, JsonDecoder, ResourceDecoder};
use crate::config::{NetworkConfig, PathsConfig};
use crate::models::GameData;
use crate::{KartError, Result};
use url::Url;

/// How one kind of resource is located, negotiated and decoded.
pub trait ResourceKind: Send + Sync + 'static {
    type Decoder: ResourceDecoder;

    /// Short name used in log lines.
    fn label(&self) -> &'static str;

    /// Absolute URL of resource `name` under `origin`.
    fn url_for(&self, origin: &Url, name: &str) -> Result<Url>;

    /// `Accept` header value.
    fn accept(&self) -> &'static str;

    /// Maximum number of network fetches in flight, or `None` for no cap.
    fn concurrency_limit(&self) -> Option<usize> {
        None
    }
}

fn invalid_url(origin: &Url, name: &str, reason: impl std::fmt::Display) -> KartError {
    KartError::Config {
        message: format!("Cannot build URL for {} under {}: {}", name, origin, reason),
    }
}

/// Component images under `img/`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageKind;

impl ResourceKind for ImageKind {
    type Decoder = ImageDecoder;

    fn label(&self) -> &'static str {
        "image"
    }

    fn url_for(&self, origin: &Url, name: &str) -> Result<Url> {
        let mut url = origin.join("img/").map_err(|e| invalid_url(origin, name, e))?;
        url.path_segments_mut()
            .map_err(|()| invalid_url(origin, name, "origin cannot be a base"))?
            .pop_if_empty()
            .push(name);
        Ok(url)
    }

    fn accept(&self) -> &'static str {
        NetworkConfig::IMAGE_ACCEPT
    }

    fn concurrency_limit(&self) -> Option<usize> {
        Some(NetworkConfig::IMAGE_CONCURRENCY_LIMIT)
    }
}

/// The game dataset, cached as `data.json` and served from
/// `data/<platform>.json`.
#[derive(Debug, Clone)]
pub struct DatasetKind {
    platform: String,
}

impl DatasetKind {
    /// Cache name of the dataset.
    pub const NAME: &'static str = PathsConfig::DATASET_FILE_NAME;

    pub fn new(platform: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
        }
    }

    pub fn platform(&self) -> &str {
        &self.platform
    }
}

impl Default for DatasetKind {
    fn default() -> Self {
        Self::new(NetworkConfig::DATASET_PLATFORM)
    }
}

impl ResourceKind for DatasetKind {
    type Decoder = JsonDecoder<GameData>;

    fn label(&self) -> &'static str {
        "dataset"
    }

    fn url_for(&self, origin: &Url, _name: &str) -> Result<Url> {
        origin
            .join(&format!("data/{}.json", self.platform))
            .map_err(|e| invalid_url(origin, Self::NAME, e))
    }

    fn accept(&self) -> &'static str {
        NetworkConfig::DATASET_ACCEPT
    }
}
