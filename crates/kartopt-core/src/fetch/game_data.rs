//! Holds the loaded dataset for the rest of the application.

use crate::fetch::kind::{DatasetKind, ImageKind};
use crate::fetch::orchestrator::FetchOrchestrator;
use crate::models::GameData;
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::info;

/// Image requests share one orchestrator.
pub type ImageManager = FetchOrchestrator<ImageKind>;

/// Loads the dataset once and publishes it.
///
/// The disk copy (if any) is published as soon as it is read; a newer copy
/// from the network replaces it when it arrives.
pub struct GameDataManager {
    orchestrator: FetchOrchestrator<DatasetKind>,
    data: watch::Sender<Option<Arc<GameData>>>,
    /// Serializes concurrent `load` calls.
    loading: Mutex<()>,
}

impl GameDataManager {
    pub fn new(orchestrator: FetchOrchestrator<DatasetKind>) -> Self {
        let (data, _) = watch::channel(None);
        Self {
            orchestrator,
            data,
            loading: Mutex::new(()),
        }
    }

    /// Currently loaded dataset, if any.
    pub fn data(&self) -> Option<Arc<GameData>> {
        self.data.borrow().clone()
    }

    /// Receiver that sees every published dataset.
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<GameData>>> {
        self.data.subscribe()
    }

    /// Load the dataset unless one is already loaded.
    ///
    /// Returns the latest dataset, or `None` if neither the disk nor the
    /// network produced one. Failures are reported to the error log by the
    /// orchestrator.
    pub async fn load(&self) -> Option<Arc<GameData>> {
        let _loading = self.loading.lock().await;
        if let Some(data) = self.data() {
            return Some(data);
        }

        let mut stream = self.orchestrator.request(DatasetKind::NAME);
        while let Some(data) = stream.next().await {
            info!(
                "Dataset loaded: {} characters, {} karts, {} wheels, {} gliders",
                data.characters.len(),
                data.karts.len(),
                data.wheels.len(),
                data.gliders.len()
            );
            self.data.send_replace(Some(data));
        }

        self.data()
    }

    pub fn orchestrator(&self) -> &FetchOrchestrator<DatasetKind> {
        &self.orchestrator
    }
}
