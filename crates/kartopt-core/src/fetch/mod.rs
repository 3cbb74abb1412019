//! Resource loading: cache first, then a deduplicated conditional fetch.

mod game_data;
mod kind;
mod orchestrator;

pub use game_data::{GameDataManager, ImageManager};
pub use kind::{DatasetKind, ImageKind, ResourceKind};
pub use orchestrator::{Decoded, FetchOrchestrator, ResourceStream};
