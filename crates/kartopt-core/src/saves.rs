//! Saved optimizer filters.
//!
//! Each save is a JSON file under the saves directory holding the bounds and
//! direction of every axis plus the set of disallowed component names.
//! Unlike the cache, save operations are user-initiated, so I/O failures are
//! returned to the caller instead of being swallowed.

use crate::config::PathsConfig;
use crate::models::{StatAxis, StatBlock};
use crate::optimizer::{AxisFilter, Direction, OptimizerFilter};
use crate::storage::{atomic_read_json, atomic_write_json};
use crate::{KartError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::info;

/// A saved filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveData {
    pub min_stats: StatBlock,
    pub max_stats: StatBlock,
    /// One direction per axis, in [`StatAxis::ALL`] order.
    pub directions: [Direction; StatAxis::COUNT],
    #[serde(default)]
    pub disallowed: BTreeSet<String>,
}

impl SaveData {
    pub fn new(filter: &OptimizerFilter, disallowed: BTreeSet<String>) -> Self {
        let mut min_stats = StatBlock::ZERO;
        let mut max_stats = StatBlock::ZERO;
        let mut directions = [Direction::Ignore; StatAxis::COUNT];

        for axis in StatAxis::ALL {
            let axis_filter = filter.axis(axis);
            *min_stats.get_mut(axis) = axis_filter.min;
            *max_stats.get_mut(axis) = axis_filter.max;
            directions[axis.index()] = axis_filter.direction;
        }

        Self {
            min_stats,
            max_stats,
            directions,
            disallowed,
        }
    }

    pub fn filter(&self) -> OptimizerFilter {
        let mut axes = [AxisFilter::default(); StatAxis::COUNT];
        for axis in StatAxis::ALL {
            axes[axis.index()] = AxisFilter {
                min: self.min_stats.get(axis),
                max: self.max_stats.get(axis),
                direction: self.directions[axis.index()],
            };
        }
        OptimizerFilter::new(axes)
    }
}

/// A save file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveEntry {
    pub name: String,
    pub modified: DateTime<Utc>,
}

/// Directory of save files.
#[derive(Debug, Clone)]
pub struct SaveDataStore {
    dir: PathBuf,
}

impl SaveDataStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> Result<PathBuf> {
        if name.trim().is_empty() {
            return Err(KartError::Validation {
                field: "name".to_string(),
                message: "Save name cannot be empty".to_string(),
            });
        }
        if name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(KartError::Validation {
                field: "name".to_string(),
                message: format!("Invalid save name: {}", name),
            });
        }
        Ok(self
            .dir
            .join(format!("{}.{}", name, PathsConfig::SAVE_FILE_EXTENSION)))
    }

    /// Write (or overwrite) a save.
    ///
    /// Bounds must be finite; JSON has no representation for infinity.
    pub fn save(&self, name: &str, data: &SaveData) -> Result<()> {
        let path = self.path_for(name)?;
        if let Some(axis) = StatAxis::ALL
            .into_iter()
            .find(|&axis| !(data.min_stats.get(axis).is_finite() && data.max_stats.get(axis).is_finite()))
        {
            return Err(KartError::Validation {
                field: axis.key().to_string(),
                message: "Bounds must be finite numbers".to_string(),
            });
        }
        atomic_write_json(&path, data)?;
        info!("Saved filter {} to {}", name, path.display());
        Ok(())
    }

    pub fn load(&self, name: &str) -> Result<SaveData> {
        let path = self.path_for(name)?;
        atomic_read_json(&path)?.ok_or_else(|| KartError::SaveNotFound {
            name: name.to_string(),
        })
    }

    /// Every save, newest first.
    pub fn list(&self) -> Result<Vec<SaveEntry>> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(KartError::io_with_path(e, &self.dir)),
        };

        let mut saves = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| KartError::io_with_path(e, &self.dir))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(PathsConfig::SAVE_FILE_EXTENSION) {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let modified = entry
                .metadata()
                .and_then(|m| m.modified())
                .map_err(|e| KartError::io_with_path(e, &path))?;
            saves.push(SaveEntry {
                name: name.to_string(),
                modified: DateTime::<Utc>::from(modified),
            });
        }

        saves.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.name.cmp(&b.name)));
        Ok(saves)
    }

    pub fn delete(&self, name: &str) -> Result<()> {
        let path = self.path_for(name)?;
        match std::fs::remove_file(&path) {
            Ok(()) => {
                info!("Deleted save {}", name);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(KartError::SaveNotFound {
                name: name.to_string(),
            }),
            Err(e) => Err(KartError::io_with_path(e, path)),
        }
    }
}
