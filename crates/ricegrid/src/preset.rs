use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::grid::GridConfig;

/// An error type for preset stores.
#[derive(thiserror::Error, Debug)]
pub enum PresetError {
    /// The store could not be read or written.
    #[error("Failed to access the preset store. {0}")]
    Io(#[from] std::io::Error),

    /// The store content is not valid JSON.
    #[error("Failed to parse presets. {0}")]
    Json(#[from] serde_json::Error),

    /// No preset matches the requested name or id.
    #[error("Preset not found: {0}")]
    NotFound(String),
}

/// A named grid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    /// Identifier, unique within a store.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// The saved grid.
    pub config: GridConfig,
}

/// Persistent list of presets.
pub trait PresetStore {
    /// Load every preset.
    fn load(&self) -> Result<Vec<Preset>, PresetError>;

    /// Replace the stored presets.
    fn save(&self, presets: &[Preset]) -> Result<(), PresetError>;

    /// Add a preset, replacing any preset with the same id, and return the new list.
    fn insert(&self, preset: Preset) -> Result<Vec<Preset>, PresetError> {
        let mut presets = self.load()?;
        match presets.iter_mut().find(|p| p.id == preset.id) {
            Some(existing) => *existing = preset,
            None => presets.push(preset),
        }
        self.save(&presets)?;
        Ok(presets)
    }

    /// Remove the preset with `id` and return the new list.
    fn remove(&self, id: u64) -> Result<Vec<Preset>, PresetError> {
        let mut presets = self.load()?;
        presets.retain(|p| p.id != id);
        self.save(&presets)?;
        Ok(presets)
    }

    /// Find a preset by name, or by id when `key` is a number.
    fn find(&self, key: &str) -> Result<Preset, PresetError> {
        let id = key.parse::<u64>().ok();
        self.load()?
            .into_iter()
            .find(|p| p.name == key || Some(p.id) == id)
            .ok_or_else(|| PresetError::NotFound(key.to_string()))
    }
}

/// Presets kept as a JSON array in a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPresetStore {
    path: PathBuf,
}

impl JsonPresetStore {
    /// Create a store backed by `path`; the file is created on first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PresetStore for JsonPresetStore {
    fn load(&self) -> Result<Vec<Preset>, PresetError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let file = std::fs::File::open(&self.path)?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }

    fn save(&self, presets: &[Preset]) -> Result<(), PresetError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(presets)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}
