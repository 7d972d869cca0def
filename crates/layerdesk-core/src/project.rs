//! Project documents: layers, selection and viewport as plain JSON.

use crate::layers::{Layer, LayerId};
use crate::viewport::Viewport;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Project errors.
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for project operations.
pub type ProjectResult<T> = Result<T, ProjectError>;

/// Everything needed to restore an editing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Layers back to front.
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub selected_layer_id: Option<LayerId>,
    #[serde(default)]
    pub viewport: Viewport,
}

impl Project {
    pub fn new(layers: Vec<Layer>) -> Self {
        Self {
            layers,
            selected_layer_id: None,
            viewport: Viewport::default(),
        }
    }

    pub fn to_json(&self) -> ProjectResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> ProjectResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> ProjectResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> ProjectResult<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
