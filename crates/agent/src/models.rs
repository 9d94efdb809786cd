//! Model preset selection.
//!
//! Holds the preset table and the process-wide current preset. Requests may
//! name a preset; unknown names fall back to the current one.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use jarvis_config::ModelPreset;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("Model {key} not available. Choose from: {choices}")]
    Unavailable { key: String, choices: String },
}

impl From<ModelError> for jarvis_core::Error {
    fn from(err: ModelError) -> Self {
        jarvis_core::Error::Config {
            message: err.to_string(),
        }
    }
}

/// A preset key together with its configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectedModel {
    pub key: String,
    pub preset: ModelPreset,
}

/// Snapshot for listing: the current key and every preset.
#[derive(Debug, Clone, Serialize)]
pub struct ModelListing {
    pub current: String,
    pub available: BTreeMap<String, ModelPreset>,
}

pub struct ModelSelector {
    presets: BTreeMap<String, ModelPreset>,
    current: RwLock<SelectedModel>,
}

impl ModelSelector {
    pub fn new(presets: BTreeMap<String, ModelPreset>, current: &str) -> Result<Self, ModelError> {
        let selected = lookup(&presets, current)?;
        Ok(Self {
            presets,
            current: RwLock::new(selected),
        })
    }

    pub fn current(&self) -> SelectedModel {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The preset named by `requested`, or the current one when the name is
    /// missing or unknown.
    pub fn resolve(&self, requested: Option<&str>) -> SelectedModel {
        requested
            .and_then(|key| lookup(&self.presets, key).ok())
            .unwrap_or_else(|| self.current())
    }

    /// Make `key` the current preset.
    pub fn switch(&self, key: &str) -> Result<SelectedModel, ModelError> {
        let selected = lookup(&self.presets, key)?;
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = selected.clone();
        info!(model = key, backend_model = %selected.preset.name, "Switched current model");
        Ok(selected)
    }

    pub fn presets(&self) -> &BTreeMap<String, ModelPreset> {
        &self.presets
    }

    pub fn listing(&self) -> ModelListing {
        ModelListing {
            current: self.current().key,
            available: self.presets.clone(),
        }
    }
}

fn lookup(presets: &BTreeMap<String, ModelPreset>, key: &str) -> Result<SelectedModel, ModelError> {
    presets
        .get(key)
        .map(|preset| SelectedModel {
            key: key.to_string(),
            preset: preset.clone(),
        })
        .ok_or_else(|| ModelError::Unavailable {
            key: key.to_string(),
            choices: presets.keys().cloned().collect::<Vec<_>>().join(", "),
        })
}

/// "ultra_fast" → "Ultra Fast"
pub fn display_name(key: &str) -> String {
    key.split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
