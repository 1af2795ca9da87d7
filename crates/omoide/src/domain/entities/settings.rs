//! GlobalSettings - Shared configuration
//!
//! Edited by the operator outside this system; read through the cached
//! `ConfigService` by both extraction tracks and the prompt composer.

use serde::{Deserialize, Serialize};

use super::persona::TraitCatalog;

/// Operator-wide configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalSettings {
    /// Messages between self-narrative extractions
    #[serde(default = "default_extraction_interval")]
    pub extraction_interval: usize,
    /// Completed exchanges between relation extractions
    #[serde(default = "default_relation_threshold")]
    pub relation_threshold: u32,
    /// Messages included in a relations transcript
    #[serde(default = "default_relation_window")]
    pub relation_window: usize,
    /// Messages sent as chat history with every completion
    #[serde(default = "default_history_window")]
    pub history_window: usize,
    /// Verbosity for personas created without one
    #[serde(default = "default_verbosity")]
    pub default_verbosity: u8,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Free-text guidance appended to every persona prompt
    #[serde(default)]
    pub global_guideline: String,
    #[serde(default)]
    pub trait_catalog: TraitCatalog,
}

fn default_extraction_interval() -> usize {
    10
}

fn default_relation_threshold() -> u32 {
    10
}

fn default_relation_window() -> usize {
    20
}

fn default_history_window() -> usize {
    20
}

fn default_verbosity() -> u8 {
    50
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f32 {
    0.8
}

fn default_max_tokens() -> u32 {
    1024
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            extraction_interval: default_extraction_interval(),
            relation_threshold: default_relation_threshold(),
            relation_window: default_relation_window(),
            history_window: default_history_window(),
            default_verbosity: default_verbosity(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            global_guideline: String::new(),
            trait_catalog: TraitCatalog::default(),
        }
    }
}
