//! On-disk configuration schema.
//!
//! Every struct defaults field by field, so a partial file still loads.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum_macros::Display;

/// Static identity of the hosted module, supplied by the host entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleIdentity {
    /// Stable identifier used for network and GUI registration
    pub id: String,
    pub display_name: String,
    pub version: String,
    /// Name of the directory below the host's configuration root
    pub config_directory: String,
    /// Companion module that must be loaded for the module to boot
    pub required_companion: String,
    /// Optional slot-provider integration
    pub slot_integration: Option<SlotIntegration>,
}

impl ModuleIdentity {
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            display_name: id.clone(),
            config_directory: id.clone(),
            required_companion: format!("{id}-core"),
            version: version.into(),
            slot_integration: None,
            id,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    pub fn with_config_directory(mut self, directory: impl Into<String>) -> Self {
        self.config_directory = directory.into();
        self
    }

    pub fn with_required_companion(mut self, companion: impl Into<String>) -> Self {
        self.required_companion = companion.into();
        self
    }

    pub fn with_slot_integration(
        mut self,
        provider: impl Into<String>,
        slot_type: impl Into<String>,
    ) -> Self {
        self.slot_integration = Some(SlotIntegration {
            provider: provider.into(),
            slot_type: slot_type.into(),
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotIntegration {
    /// Module id of the slot provider
    pub provider: String,
    /// Slot type registered with the provider
    pub slot_type: String,
}

/// General module settings (`<module>.toml`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleSettings {
    /// Module version that last wrote this file, stamped on save
    pub version: String,
    pub debug_logging: bool,
}

/// Feature table (`Features.toml`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureTable {
    pub features: BTreeMap<String, bool>,
}

/// Custom recipe and export settings (`CustomRecipes.toml`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecipeConfig {
    pub recipes: CustomRecipeConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomRecipeConfig {
    /// Keep going when a recipe file fails to parse
    pub ignore_errors: bool,
    /// Recipe files below the recipe directory, loaded in order
    pub files: Vec<String>,
}

impl Default for CustomRecipeConfig {
    fn default() -> Self {
        Self {
            ignore_errors: true,
            files: vec!["index.recipe".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub mode: ExportMode,
    /// Rewrite the export even when the cache fingerprint matches
    pub force_refresh: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            mode: ExportMode::General,
            force_refresh: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ExportMode {
    General,
    /// Adds the origin column
    Debug,
}
