//! Feature flags resolved from `Features.toml`

use crate::config::schema::FeatureTable;
use std::collections::HashSet;
use std::str::FromStr;
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// A named boolean switch for optional registration or behaviour
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString, AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum FeatureFlag {
    /// Register the facade category during PreInit
    Facades,
    /// Hand custom recipe files to the registrar
    CustomRecipes,
    /// Start the item-name export service during Init
    ExportItemNames,
}

impl FeatureFlag {
    /// Value used when the feature table does not mention the flag
    pub fn default_enabled(self) -> bool {
        match self {
            FeatureFlag::Facades => true,
            FeatureFlag::CustomRecipes => false,
            FeatureFlag::ExportItemNames => false,
        }
    }
}

/// The set of enabled features; fixed once constructed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureRegistry {
    enabled: HashSet<FeatureFlag>,
}

impl FeatureRegistry {
    /// Resolve every known flag against `table`, falling back to its default
    pub fn from_table(table: &FeatureTable) -> Self {
        for key in table.features.keys() {
            if FeatureFlag::from_str(key).is_err() {
                tracing::warn!("Ignoring unknown feature '{}'", key);
            }
        }

        let enabled = FeatureFlag::iter()
            .filter(|flag| {
                table
                    .features
                    .get(flag.as_ref())
                    .copied()
                    .unwrap_or_else(|| flag.default_enabled())
            })
            .collect();

        Self { enabled }
    }

    pub fn is_enabled(&self, flag: FeatureFlag) -> bool {
        self.enabled.contains(&flag)
    }

    /// Writes every flag back into `table` so saved files list all of them
    pub fn fill_table(&self, table: &mut FeatureTable) {
        for flag in FeatureFlag::iter() {
            table
                .features
                .entry(flag.as_ref().to_string())
                .or_insert_with(|| self.is_enabled(flag));
        }
    }
}
