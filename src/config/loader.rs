//! Configuration loading from disk.

use crate::config::schema::{FeatureTable, ModuleSettings, RecipeConfig};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const FEATURES_FILE: &str = "Features.toml";
pub const RECIPES_FILE: &str = "CustomRecipes.toml";
pub const RECIPE_DIRECTORY: &str = "recipes";

/// Error type for configuration loading and saving.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl ConfigError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Resolved locations of every configuration file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    pub directory: PathBuf,
    pub settings_file: PathBuf,
    pub features_file: PathBuf,
    pub recipes_file: PathBuf,
    pub recipe_directory: PathBuf,
}

impl ConfigPaths {
    pub fn new(directory: PathBuf, module_name: &str) -> Self {
        Self {
            settings_file: directory.join(format!("{module_name}.toml")),
            features_file: directory.join(FEATURES_FILE),
            recipes_file: directory.join(RECIPES_FILE),
            recipe_directory: directory.join(RECIPE_DIRECTORY),
            directory,
        }
    }
}

/// A file that failed to load and was replaced by defaults in memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveredFile {
    pub path: PathBuf,
    /// Copy of the rejected contents, when one could be written
    pub backup: Option<PathBuf>,
    pub error: String,
}

/// Loaded configuration plus where it came from
///
/// Read-only after PreInit; [`ConfigLoader::save`] is the only writer.
#[derive(Debug, Clone)]
pub struct ConfigSet {
    pub paths: ConfigPaths,
    pub settings: ModuleSettings,
    pub features: FeatureTable,
    pub recipes: RecipeConfig,
    pub recovered: Vec<RecoveredFile>,
}

impl ConfigSet {
    /// Whether `path` was replaced by defaults at load time
    pub fn is_recovered(&self, path: &Path) -> bool {
        self.recovered.iter().any(|file| file.path == path)
    }
}

/// Resolves, loads and saves the module's configuration files
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader;

impl ConfigLoader {
    pub fn new() -> Self {
        Self
    }

    /// Directory holding this module's configuration
    pub fn resolve_directory(&self, base_dir: &Path, module_name: &str) -> PathBuf {
        base_dir.join(module_name)
    }

    /// Load every file under `paths`, substituting defaults for broken ones
    pub fn load(&self, paths: ConfigPaths) -> ConfigSet {
        let mut recovered = Vec::new();
        let settings = load_or_default(&paths.settings_file, &mut recovered);
        let features = load_or_default(&paths.features_file, &mut recovered);
        let recipes = load_or_default(&paths.recipes_file, &mut recovered);

        ConfigSet {
            paths,
            settings,
            features,
            recipes,
            recovered,
        }
    }

    /// Write every file of `config`, creating the directory tree if needed
    ///
    /// Files that failed to load are left as the user wrote them.
    pub fn save(&self, config: &ConfigSet) -> Result<(), ConfigError> {
        let paths = &config.paths;
        fs::create_dir_all(&paths.directory).map_err(|e| ConfigError::io(&paths.directory, e))?;
        fs::create_dir_all(&paths.recipe_directory)
            .map_err(|e| ConfigError::io(&paths.recipe_directory, e))?;

        for (path, content) in [
            (&paths.settings_file, toml::to_string_pretty(&config.settings)?),
            (&paths.features_file, toml::to_string_pretty(&config.features)?),
            (&paths.recipes_file, toml::to_string_pretty(&config.recipes)?),
        ] {
            if config.is_recovered(path) {
                tracing::warn!("Not overwriting {}; fix it and restart", path.display());
                continue;
            }
            fs::write(path, content).map_err(|e| ConfigError::io(path, e))?;
        }

        tracing::debug!("Saved configuration to {}", paths.directory.display());
        Ok(())
    }
}

fn read_toml<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(ConfigError::io(path, e)),
    };
    toml::from_str(&content)
        .map(Some)
        .map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

fn load_or_default<T: DeserializeOwned + Default>(
    path: &Path,
    recovered: &mut Vec<RecoveredFile>,
) -> T {
    match read_toml(path) {
        Ok(Some(value)) => value,
        Ok(None) => {
            tracing::debug!("{} not found, using defaults", path.display());
            T::default()
        }
        Err(e) => {
            tracing::warn!("Replacing configuration with defaults: {}", e);
            let backup = match &e {
                ConfigError::Parse { .. } => back_up(path),
                _ => None,
            };
            recovered.push(RecoveredFile {
                path: path.to_path_buf(),
                backup,
                error: e.to_string(),
            });
            T::default()
        }
    }
}

/// Copy a rejected file to `<name>.errored`, replacing an older copy
fn back_up(path: &Path) -> Option<PathBuf> {
    let mut name = path.as_os_str().to_owned();
    name.push(".errored");
    let backup = PathBuf::from(name);
    match fs::copy(path, &backup) {
        Ok(_) => {
            tracing::info!("Kept a copy of {} at {}", path.display(), backup.display());
            Some(backup)
        }
        Err(e) => {
            tracing::warn!("Could not back up {}: {}", path.display(), e);
            None
        }
    }
}
