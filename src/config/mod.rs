//! Configuration management.
//!
//! # Data Flow
//! ```text
//! <host config root>/<module dir>/
//!     → loader.rs (read TOML, defaults on missing or malformed files)
//!     → ConfigSet (read-only after PreInit)
//!     → features.rs (FeatureRegistry, fixed for the process lifetime)
//!
//! PostInit:
//!     ConfigSet → loader.rs save
//! ```

pub mod features;
pub mod loader;
pub mod schema;

pub use features::{FeatureFlag, FeatureRegistry};
pub use loader::{ConfigError, ConfigLoader, ConfigPaths, ConfigSet, RecoveredFile};
pub use schema::{
    CustomRecipeConfig, ExportConfig, ExportMode, FeatureTable, ModuleIdentity, ModuleSettings,
    RecipeConfig, SlotIntegration,
};
