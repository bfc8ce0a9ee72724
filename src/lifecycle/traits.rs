//! Collaborator traits
//!
//! Everything the orchestrator calls into is reached through one of these
//! traits and supplied at construction, so the boot sequence can run against
//! fakes without a host.

use super::LifecycleError;
use crate::config::{CustomRecipeConfig, FeatureRegistry};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Payload of the host's PreInit callback
#[derive(Debug, Clone)]
pub struct PreInitEvent {
    /// Host directory holding every module's configuration
    pub config_root: PathBuf,
}

/// Read-only context handed to subsystems during PreInit
pub struct PreInitContext<'a> {
    pub features: &'a FeatureRegistry,
    pub config_directory: &'a Path,
}

/// Read-only context handed to subsystems during Init
pub struct InitContext<'a> {
    pub features: &'a FeatureRegistry,
    pub recipe_directory: &'a Path,
    pub recipes: &'a CustomRecipeConfig,
}

/// Read-only context handed to subsystems during PostInit
pub struct PostInitContext<'a> {
    pub features: &'a FeatureRegistry,
}

/// A unit of registration work driven across the three boot phases
///
/// Every hook defaults to a no-op so a subsystem only implements the phases it
/// cares about.
///
/// # Example
///
/// ```rust,ignore
/// use modhost_lifecycle::config::FeatureFlag;
/// use modhost_lifecycle::lifecycle::{InitContext, LifecycleError, Subsystem};
/// use async_trait::async_trait;
///
/// #[async_trait]
/// impl Subsystem for RecipeLoader {
///     async fn init(&mut self, ctx: &InitContext<'_>) -> Result<(), LifecycleError> {
///         if ctx.features.is_enabled(FeatureFlag::CustomRecipes) {
///             self.load_from(ctx.recipe_directory)
///                 .map_err(|e| LifecycleError::init_failed(e.to_string()))?;
///         }
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Subsystem: Send + Sync {
    async fn pre_init(&mut self, _ctx: &PreInitContext<'_>) -> Result<(), LifecycleError> {
        Ok(())
    }

    async fn init(&mut self, _ctx: &InitContext<'_>) -> Result<(), LifecycleError> {
        Ok(())
    }

    async fn post_init(&mut self, _ctx: &PostInitContext<'_>) -> Result<(), LifecycleError> {
        Ok(())
    }
}

/// Third-party integrations, initialised after the module's own subsystems
#[async_trait]
pub trait IntegrationRegistry: Send + Sync {
    async fn init(&self) -> anyhow::Result<()>;

    async fn post_init(&self) -> anyhow::Result<()>;

    /// One-line state summary for fault reports
    fn describe(&self) -> String;
}

/// Work that only makes sense on a presentation-capable host
#[async_trait]
pub trait ClientHooks: Send + Sync {
    async fn pre_init(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn init(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn post_init(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Answers whether another module is loaded
pub trait CapabilityProbe: Send + Sync {
    fn is_module_loaded(&self, module_id: &str) -> bool;
}

/// The host's presentation channel
pub trait HostEnvironment: Send + Sync {
    /// Whether the host can present UI
    fn is_client(&self) -> bool;

    /// Show the user a non-fatal notice that `dependency` is missing
    fn notify_missing_dependency(&self, module_id: &str, dependency: &str);
}

/// Registration of the module's browsable categories
pub trait CategoryRegistry: Send + Sync {
    fn register_main(&self, module_id: &str);

    fn register_facades(&self, module_id: &str);
}

/// An optional slot provider
pub trait SlotRegistry: Send + Sync {
    fn register_slot_type(&self, slot_type: &str) -> bool;

    fn assign_slot(&self, slot_type: &str) -> bool;
}

/// Network channel and GUI dispatch registration
pub trait NetworkRegistry: Send + Sync {
    fn register_gui_handler(&self, module_id: &str);

    fn open_channel(&self, module_id: &str);
}

/// An administrative command bound to a running server
pub trait ServerCommand: Send + Sync {
    fn name(&self) -> &str;
}

/// The active server as seen during ServerStarting
pub trait ServerHandle: Send + Sync {
    fn name(&self) -> String;

    fn register_command(&self, command: Box<dyn ServerCommand>);
}

/// Builds the module's administrative command for a server
pub trait CommandFactory: Send + Sync {
    fn create(&self, server: &dyn ServerHandle) -> Box<dyn ServerCommand>;
}

/// Persistent world state for one server session
pub trait WorldState: Send + Sync {
    fn on_server_stopping(&mut self);

    fn on_server_stopped(&mut self);
}

/// Opens world state when a session is about to start
pub trait WorldStateProvider: Send + Sync {
    fn on_server_about_to_start(&self) -> Box<dyn WorldState>;
}

/// The host-driven ticking collaborator
pub trait TickScheduler: Send + Sync {
    fn shutdown(&self);
}
