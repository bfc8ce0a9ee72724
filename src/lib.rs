//! # modhost-lifecycle
//!
//! Lifecycle orchestration for an extension module hosted inside a larger
//! application it does not control.
//!
//! The host delivers a fixed sequence of callbacks (PreInit, Init, PostInit,
//! inter-module messages, and repeating server sessions). The orchestrator
//! uses them to load configuration, register subsystems in a strict order,
//! start background services, and track server sessions, without ever letting
//! a failure escape into the host.
//!
//! ## Features
//!
//! - **Phase ordering**: out-of-order and duplicate callbacks are logged no-ops
//! - **Graceful degradation**: a missing companion module disables the module
//!   with one user-visible notice instead of crashing the host
//! - **Configuration**: TOML files with per-file fallback to defaults
//! - **Feature flags**: fixed after PreInit, gate optional registration
//! - **Background services**: fire-and-forget, on dedicated named threads
//! - **Crash diagnostics**: append-only registry the host's fault reporter reads
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use modhost_lifecycle::prelude::*;
//!
//! let orchestrator = LifecycleOrchestrator::builder(ModuleIdentity::new("storage", "1.0.0"))
//!     .capability_probe(probe)
//!     .host(host)
//!     .categories(categories)
//!     .network(network)
//!     .integrations(integrations)
//!     .world_state(world)
//!     .tick_scheduler(ticker)
//!     .commands(commands)
//!     .build()?;
//!
//! let mut dispatcher = HostDispatcher::new(orchestrator)?;
//! dispatcher.dispatch(HostEvent::PreInit(PreInitEvent { config_root }));
//! ```

pub mod config;
pub mod crash;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod messaging;
pub mod worker;

pub use config::{FeatureFlag, FeatureRegistry, ModuleIdentity};
pub use error::{ModuleError, Result};
pub use lifecycle::{HostDispatcher, HostEvent, LifecycleOrchestrator};

pub use async_trait::async_trait;

/// Prelude module for convenient imports
///
/// ```
/// use modhost_lifecycle::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{
        ConfigLoader, ConfigSet, FeatureFlag, FeatureRegistry, ModuleIdentity,
    };
    pub use crate::crash::{CrashCallable, CrashReporter};
    pub use crate::error::{ModuleError, Result};
    pub use crate::lifecycle::{
        CapabilityProbe, CategoryRegistry, ClientHooks, CommandFactory, HostDispatcher, HostEvent,
        HostEnvironment, InitContext, IntegrationRegistry, LifecycleError, LifecycleOrchestrator,
        NetworkRegistry, Phase, PostInitContext, PreInitContext, PreInitEvent, ServerCommand,
        ServerHandle, SlotRegistry, Subsystem, TickScheduler, WorldState, WorldStateProvider,
    };
    pub use crate::messaging::{ImcEvent, ImcMessage, ImcProcessor};
    pub use crate::worker::{ExportEntry, ExportSource, ServicePriority};
    pub use async_trait::async_trait;
    pub use std::sync::Arc;
    pub use tokio::sync::RwLock;
}
