//! Lifecycle Orchestration Module
//!
//! The host drives the module through a fixed sequence of callbacks. This
//! module turns each one into an ordered series of steps.
//!
//! # Lifecycle Phases
//!
//! ```text
//! 1. Construction                  ← version crash callable registered
//!    ↓
//! 2. PreInit                       ← dependency check, config load, features
//!    ↓
//! 3. Init                          ← export service, subsystem registration
//!    ↓
//! 4. InterModMessage (any number)
//!    ↓
//! 5. PostInit                      ← integrations, config save, network
//!    ↓
//! [Server sessions, repeating]
//!    AboutToStart → Starting → Stopping → Stopped
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use modhost_lifecycle::lifecycle::{HostDispatcher, HostEvent, LifecycleOrchestrator};
//!
//! let orchestrator = LifecycleOrchestrator::builder(identity)
//!     // collaborators...
//!     .build()?;
//! let mut dispatcher = HostDispatcher::new(orchestrator)?;
//!
//! dispatcher.dispatch(HostEvent::PreInit(event));
//! dispatcher.dispatch(HostEvent::Init);
//! dispatcher.dispatch(HostEvent::PostInit);
//! ```

mod dispatch;
mod error;
mod orchestrator;
mod phase;
mod registrar;
mod server;
mod traits;

pub use dispatch::HostDispatcher;
pub use error::{LifecycleError, Result};
pub use orchestrator::{HostEvent, LifecycleOrchestrator, OrchestratorBuilder};
pub use phase::{BootState, Phase, PhaseTracker};
pub use registrar::SubsystemRegistrar;
pub use server::{ServerLifecycleManager, ServerSession, SessionEvent, SessionState};
pub use traits::{
    CapabilityProbe, CategoryRegistry, ClientHooks, CommandFactory, HostEnvironment, InitContext,
    IntegrationRegistry, NetworkRegistry, PostInitContext, PreInitContext, PreInitEvent,
    ServerCommand, ServerHandle, SlotRegistry, Subsystem, TickScheduler, WorldState,
    WorldStateProvider,
};
