//! Blocking host entry point
//!
//! Hosts call their lifecycle callbacks synchronously on one coordination
//! thread. [`HostDispatcher`] drives the async orchestrator from there and
//! makes sure nothing, not even a panicking collaborator, unwinds into the
//! host's dispatch loop.

use super::{HostEvent, LifecycleOrchestrator};
use crate::error::{ModuleError, Result};
use std::panic::{AssertUnwindSafe, catch_unwind};
use tokio::runtime::{Builder, Runtime};

pub struct HostDispatcher {
    runtime: Runtime,
    orchestrator: LifecycleOrchestrator,
}

impl HostDispatcher {
    pub fn new(orchestrator: LifecycleOrchestrator) -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .thread_name("lifecycle-dispatch")
            .build()
            .map_err(|e| ModuleError::Internal(format!("failed to build runtime: {e}")))?;
        Ok(Self {
            runtime,
            orchestrator,
        })
    }

    /// Run one callback to completion on the calling thread
    ///
    /// A panic inside a boot phase still counts as that phase having run, so
    /// the next phase the host delivers is admitted.
    pub fn dispatch(&mut self, event: HostEvent) {
        let label = event.label();
        let phase = event.phase();
        let runtime = &self.runtime;
        let orchestrator = &mut self.orchestrator;

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            runtime.block_on(orchestrator.handle(event));
        }));
        if outcome.is_err() {
            tracing::error!("{} callback panicked; continuing", label);
            if let Some(phase) = phase {
                self.orchestrator.finish_interrupted(phase);
            }
        }
    }

    pub fn orchestrator(&self) -> &LifecycleOrchestrator {
        &self.orchestrator
    }
}
