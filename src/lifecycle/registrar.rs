//! Subsystem Registrar
//!
//! Runs every registered subsystem through the three boot phases.

use super::{
    InitContext, LifecycleError, Phase, PostInitContext, PreInitContext, Result, Subsystem,
};
use std::sync::Arc;
use tokio::sync::RwLock;

/// A subsystem plus the name it is logged under
struct RegisteredSubsystem {
    subsystem: Arc<RwLock<dyn Subsystem>>,
    name: String,
}

/// Performs the ordered registration of all subsystems
///
/// Subsystems run in the order they were registered, in every phase. A phase
/// stops at the first failing subsystem, since later subsystems may depend on
/// what earlier ones registered.
///
/// # Example
///
/// ```rust,ignore
/// use modhost_lifecycle::lifecycle::SubsystemRegistrar;
///
/// let mut registrar = SubsystemRegistrar::new();
/// registrar.register(blocks, "Blocks");
/// registrar.register(recipes, "Recipes");
///
/// registrar.pre_init(&ctx).await?;
/// ```
#[derive(Default)]
pub struct SubsystemRegistrar {
    subsystems: Vec<RegisteredSubsystem>,
}

impl SubsystemRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T>(&mut self, subsystem: Arc<RwLock<T>>, name: impl Into<String>)
    where
        T: Subsystem + 'static,
    {
        self.subsystems.push(RegisteredSubsystem {
            subsystem,
            name: name.into(),
        });
    }

    pub async fn pre_init(&self, ctx: &PreInitContext<'_>) -> Result<()> {
        for entry in &self.subsystems {
            tracing::debug!("PreInit: {}", entry.name);
            let mut subsystem = entry.subsystem.write().await;
            subsystem
                .pre_init(ctx)
                .await
                .map_err(|e| Self::failed(&entry.name, Phase::PreInit, e))?;
        }
        self.complete(Phase::PreInit);
        Ok(())
    }

    pub async fn init(&self, ctx: &InitContext<'_>) -> Result<()> {
        for entry in &self.subsystems {
            tracing::debug!("Init: {}", entry.name);
            let mut subsystem = entry.subsystem.write().await;
            subsystem
                .init(ctx)
                .await
                .map_err(|e| Self::failed(&entry.name, Phase::Init, e))?;
        }
        self.complete(Phase::Init);
        Ok(())
    }

    pub async fn post_init(&self, ctx: &PostInitContext<'_>) -> Result<()> {
        for entry in &self.subsystems {
            tracing::debug!("PostInit: {}", entry.name);
            let mut subsystem = entry.subsystem.write().await;
            subsystem
                .post_init(ctx)
                .await
                .map_err(|e| Self::failed(&entry.name, Phase::PostInit, e))?;
        }
        self.complete(Phase::PostInit);
        Ok(())
    }

    // The caller logs the returned error.
    fn failed(name: &str, phase: Phase, error: LifecycleError) -> LifecycleError {
        LifecycleError::hook_failed(name, phase, error.to_string())
    }

    fn complete(&self, phase: Phase) {
        tracing::debug!(
            "{} registration complete ({} subsystems)",
            phase,
            self.subsystems.len()
        );
    }

    pub fn len(&self) -> usize {
        self.subsystems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subsystems.is_empty()
    }
}
