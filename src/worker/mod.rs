//! Fire-and-forget background services

mod export;

pub use export::{ExportEntry, ExportProcess, ExportSource};

use chrono::{DateTime, Utc};
use rayon::{ThreadPool, ThreadPoolBuildError};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use strum_macros::Display;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Failed to start service {name}: {source}")]
    Spawn {
        name: String,
        #[source]
        source: ThreadPoolBuildError,
    },
}

/// Scheduling priority applied to a service's thread before its work runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ServicePriority {
    Min,
    Normal,
    Max,
}

impl ServicePriority {
    /// Nice value for the service thread; `None` keeps the inherited one
    fn nice(self) -> Option<i32> {
        match self {
            ServicePriority::Min => Some(19),
            ServicePriority::Normal => None,
            ServicePriority::Max => Some(-10),
        }
    }
}

/// Set the calling thread's priority, logging when the OS refuses
#[cfg(target_os = "linux")]
fn apply_priority(name: &str, priority: ServicePriority) {
    let Some(nice) = priority.nice() else {
        return;
    };
    // Linux keeps nice values per thread, so target this thread's id only.
    let result = unsafe {
        let tid = libc::syscall(libc::SYS_gettid) as libc::id_t;
        libc::setpriority(libc::PRIO_PROCESS, tid, nice)
    };
    if result != 0 {
        tracing::warn!(
            "Could not set {} priority for {}: {}",
            priority,
            name,
            std::io::Error::last_os_error()
        );
    }
}

#[cfg(not(target_os = "linux"))]
fn apply_priority(name: &str, priority: ServicePriority) {
    if priority.nice().is_some() {
        tracing::debug!("Thread priority {} for {} unsupported here", priority, name);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ServiceStatus {
    Running,
    Stopped,
    Failed,
}

impl ServiceStatus {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ServiceStatus::Running,
            1 => ServiceStatus::Stopped,
            _ => ServiceStatus::Failed,
        }
    }
}

/// Identifies a started background service
///
/// Handles are bookkeeping only: there is no join or cancel.
#[derive(Clone)]
pub struct ServiceHandle {
    id: Uuid,
    name: String,
    priority: ServicePriority,
    started_at: DateTime<Utc>,
    status: Arc<AtomicU8>,
    // Keeps the dedicated thread addressable for the handle's lifetime.
    _pool: Arc<ThreadPool>,
}

impl ServiceHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priority(&self) -> ServicePriority {
        self.priority
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn status(&self) -> ServiceStatus {
        ServiceStatus::from_u8(self.status.load(Ordering::Acquire))
    }
}

impl std::fmt::Debug for ServiceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceHandle")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("status", &self.status())
            .finish()
    }
}

/// Starts each service on its own named thread and records its handle
#[derive(Debug, Default)]
pub struct ServiceLauncher {
    handles: Vec<ServiceHandle>,
}

impl ServiceLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin running `work` on a dedicated thread; returns immediately
    pub fn start<F>(
        &mut self,
        name: impl Into<String>,
        priority: ServicePriority,
        work: F,
    ) -> Result<ServiceHandle, ServiceError>
    where
        F: FnOnce() -> anyhow::Result<()> + Send + 'static,
    {
        let name = name.into();
        let thread_name = name.clone();
        let panic_name = name.clone();
        let priority_name = name.clone();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(1)
            .thread_name(move |_| thread_name.clone())
            .start_handler(move |_| apply_priority(&priority_name, priority))
            .panic_handler(move |_| {
                tracing::error!("Service {} panicked outside its work", panic_name);
            })
            .build()
            .map_err(|source| ServiceError::Spawn {
                name: name.clone(),
                source,
            })?;

        let handle = ServiceHandle {
            id: Uuid::new_v4(),
            name: name.clone(),
            priority,
            started_at: Utc::now(),
            status: Arc::new(AtomicU8::new(0)),
            _pool: Arc::new(pool),
        };

        tracing::info!("Starting {}", name);

        let status = Arc::clone(&handle.status);
        handle._pool.spawn(move || {
            let span = tracing::info_span!("service", name = %name, priority = %priority);
            let _guard = span.enter();

            let outcome = match catch_unwind(AssertUnwindSafe(work)) {
                Ok(Ok(())) => {
                    tracing::info!("Service {} finished", name);
                    ServiceStatus::Stopped
                }
                Ok(Err(e)) => {
                    tracing::error!("Service {} failed: {:#}", name, e);
                    ServiceStatus::Failed
                }
                Err(_) => {
                    tracing::error!("Service {} panicked", name);
                    ServiceStatus::Failed
                }
            };
            status.store(outcome as u8, Ordering::Release);
        });

        self.handles.push(handle.clone());
        Ok(handle)
    }

    pub fn handles(&self) -> &[ServiceHandle] {
        &self.handles
    }
}
