//! Lifecycle-specific error types

use super::Phase;
use thiserror::Error;

/// Errors that can occur during lifecycle operations
///
/// None of these ever reach the host: the orchestrator terminates each one in
/// a log entry, a user-visible notice, or a recovered default.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// A required companion module is not loaded
    #[error("Missing required dependency: {0}")]
    MissingDependency(String),

    /// A primary phase arrived before its predecessor completed
    #[error("Phase {actual} arrived out of order (expected {expected})")]
    OutOfOrder {
        /// The phase the tracker was waiting for
        expected: Phase,
        /// The phase that was delivered
        actual: Phase,
    },

    /// A phase or stop callback fired with nothing to act on
    #[error("Redundant lifecycle call: {0}")]
    RedundantLifecycleCall(Phase),

    /// An optional companion feature is absent
    #[error("Optional integration unavailable: {0}")]
    OptionalIntegrationUnavailable(String),

    /// Subsystem initialization failed
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    /// A subsystem hook returned an error
    #[error("Hook execution failed for {subsystem} during {phase}: {message}")]
    HookFailed {
        /// Name of the subsystem that failed
        subsystem: String,
        /// Phase in which the hook ran
        phase: Phase,
        /// Error message
        message: String,
    },
}

impl LifecycleError {
    /// Create a missing dependency error
    pub fn missing_dependency(module_id: impl Into<String>) -> Self {
        Self::MissingDependency(module_id.into())
    }

    /// Create an initialization failure error
    pub fn init_failed(msg: impl Into<String>) -> Self {
        Self::InitializationFailed(msg.into())
    }

    /// Create an optional integration error
    pub fn optional_unavailable(what: impl Into<String>) -> Self {
        Self::OptionalIntegrationUnavailable(what.into())
    }

    /// Create a hook failure error
    pub fn hook_failed(
        subsystem: impl Into<String>,
        phase: Phase,
        message: impl Into<String>,
    ) -> Self {
        Self::HookFailed {
            subsystem: subsystem.into(),
            phase,
            message: message.into(),
        }
    }

    /// Whether this error only records a benign skipped step.
    pub fn is_benign(&self) -> bool {
        matches!(
            self,
            Self::OutOfOrder { .. }
                | Self::RedundantLifecycleCall(_)
                | Self::OptionalIntegrationUnavailable(_)
        )
    }
}

/// A specialized Result type for lifecycle operations
pub type Result<T> = std::result::Result<T, LifecycleError>;
