use crate::config::ConfigError;
use crate::lifecycle::LifecycleError;
use crate::worker::ServiceError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ModuleError>;

#[derive(Debug, Error)]
pub enum ModuleError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("Collaborator not provided: {0}")]
    MissingCollaborator(&'static str),

    #[error("Internal error: {0}")]
    Internal(String),
}
