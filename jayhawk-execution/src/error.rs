//! Error types for child process supervision

use thiserror::Error;

/// Result alias for supervisor operations
pub type SupervisorResult<T> = Result<T, SupervisorError>;

/// Child process supervision errors
#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error("Failed to spawn '{program}': {source}")]
    SpawnError {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("A child process is already running (pid {pid})")]
    AlreadyRunning { pid: u32 },

    #[error("Invalid child command: {0}")]
    InvalidCommand(String),

    #[error("Child process {pid} did not exit after a forced kill")]
    Unresponsive { pid: u32 },
}

/// Runtime lifecycle errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition {
        from: crate::lifecycle::RuntimeState,
        to: crate::lifecycle::RuntimeState,
    },
}
