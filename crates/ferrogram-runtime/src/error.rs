//! Runtime error types.

use ferrogram_framework::FrameworkError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur during runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Dispatcher error: {0}")]
    Framework(#[from] FrameworkError),

    /// Installing the shutdown signal handlers failed.
    #[error("Failed to listen for shutdown signals: {0}")]
    Signal(#[from] std::io::Error),

    /// The dispatch loop task ended abnormally.
    #[error("Dispatch loop failed: {0}")]
    DispatchLoop(String),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
