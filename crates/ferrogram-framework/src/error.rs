//! Framework-level error types.

use std::time::Duration;

use thiserror::Error;

/// The error type a handler callback may return.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// The result of one handler invocation.
pub type HandlerResult = Result<(), HandlerError>;

/// A failure caught at the router boundary.
///
/// None of these ever propagate out of the dispatch loop; they are collected
/// into pass reports and, depending on the log level, logged.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A handler callback returned an error.
    #[error("handler '{name}' (#{index}) failed: {source}")]
    HandlerFailed {
        index: usize,
        name: String,
        #[source]
        source: HandlerError,
    },

    /// A handler callback or predicate panicked.
    #[error("handler '{name}' (#{index}) panicked: {message}")]
    HandlerPanicked {
        index: usize,
        name: String,
        message: String,
    },

    /// A handler callback did not finish within the deadline.
    ///
    /// The callback keeps running in the background.
    #[error("handler '{name}' (#{index}) timed out after {timeout:?}")]
    HandlerTimeout {
        index: usize,
        name: String,
        timeout: Duration,
    },

    /// An error handler failed or panicked.
    #[error("error handler #{index} failed: {reason}")]
    ErrorHandlerFailed { index: usize, reason: String },
}

impl DispatchError {
    /// Returns `true` for [`DispatchError::HandlerTimeout`].
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::HandlerTimeout { .. })
    }

    /// Returns the registration index of the handler involved.
    pub fn index(&self) -> usize {
        match self {
            Self::HandlerFailed { index, .. }
            | Self::HandlerPanicked { index, .. }
            | Self::HandlerTimeout { index, .. }
            | Self::ErrorHandlerFailed { index, .. } => *index,
        }
    }
}

/// Errors returned by the framework's own API.
#[derive(Debug, Clone, Error)]
pub enum FrameworkError {
    /// A dispatcher was built without a bot handle.
    #[error("dispatcher requires a bot handle")]
    MissingBot,

    /// A dispatcher was built without an event queue.
    #[error("dispatcher requires an event queue")]
    MissingQueue,

    /// The dispatcher side of the queue is gone.
    #[error("event queue is closed")]
    QueueClosed,
}

/// Result type for framework operations.
pub type FrameworkResult<T> = Result<T, FrameworkError>;
