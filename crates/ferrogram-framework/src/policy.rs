//! Execution policy and log level of a dispatcher.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How long a handler may run under the concurrent policy before the
/// router moves on.
pub const DEFAULT_HANDLER_TIMEOUT: Duration = Duration::from_secs(30);

/// Controls where dispatch passes and handler callbacks run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionPolicy {
    /// Each pass runs inline in the dispatch loop and each callback is
    /// awaited to completion. No timeout is applied.
    Synchronous,

    /// Each pass runs as its own task, so the loop keeps draining the queue.
    /// Within a pass handlers are still started one at a time; each one is
    /// spawned and awaited for at most `handler_timeout`.
    Concurrent {
        handler_timeout: Duration,
        /// Upper bound on passes in flight. `None` means unbounded.
        max_concurrent_updates: Option<usize>,
    },
}

impl ExecutionPolicy {
    /// The concurrent policy with the default timeout and no bound.
    pub fn concurrent() -> Self {
        Self::Concurrent {
            handler_timeout: DEFAULT_HANDLER_TIMEOUT,
            max_concurrent_updates: None,
        }
    }

    /// Sets the per-handler timeout. No effect on the synchronous policy.
    pub fn handler_timeout(self, timeout: Duration) -> Self {
        match self {
            Self::Concurrent {
                max_concurrent_updates,
                ..
            } => Self::Concurrent {
                handler_timeout: timeout,
                max_concurrent_updates,
            },
            other => other,
        }
    }

    /// Bounds the number of passes in flight. No effect on the synchronous
    /// policy.
    pub fn max_concurrent_updates(self, limit: usize) -> Self {
        match self {
            Self::Concurrent {
                handler_timeout, ..
            } => Self::Concurrent {
                handler_timeout,
                max_concurrent_updates: Some(limit),
            },
            other => other,
        }
    }

    pub fn is_concurrent(&self) -> bool {
        matches!(self, Self::Concurrent { .. })
    }
}

impl Default for ExecutionPolicy {
    fn default() -> Self {
        Self::concurrent()
    }
}

/// Which diagnostics the client emits.
///
/// The dispatcher only consults [`should_log_errors`](Self::should_log_errors);
/// `Network` is reserved for transports that trace their traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    None,
    #[default]
    Error,
    Network,
    All,
}

impl LogLevel {
    /// Whether handler failures are reported.
    pub fn should_log_errors(&self) -> bool {
        matches!(self, Self::Error | Self::All)
    }

    /// Whether network traffic is traced.
    pub fn should_log_network(&self) -> bool {
        matches!(self, Self::Network | Self::All)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        assert_eq!(
            ExecutionPolicy::default(),
            ExecutionPolicy::Concurrent {
                handler_timeout: Duration::from_secs(30),
                max_concurrent_updates: None,
            }
        );
    }

    #[test]
    fn test_setters_ignore_synchronous() {
        let policy = ExecutionPolicy::Synchronous
            .handler_timeout(Duration::from_secs(1))
            .max_concurrent_updates(4);
        assert_eq!(policy, ExecutionPolicy::Synchronous);

        let policy = ExecutionPolicy::concurrent()
            .handler_timeout(Duration::from_secs(1))
            .max_concurrent_updates(4);
        assert_eq!(
            policy,
            ExecutionPolicy::Concurrent {
                handler_timeout: Duration::from_secs(1),
                max_concurrent_updates: Some(4),
            }
        );
    }

    #[test]
    fn test_log_level_gates() {
        assert!(LogLevel::Error.should_log_errors());
        assert!(LogLevel::All.should_log_errors());
        assert!(!LogLevel::Network.should_log_errors());
        assert!(!LogLevel::None.should_log_errors());
        assert!(LogLevel::Network.should_log_network());
        assert!(!LogLevel::Error.should_log_network());
    }

    #[test]
    fn test_log_level_deserialize() {
        let level: LogLevel = serde_json::from_str("\"all\"").unwrap();
        assert_eq!(level, LogLevel::All);
    }
}
