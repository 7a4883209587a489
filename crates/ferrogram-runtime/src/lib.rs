//! Ferrogram Runtime - orchestration layer for the Ferrogram bot client.
//!
//! This crate provides:
//! - Layered configuration loading (`ConfigLoader`, `FerrogramConfig`)
//! - Logging setup (`LoggingBuilder`, `logging::init_from_config`)
//! - Runtime orchestration (`FerrogramRuntime`): builds the dispatcher from
//!   configuration and runs its loop until a shutdown signal
//!
//! ```ignore
//! use ferrogram_runtime::FerrogramRuntime;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = FerrogramRuntime::builder().bot(my_bot()).build()?;
//!     runtime.register_handler(command("start", on_start));
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

pub use config::{
    ConfigError, ConfigLoader, ConfigResult, DispatchMode, DispatcherConfig, FerrogramConfig,
    LoggingConfig,
};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use runtime::{FerrogramRuntime, RuntimeBuilder};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for the logging macros.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
