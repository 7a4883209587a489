//! Configuration module for the Ferrogram runtime.
//!
//! This module provides figment-based configuration loading and validation
//! for the dispatcher and the logging subscriber.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    DispatchMode, DispatcherConfig, FerrogramConfig, LogFormat, LogOutput, LogRotation,
    LoggingConfig, SpanEventConfig, TracingLevel,
};
pub use validation::validate_config;
