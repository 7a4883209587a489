//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{DispatchMode, DispatcherConfig, FerrogramConfig, LogOutput, LoggingConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &FerrogramConfig) -> ConfigResult<()> {
    validate_dispatcher_config(&config.dispatcher)?;
    validate_logging_config(&config.logging)?;
    Ok(())
}

fn validate_dispatcher_config(dispatcher: &DispatcherConfig) -> ConfigResult<()> {
    if dispatcher.mode == DispatchMode::Concurrent && dispatcher.handler_timeout_secs == 0 {
        return Err(ConfigError::validation(
            "Handler timeout must be greater than 0",
        ));
    }

    if dispatcher.max_concurrent_updates == Some(0) {
        return Err(ConfigError::validation(
            "max_concurrent_updates must be greater than 0 when set",
        ));
    }

    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File {
        match &logging.file_path {
            None => {
                return Err(ConfigError::validation(
                    "File output requires logging.file_path",
                ));
            }
            Some(path) if path.as_os_str().is_empty() => {
                return Err(ConfigError::validation("logging.file_path is empty"));
            }
            Some(_) => {}
        }
    }

    Ok(())
}
