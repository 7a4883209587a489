//! Runtime orchestration: configuration, logging and the dispatch loop.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use ferrogram_runtime::FerrogramRuntime;
//!
//! let runtime = FerrogramRuntime::builder()
//!     .config_file("config/ferrogram.toml")
//!     .bot(bot)
//!     .build()?;
//!
//! runtime.register_handler(command("start", on_start));
//!
//! // feed updates from any source
//! let sender = runtime.sender();
//! tokio::spawn(poll_updates(sender));
//!
//! runtime.run().await?;
//! ```

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use ferrogram_core::BoxedBot;
use ferrogram_framework::{
    BoxedErrorHandler, BoxedHandler, Dispatcher, FrameworkError, UpdateSender, event_queue,
};
use tokio::signal;
use tracing::{info, warn};

use crate::config::{ConfigLoader, FerrogramConfig, validate_config};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging;

const LOOP_EXIT_TIMEOUT: Duration = Duration::from_secs(1);

/// Owns a configured [`Dispatcher`] and drives its loop.
///
/// The runtime keeps one [`UpdateSender`] itself, so the queue stays open
/// until the runtime is dropped; update sources get clones through
/// [`sender`](Self::sender).
pub struct FerrogramRuntime {
    config: FerrogramConfig,
    dispatcher: Dispatcher,
    sender: UpdateSender,
}

impl FerrogramRuntime {
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime from an already loaded configuration.
    ///
    /// Validates the configuration, initializes logging (unless a subscriber
    /// is already installed) and builds the dispatcher with the configured
    /// policy.
    pub fn from_config(config: &FerrogramConfig, bot: BoxedBot) -> RuntimeResult<Self> {
        validate_config(config)?;
        logging::init_from_config(&config.logging);

        let (sender, receiver) = event_queue();
        let dispatcher = Dispatcher::builder()
            .bot(bot)
            .receiver(receiver)
            .policy(config.dispatcher.to_policy())
            .log_level(config.dispatcher.log_level)
            .build()?;

        info!(
            mode = ?config.dispatcher.mode,
            log_level = %config.logging.level,
            log_format = ?config.logging.format,
            "Runtime initialized from configuration"
        );

        Ok(Self {
            config: config.clone(),
            dispatcher,
            sender,
        })
    }

    pub fn config(&self) -> &FerrogramConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Returns a producer handle for the event queue.
    pub fn sender(&self) -> UpdateSender {
        self.sender.clone()
    }

    pub fn register_handler(&self, handler: BoxedHandler) {
        self.dispatcher.add_handler(handler);
    }

    /// Registers handlers in iteration order.
    pub fn register_handlers(&self, handlers: impl IntoIterator<Item = BoxedHandler>) {
        for handler in handlers {
            self.dispatcher.add_handler(handler);
        }
    }

    pub fn register_error_handler(&self, handler: BoxedErrorHandler) {
        self.dispatcher.add_error_handler(handler);
    }

    /// Runs until Ctrl+C (or SIGTERM on Unix), then shuts down.
    pub async fn run(&self) -> RuntimeResult<()> {
        #[cfg(unix)]
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;

        info!("Ferrogram runtime is now running. Press Ctrl+C to stop.");

        self.run_until(async move {
            #[cfg(unix)]
            tokio::select! {
                _ = signal::ctrl_c() => info!("Received Ctrl+C, shutting down"),
                _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
            }

            #[cfg(not(unix))]
            {
                let _ = signal::ctrl_c().await;
                info!("Received Ctrl+C, shutting down");
            }
        })
        .await
    }

    /// Runs the dispatch loop until `shutdown` completes.
    ///
    /// On shutdown the loop is interrupted and in-flight work gets
    /// `dispatcher.shutdown_grace_secs` to finish.
    pub async fn run_until<F>(&self, shutdown: F) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        let dispatcher = self.dispatcher.clone();
        let mut dispatch_loop =
            tokio::spawn(async move { dispatcher.start_checking_updates().await });

        let loop_ended = tokio::select! {
            () = shutdown => false,
            joined = &mut dispatch_loop => {
                joined.map_err(|e| RuntimeError::DispatchLoop(e.to_string()))?;
                true
            }
        };

        let grace = self.config.dispatcher.shutdown_grace();
        if !self.dispatcher.shutdown(grace).await {
            warn!(?grace, "In-flight handlers did not finish within the grace period");
        }

        // An interrupt issued before the loop picked up its token is lost,
        // so the loop only gets a bounded wait.
        if !loop_ended {
            match tokio::time::timeout(LOOP_EXIT_TIMEOUT, &mut dispatch_loop).await {
                Ok(joined) => joined.map_err(|e| RuntimeError::DispatchLoop(e.to_string()))?,
                Err(_) => {
                    warn!("Dispatch loop did not observe the interrupt, aborting it");
                    dispatch_loop.abort();
                }
            }
        }

        info!("Runtime stopped");
        Ok(())
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for a [`FerrogramRuntime`] with loaded configuration.
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
    bot: Option<BoxedBot>,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new(),
            bot: None,
        }
    }

    /// Sets the outbound bot handle given to every handler.
    pub fn bot(mut self, bot: BoxedBot) -> Self {
        self.bot = Some(bot);
        self
    }

    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    pub fn with_env(mut self) -> Self {
        self.config_loader = self.config_loader.with_env();
        self
    }

    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    pub fn merge(mut self, config: FerrogramConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    pub fn build(self) -> RuntimeResult<FerrogramRuntime> {
        let bot = self.bot.ok_or(FrameworkError::MissingBot)?;
        let config = self.config_loader.load()?;
        FerrogramRuntime::from_config(&config, bot)
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
