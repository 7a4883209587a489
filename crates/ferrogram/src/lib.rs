//! # Ferrogram
//!
//! An async Telegram bot client built around a fan-out update dispatcher.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────┐     ┌─────────────┐     ┌────────────────────────────────────┐
//! │ update source │────▶│ event queue │────▶│ Dispatcher                         │
//! │ (poll/webhook)│     │ (FIFO)      │     │  Update ──▶ handler 1 ─▶ 2 ─▶ ...  │──▶ Bot API
//! └───────────────┘     └─────────────┘     │  Error  ──▶ every error handler    │
//!                                           └────────────────────────────────────┘
//! ```
//!
//! - **Core**: updates, platform errors, typed API requests, keyboards, and
//!   the [`Bot`](core::Bot) handle handlers talk to
//! - **Framework**: the event queue, handler registries and the dispatcher
//! - **Runtime**: configuration, logging and the run loop
//!
//! Handlers are visited in registration order. The first one to consume an
//! update ends its pass; failing handlers are reported and skipped.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ferrogram::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = FerrogramRuntime::builder().bot(my_bot()).build()?;
//!
//!     runtime.register_handler(command("start", |bot: BoxedBot, ctx: Arc<UpdateContext>| async move {
//!         if ctx.consume() {
//!             let chat = ctx.update().chat_id().unwrap_or_default();
//!             bot.send_message(chat.into(), "Welcome!".into()).await?;
//!         }
//!         Ok::<_, HandlerError>(())
//!     }));
//!
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config` *(default)*: TOML configuration files
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log output

pub use ferrogram_core as core;
pub use ferrogram_framework as framework;
pub use ferrogram_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use ferrogram::prelude::*;
/// ```
pub mod prelude {
    pub use std::sync::Arc;

    // Runtime - main entry point
    pub use ferrogram_runtime::{FerrogramConfig, FerrogramRuntime};

    // Dispatching
    pub use ferrogram_framework::{
        BoxedErrorHandler, BoxedHandler, Dispatcher, ExecutionPolicy, HandlerError, HandlerResult,
        LogLevel, UpdateContext, UpdateSender, any_update, callback_query, command, error_handler,
        event_queue, handler, text,
    };

    // Outbound calls and data
    pub use ferrogram_core::{
        Bot, BotExt, BoxedBot, ChatId, InlineKeyboardButton, InlineKeyboardMarkup, ParseMode,
        SendMessage, TelegramError, Update,
    };
}
