//! # Ferrogram Framework
//!
//! The update dispatcher of the Ferrogram bot client.
//!
//! ## Architecture
//!
//! ```text
//! update source ──► UpdateSender ══ event queue ══► Dispatcher loop
//!                                                        │
//!                     ┌──────────────────────────────────┴──────┐
//!                     ▼                                         ▼
//!              Update: fan-out pass                 TelegramError: every
//!              over Handler registry                ErrorHandler, in order
//!              (stops once consumed)
//! ```
//!
//! - [`queue`]: the unbounded FIFO between update source and dispatcher
//! - [`handler`]: the [`Handler`] and [`ErrorHandler`] traits and closure
//!   adapters
//! - [`routing`]: ready-made predicates for commands, text and callback
//!   queries
//! - [`dispatcher`]: the loop, the fan-out router and the error router
//!
//! ## Example
//!
//! ```rust,ignore
//! use ferrogram_framework::{Dispatcher, ExecutionPolicy, command, event_queue};
//!
//! let (sender, receiver) = event_queue();
//! let dispatcher = Dispatcher::builder()
//!     .bot(bot)
//!     .receiver(receiver)
//!     .policy(ExecutionPolicy::concurrent())
//!     .build()?;
//!
//! dispatcher.add_handler(command("start", |bot, ctx| async move {
//!     ctx.consume();
//! }));
//! dispatcher.start_checking_updates().await;
//! ```

pub mod context;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod policy;
pub mod queue;
pub mod registry;
pub mod routing;

#[cfg(test)]
pub(crate) mod testing;

pub use context::UpdateContext;
pub use dispatcher::{Dispatcher, DispatcherBuilder, ErrorPassReport, PassReport};
pub use error::{DispatchError, FrameworkError, FrameworkResult, HandlerError, HandlerResult};
pub use handler::{
    BoxFuture, BoxedErrorHandler, BoxedHandler, ErrorHandler, ErrorHandlerFn, Handler, HandlerFn,
    IntoHandlerResult, error_handler, handler,
};
pub use policy::{DEFAULT_HANDLER_TIMEOUT, ExecutionPolicy, LogLevel};
pub use queue::{DispatchableObject, UpdateReceiver, UpdateSender, event_queue};
pub use registry::Registry;
pub use routing::{any_update, callback_query, command, text};
