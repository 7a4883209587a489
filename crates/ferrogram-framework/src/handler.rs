//! Handler traits for the Ferrogram dispatcher.
//!
//! Two kinds of handlers are registered on a [`Dispatcher`](crate::Dispatcher):
//!
//! - [`Handler`]: a predicate over updates plus an async callback
//! - [`ErrorHandler`]: an async callback over platform errors
//!
//! Both are stored as `Arc<dyn ...>` so the same handle can later be passed
//! back for removal. Closures are turned into handlers with [`handler`] and
//! [`error_handler`], or with the shortcuts in [`routing`](crate::routing).
//!
//! # Example
//!
//! ```rust,ignore
//! use ferrogram_framework::{handler, HandlerError};
//!
//! let shout = handler(
//!     |update| update.text().is_some_and(|t| t.ends_with('!')),
//!     |bot, ctx| async move {
//!         ctx.consume();
//!         let chat = ctx.update().chat_id().ok_or("no chat")?;
//!         bot.send_message(chat.into(), "calm down".into()).await?;
//!         Ok::<_, HandlerError>(())
//!     },
//! );
//! dispatcher.add_handler(shout.clone());
//! ```

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use ferrogram_core::{BoxedBot, TelegramError, Update};

use crate::context::UpdateContext;
use crate::error::{HandlerError, HandlerResult};

/// A type alias for a boxed, pinned future that is `Send`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A shared, type-erased update handler.
pub type BoxedHandler = Arc<dyn Handler>;

/// A shared, type-erased error handler.
pub type BoxedErrorHandler = Arc<dyn ErrorHandler>;

// ============================================================================
// Traits
// ============================================================================

/// An update handler: a predicate plus a callback.
///
/// The dispatcher calls [`check_update`](Self::check_update) first and only
/// runs [`handle`](Self::handle) when it returns `true`. The callback
/// receives the injected bot handle and the shared [`UpdateContext`]; it
/// consumes the update through the context.
pub trait Handler: Send + Sync {
    /// A label used in logs and dispatch errors.
    fn name(&self) -> &str {
        "handler"
    }

    /// Decides whether this handler applies to the update.
    fn check_update(&self, update: &Update) -> bool;

    /// Runs the callback.
    fn handle(&self, bot: BoxedBot, ctx: Arc<UpdateContext>) -> BoxFuture<'static, HandlerResult>;
}

/// A callback for platform errors received through the event queue.
pub trait ErrorHandler: Send + Sync {
    fn handle_error(&self, bot: BoxedBot, error: TelegramError) -> BoxFuture<'static, HandlerResult>;
}

// ============================================================================
// Callback return values
// ============================================================================

/// Conversion from a callback's return value into a [`HandlerResult`].
///
/// Callbacks may return `()` or any `Result<(), E>` whose error converts
/// into [`HandlerError`].
pub trait IntoHandlerResult {
    fn into_handler_result(self) -> HandlerResult;
}

impl IntoHandlerResult for () {
    fn into_handler_result(self) -> HandlerResult {
        Ok(())
    }
}

impl<E> IntoHandlerResult for Result<(), E>
where
    E: Into<HandlerError>,
{
    fn into_handler_result(self) -> HandlerResult {
        self.map_err(Into::into)
    }
}

// ============================================================================
// Closure-backed handlers
// ============================================================================

/// A [`Handler`] built from a predicate closure and a callback closure.
pub struct HandlerFn<P, F> {
    name: Option<String>,
    predicate: P,
    callback: F,
}

impl<P, F> HandlerFn<P, F> {
    pub fn new(predicate: P, callback: F) -> Self {
        Self {
            name: None,
            predicate,
            callback,
        }
    }

    /// Sets the name reported in logs.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl<P, F, Fut> HandlerFn<P, F>
where
    P: Fn(&Update) -> bool + Send + Sync + 'static,
    F: Fn(BoxedBot, Arc<UpdateContext>) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: IntoHandlerResult,
{
    /// Erases the handler type so it can be registered.
    pub fn boxed(self) -> BoxedHandler {
        Arc::new(self)
    }
}

impl<P, F, Fut> Handler for HandlerFn<P, F>
where
    P: Fn(&Update) -> bool + Send + Sync + 'static,
    F: Fn(BoxedBot, Arc<UpdateContext>) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: IntoHandlerResult,
{
    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("handler")
    }

    fn check_update(&self, update: &Update) -> bool {
        (self.predicate)(update)
    }

    fn handle(&self, bot: BoxedBot, ctx: Arc<UpdateContext>) -> BoxFuture<'static, HandlerResult> {
        let fut = (self.callback)(bot, ctx);
        Box::pin(async move { fut.await.into_handler_result() })
    }
}

impl<P, F> fmt::Debug for HandlerFn<P, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerFn")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// An [`ErrorHandler`] built from a callback closure.
pub struct ErrorHandlerFn<F> {
    callback: F,
}

impl<F, Fut> ErrorHandler for ErrorHandlerFn<F>
where
    F: Fn(BoxedBot, TelegramError) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: IntoHandlerResult,
{
    fn handle_error(&self, bot: BoxedBot, error: TelegramError) -> BoxFuture<'static, HandlerResult> {
        let fut = (self.callback)(bot, error);
        Box::pin(async move { fut.await.into_handler_result() })
    }
}

/// Creates an update handler from a predicate and a callback.
pub fn handler<P, F, Fut>(predicate: P, callback: F) -> BoxedHandler
where
    P: Fn(&Update) -> bool + Send + Sync + 'static,
    F: Fn(BoxedBot, Arc<UpdateContext>) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: IntoHandlerResult,
{
    HandlerFn::new(predicate, callback).boxed()
}

/// Creates an error handler from a callback.
pub fn error_handler<F, Fut>(callback: F) -> BoxedErrorHandler
where
    F: Fn(BoxedBot, TelegramError) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: IntoHandlerResult,
{
    Arc::new(ErrorHandlerFn { callback })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockBot;

    #[tokio::test]
    async fn test_handler_fn_predicate_and_callback() {
        let h = HandlerFn::new(
            |u: &Update| u.text() == Some("ping"),
            |_bot: BoxedBot, ctx: Arc<UpdateContext>| async move {
                ctx.consume();
            },
        )
        .named("ping")
        .boxed();

        assert_eq!(h.name(), "ping");
        assert!(h.check_update(&Update::text_message(1, 1, "ping")));
        assert!(!h.check_update(&Update::text_message(2, 1, "pong")));

        let ctx = Arc::new(UpdateContext::new(Update::text_message(1, 1, "ping")));
        h.handle(MockBot::boxed(), Arc::clone(&ctx)).await.unwrap();
        assert!(ctx.is_consumed());
    }

    #[tokio::test]
    async fn test_callback_error_is_returned() {
        let h = handler(
            |_| true,
            |_bot, _ctx| async move { Err::<(), HandlerError>("boom".into()) },
        );
        let ctx = Arc::new(UpdateContext::new(Update::default()));
        let err = h.handle(MockBot::boxed(), ctx).await.unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    #[tokio::test]
    async fn test_error_handler_receives_error() {
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let h = error_handler(move |_bot, error| {
            let sink = Arc::clone(&sink);
            async move {
                sink.lock().push(error);
            }
        });

        h.handle_error(MockBot::boxed(), TelegramError::network("reset"))
            .await
            .unwrap();
        assert_eq!(*seen.lock(), vec![TelegramError::network("reset")]);
    }
}
