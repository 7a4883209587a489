//! Shortcut constructors for common handlers.
//!
//! Each function pairs a ready-made predicate with the given callback and
//! names the handler after what it matches:
//!
//! ```rust,ignore
//! dispatcher.add_handler(command("start", |bot, ctx| async move { ... }));
//! dispatcher.add_handler(callback_query(Some("like"), |bot, ctx| async move { ... }));
//! dispatcher.add_handler(text(|bot, ctx| async move { ... }));
//! ```

use std::future::Future;
use std::sync::Arc;

use ferrogram_core::{BoxedBot, Update};

use crate::context::UpdateContext;
use crate::handler::{BoxedHandler, HandlerFn, IntoHandlerResult};

/// Matches messages whose command equals `name`.
///
/// A leading `/` in `name` is optional. `/start@my_bot` matches `"start"`.
pub fn command<F, Fut>(name: &str, callback: F) -> BoxedHandler
where
    F: Fn(BoxedBot, Arc<UpdateContext>) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: IntoHandlerResult,
{
    let name = name.trim_start_matches('/').to_string();
    let label = format!("command:/{name}");
    HandlerFn::new(move |u: &Update| u.command() == Some(name.as_str()), callback)
        .named(label)
        .boxed()
}

/// Matches every message carrying text, commands included.
pub fn text<F, Fut>(callback: F) -> BoxedHandler
where
    F: Fn(BoxedBot, Arc<UpdateContext>) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: IntoHandlerResult,
{
    HandlerFn::new(|u: &Update| u.text().is_some(), callback)
        .named("text")
        .boxed()
}

/// Matches callback queries, optionally only those with exactly `data`.
pub fn callback_query<F, Fut>(data: Option<&str>, callback: F) -> BoxedHandler
where
    F: Fn(BoxedBot, Arc<UpdateContext>) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: IntoHandlerResult,
{
    let data = data.map(str::to_string);
    let label = match &data {
        Some(d) => format!("callback_query:{d}"),
        None => "callback_query".to_string(),
    };
    HandlerFn::new(
        move |u: &Update| match (&u.callback_query, &data) {
            (Some(_), None) => true,
            (Some(_), Some(expected)) => u.callback_data() == Some(expected.as_str()),
            (None, _) => false,
        },
        callback,
    )
    .named(label)
    .boxed()
}

/// Matches every update.
pub fn any_update<F, Fut>(callback: F) -> BoxedHandler
where
    F: Fn(BoxedBot, Arc<UpdateContext>) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: IntoHandlerResult,
{
    HandlerFn::new(|_: &Update| true, callback)
        .named("any")
        .boxed()
}
