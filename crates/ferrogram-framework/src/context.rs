//! Per-update dispatch context.
//!
//! [`UpdateContext`] wraps the update being routed and carries the
//! consumption token that implements "first consumer wins".

use std::sync::atomic::{AtomicBool, Ordering};

use ferrogram_core::Update;

/// The context passed to handlers for one dispatch pass.
///
/// A handler claims an update by calling [`consume`](Self::consume). Once
/// consumed, the router starts no further handler for this update.
///
/// # Thread Safety
///
/// The token is an atomic compare-and-set. Under the concurrent execution
/// policy two callbacks may both be running when one of them consumes; only
/// one `consume()` call ever returns `true`.
///
/// # Example
///
/// ```rust,ignore
/// let start = command("start", |bot, ctx| async move {
///     if ctx.consume() {
///         let chat = ctx.update().chat_id().unwrap_or_default();
///         bot.send_message(chat.into(), "Welcome!".into()).await.ok();
///     }
/// });
/// ```
#[derive(Debug)]
pub struct UpdateContext {
    update: Update,
    consumed: AtomicBool,
}

impl UpdateContext {
    /// Creates a fresh, unconsumed context.
    pub fn new(update: Update) -> Self {
        Self {
            update,
            consumed: AtomicBool::new(false),
        }
    }

    /// Returns the update being dispatched.
    pub fn update(&self) -> &Update {
        &self.update
    }

    /// Claims the update.
    ///
    /// Returns `true` if this call performed the claim, `false` if the update
    /// had already been consumed.
    pub fn consume(&self) -> bool {
        self.consumed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Checks whether some handler has consumed the update.
    pub fn is_consumed(&self) -> bool {
        self.consumed.load(Ordering::Acquire)
    }

    /// Consumes the context and returns the update.
    pub fn into_update(self) -> Update {
        self.update
    }
}
