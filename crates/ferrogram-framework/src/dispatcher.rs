//! The update dispatcher.
//!
//! A [`Dispatcher`] owns the receiving end of the event queue and two
//! handler registries. Its loop takes one item at a time and routes it:
//!
//! - an [`Update`] goes through a *fan-out pass*: handlers are visited in
//!   registration order, non-matching ones are skipped, matching ones are
//!   invoked, and the pass stops as soon as the update is consumed
//! - a [`TelegramError`] is given to every error handler, in order
//!
//! Handler failures of any kind (returned errors, panics, timeouts) are
//! caught at the router boundary and never end the loop.
//!
//! # Execution policies
//!
//! Under [`ExecutionPolicy::Synchronous`] the loop awaits each pass and each
//! callback to completion. Under [`ExecutionPolicy::Concurrent`] every pass
//! becomes a task, and every callback is spawned and awaited for at most the
//! configured timeout; a timed-out callback is not cancelled and keeps
//! running in the background.
//!
//! # Example
//!
//! ```rust,ignore
//! let (sender, receiver) = event_queue();
//! let dispatcher = Dispatcher::builder()
//!     .bot(bot)
//!     .receiver(receiver)
//!     .build()?;
//!
//! dispatcher.add_handler(command("start", on_start));
//! tokio::spawn({
//!     let dispatcher = dispatcher.clone();
//!     async move { dispatcher.start_checking_updates().await }
//! });
//! sender.send_update(update)?;
//! ```

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use ferrogram_core::{BoxedBot, TelegramError, Update};
use futures::FutureExt;
use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{Instrument, Level, debug, error, info, span, trace, warn};

use crate::context::UpdateContext;
use crate::error::{DispatchError, FrameworkError, FrameworkResult};
use crate::handler::{BoxedErrorHandler, BoxedHandler, ErrorHandler, Handler};
use crate::policy::{ExecutionPolicy, LogLevel};
use crate::queue::{DispatchableObject, UpdateReceiver};
use crate::registry::Registry;

// ============================================================================
// Pass reports
// ============================================================================

/// What happened during one fan-out pass.
#[derive(Debug, Default)]
pub struct PassReport {
    pub update_id: i64,
    /// Handlers whose callback was started.
    pub invoked: usize,
    /// Handlers whose predicate rejected the update.
    pub skipped: usize,
    /// Registration index of the handler after which the update was found
    /// consumed.
    pub consumed_by: Option<usize>,
    pub errors: Vec<DispatchError>,
}

impl PassReport {
    fn new(update_id: i64) -> Self {
        Self {
            update_id,
            ..Default::default()
        }
    }

    pub fn is_consumed(&self) -> bool {
        self.consumed_by.is_some()
    }

    /// Number of handlers that hit the timeout.
    pub fn timeouts(&self) -> usize {
        self.errors.iter().filter(|e| e.is_timeout()).count()
    }
}

/// What happened while routing one platform error.
#[derive(Debug, Default)]
pub struct ErrorPassReport {
    pub invoked: usize,
    pub errors: Vec<DispatchError>,
}

// ============================================================================
// Dispatcher
// ============================================================================

struct Inner {
    bot: BoxedBot,
    policy: ExecutionPolicy,
    log_level: LogLevel,
    handlers: Registry<dyn Handler>,
    error_handlers: Registry<dyn ErrorHandler>,
    queue: AsyncMutex<UpdateReceiver>,
    stopped: AtomicBool,
    running: AtomicBool,
    interrupt: Mutex<CancellationToken>,
    tracker: TaskTracker,
    permits: Option<Arc<Semaphore>>,
}

/// Routes queued updates and errors to registered handlers.
///
/// Cloning is cheap; all clones share registries, queue and lifecycle state.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

impl Dispatcher {
    /// Creates a dispatcher with the default policy and log level.
    pub fn new(bot: BoxedBot, receiver: UpdateReceiver) -> Self {
        Self::from_parts(bot, receiver, ExecutionPolicy::default(), LogLevel::default())
    }

    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::default()
    }

    fn from_parts(
        bot: BoxedBot,
        receiver: UpdateReceiver,
        policy: ExecutionPolicy,
        log_level: LogLevel,
    ) -> Self {
        let permits = match policy {
            ExecutionPolicy::Concurrent {
                max_concurrent_updates: Some(limit),
                ..
            } => Some(Arc::new(Semaphore::new(limit.max(1)))),
            _ => None,
        };

        Self {
            inner: Arc::new(Inner {
                bot,
                policy,
                log_level,
                handlers: Registry::new(),
                error_handlers: Registry::new(),
                queue: AsyncMutex::new(receiver),
                stopped: AtomicBool::new(false),
                running: AtomicBool::new(false),
                interrupt: Mutex::new(CancellationToken::new()),
                tracker: TaskTracker::new(),
                permits,
            }),
        }
    }

    pub fn bot(&self) -> &BoxedBot {
        &self.inner.bot
    }

    pub fn policy(&self) -> ExecutionPolicy {
        self.inner.policy
    }

    pub fn log_level(&self) -> LogLevel {
        self.inner.log_level
    }

    // ------------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------------

    /// Appends an update handler. Takes effect from the next pass.
    pub fn add_handler(&self, handler: BoxedHandler) {
        debug!(handler = handler.name(), "Handler added");
        self.inner.handlers.add(handler);
    }

    /// Removes the first registration of `handler`.
    ///
    /// Returns `false` if it was not registered.
    pub fn remove_handler(&self, handler: &BoxedHandler) -> bool {
        let removed = self.inner.handlers.remove(handler);
        debug!(handler = handler.name(), removed, "Handler removal");
        removed
    }

    pub fn add_error_handler(&self, handler: BoxedErrorHandler) {
        self.inner.error_handlers.add(handler);
    }

    pub fn remove_error_handler(&self, handler: &BoxedErrorHandler) -> bool {
        self.inner.error_handlers.remove(handler)
    }

    pub fn handler_count(&self) -> usize {
        self.inner.handlers.len()
    }

    pub fn error_handler_count(&self) -> usize {
        self.inner.error_handlers.len()
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Runs the dispatch loop.
    ///
    /// Clears the stop flag, then takes items from the queue in FIFO order
    /// until [`stop_checking_updates`](Self::stop_checking_updates) is
    /// observed at an item boundary, [`interrupt`](Self::interrupt) is
    /// called, or every sender is dropped and the queue is drained.
    ///
    /// Only one loop consumes the queue at a time; a second call waits for
    /// the first to return.
    pub async fn start_checking_updates(&self) {
        let inner = &self.inner;
        let mut queue = inner.queue.lock().await;

        inner.stopped.store(false, Ordering::SeqCst);
        inner.tracker.reopen();
        let interrupt = inner.interrupt.lock().clone();
        let _running = RunningFlag::raise(&inner.running);
        info!(bot = inner.bot.id(), policy = ?inner.policy, "Dispatcher started checking updates");

        while !inner.stopped.load(Ordering::SeqCst) {
            // Taken before the item so a bounded loop waiting for a free slot
            // still answers to `interrupt` without dropping a dequeued item.
            let permit = match &inner.permits {
                Some(permits) => tokio::select! {
                    biased;
                    _ = interrupt.cancelled() => {
                        debug!("Dispatch loop interrupted while waiting for a slot");
                        break;
                    }
                    permit = Arc::clone(permits).acquire_owned() => permit.ok(),
                },
                None => None,
            };

            let item = tokio::select! {
                biased;
                _ = interrupt.cancelled() => {
                    debug!("Dispatch loop interrupted");
                    break;
                }
                item = queue.recv() => item,
            };

            match item {
                Some(item) => self.handle_item(item, permit).await,
                None => {
                    info!("Event queue closed");
                    break;
                }
            }
        }

        info!("Dispatcher stopped checking updates");
    }

    /// Asks the loop to stop before its next item.
    ///
    /// A loop blocked on an empty queue notices the flag only when the next
    /// item arrives; use [`interrupt`](Self::interrupt) to wake it.
    pub fn stop_checking_updates(&self) {
        self.inner.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.load(Ordering::SeqCst)
    }

    /// Whether a dispatch loop is currently running.
    pub fn is_checking_updates(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    /// Wakes a running loop and makes it return, even while it waits for
    /// the queue or for a free concurrency slot. Items still queued stay
    /// queued.
    pub fn interrupt(&self) {
        let token = std::mem::replace(&mut *self.inner.interrupt.lock(), CancellationToken::new());
        token.cancel();
    }

    /// Stops the loop and waits up to `grace` for passes and callbacks
    /// still in flight.
    ///
    /// Returns `true` if everything finished in time.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        self.stop_checking_updates();
        self.interrupt();
        self.inner.tracker.close();

        let drained = tokio::time::timeout(grace, self.inner.tracker.wait())
            .await
            .is_ok();
        if drained {
            info!("Dispatcher shut down");
        } else {
            warn!(
                in_flight = self.inner.tracker.len(),
                ?grace,
                "Dispatcher shut down with tasks still running"
            );
        }
        drained
    }

    /// Number of passes and callbacks still running in the background.
    pub fn in_flight(&self) -> usize {
        self.inner.tracker.len()
    }

    /// Waits until no background pass or callback is running.
    ///
    /// Leaves the tracker closed, so it never undoes a concurrent
    /// [`shutdown`](Self::shutdown); the next
    /// [`start_checking_updates`](Self::start_checking_updates) reopens it.
    pub async fn wait_idle(&self) {
        self.inner.tracker.close();
        self.inner.tracker.wait().await;
    }

    async fn handle_item(&self, item: DispatchableObject, permit: Option<OwnedSemaphorePermit>) {
        match item {
            DispatchableObject::Update(update) => match self.inner.policy {
                ExecutionPolicy::Synchronous => {
                    self.dispatch_update(update).await;
                }
                ExecutionPolicy::Concurrent { .. } => {
                    let dispatcher = self.clone();
                    self.inner.tracker.spawn(async move {
                        let _permit = permit;
                        dispatcher.dispatch_update(update).await;
                    });
                }
            },
            DispatchableObject::Error(error) => {
                self.dispatch_error(error).await;
            }
        }
    }

    // ------------------------------------------------------------------------
    // Routing
    // ------------------------------------------------------------------------

    /// Runs one fan-out pass for `update` in the current task.
    ///
    /// Handler callbacks still follow the execution policy.
    pub async fn dispatch_update(&self, update: Update) -> PassReport {
        let span = span!(Level::DEBUG, "dispatch", update_id = update.update_id);
        self.fan_out(update).instrument(span).await
    }

    async fn fan_out(&self, update: Update) -> PassReport {
        let ctx = Arc::new(UpdateContext::new(update));
        let mut report = PassReport::new(ctx.update().update_id);

        for (index, handler) in self.inner.handlers.snapshot().iter().enumerate() {
            if ctx.is_consumed() {
                debug!("Update consumed, stopping dispatch");
                break;
            }

            match guarded(|| handler.check_update(ctx.update())) {
                Ok(true) => {}
                Ok(false) => {
                    trace!(handler = handler.name(), "Predicate rejected update");
                    report.skipped += 1;
                    continue;
                }
                Err(message) => {
                    report.skipped += 1;
                    self.record(
                        &mut report.errors,
                        DispatchError::HandlerPanicked {
                            index,
                            name: handler.name().to_string(),
                            message,
                        },
                    );
                    continue;
                }
            }

            report.invoked += 1;
            if let Err(err) = self.invoke(index, handler, Arc::clone(&ctx)).await {
                self.record(&mut report.errors, err);
            }

            if report.consumed_by.is_none() && ctx.is_consumed() {
                report.consumed_by = Some(index);
            }
        }

        trace!(
            invoked = report.invoked,
            skipped = report.skipped,
            consumed = report.is_consumed(),
            "Pass finished"
        );
        report
    }

    async fn invoke(
        &self,
        index: usize,
        handler: &BoxedHandler,
        ctx: Arc<UpdateContext>,
    ) -> Result<(), DispatchError> {
        let panicked = |message: String| DispatchError::HandlerPanicked {
            index,
            name: handler.name().to_string(),
            message,
        };

        let bot = Arc::clone(&self.inner.bot);
        let call = guarded(|| handler.handle(bot, ctx)).map_err(panicked)?;

        let outcome = match self.inner.policy {
            ExecutionPolicy::Synchronous => match AssertUnwindSafe(call).catch_unwind().await {
                Ok(result) => result,
                Err(payload) => return Err(panicked(panic_message(payload.as_ref()))),
            },
            ExecutionPolicy::Concurrent {
                handler_timeout, ..
            } => {
                let task = self.inner.tracker.spawn(call);
                match tokio::time::timeout(handler_timeout, task).await {
                    Ok(Ok(result)) => result,
                    Ok(Err(join_error)) if join_error.is_panic() => {
                        return Err(panicked(panic_message(join_error.into_panic().as_ref())));
                    }
                    Ok(Err(_)) => return Err(panicked("handler task was cancelled".to_string())),
                    Err(_) => {
                        return Err(DispatchError::HandlerTimeout {
                            index,
                            name: handler.name().to_string(),
                            timeout: handler_timeout,
                        });
                    }
                }
            }
        };

        outcome.map_err(|source| DispatchError::HandlerFailed {
            index,
            name: handler.name().to_string(),
            source,
        })
    }

    /// Gives `error` to every error handler in registration order.
    ///
    /// The update handlers are not involved.
    pub async fn dispatch_error(&self, error: TelegramError) -> ErrorPassReport {
        let span = span!(Level::DEBUG, "dispatch_error", error = %error);
        async {
            let mut report = ErrorPassReport::default();

            for (index, handler) in self.inner.error_handlers.snapshot().iter().enumerate() {
                report.invoked += 1;
                let bot = Arc::clone(&self.inner.bot);
                let err = error.clone();

                let reason = match guarded(|| handler.handle_error(bot, err)) {
                    Ok(call) => match AssertUnwindSafe(call).catch_unwind().await {
                        Ok(Ok(())) => None,
                        Ok(Err(source)) => Some(source.to_string()),
                        Err(payload) => Some(format!("panicked: {}", panic_message(payload.as_ref()))),
                    },
                    Err(message) => Some(format!("panicked: {message}")),
                };

                if let Some(reason) = reason {
                    self.record(&mut report.errors, DispatchError::ErrorHandlerFailed { index, reason });
                }
            }

            if report.invoked == 0 && self.inner.log_level.should_log_errors() {
                warn!(%error, "Platform error received with no error handler registered");
            }
            report
        }
        .instrument(span)
        .await
    }

    fn record(&self, errors: &mut Vec<DispatchError>, err: DispatchError) {
        if self.inner.log_level.should_log_errors() {
            match &err {
                DispatchError::HandlerTimeout { .. } => warn!(error = %err, "Handler timed out"),
                _ => error!(error = %err, "Handler failed"),
            }
        }
        errors.push(err);
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("bot", &self.inner.bot.id())
            .field("policy", &self.inner.policy)
            .field("log_level", &self.inner.log_level)
            .field("handler_count", &self.handler_count())
            .field("error_handler_count", &self.error_handler_count())
            .finish()
    }
}

/// Keeps `is_checking_updates` true while a loop is alive, including when
/// its future is dropped mid-wait.
struct RunningFlag<'a>(&'a AtomicBool);

impl<'a> RunningFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for RunningFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

fn guarded<T>(f: impl FnOnce() -> T) -> Result<T, String> {
    std::panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| panic_message(payload.as_ref()))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`Dispatcher`].
#[derive(Default)]
pub struct DispatcherBuilder {
    bot: Option<BoxedBot>,
    receiver: Option<UpdateReceiver>,
    policy: ExecutionPolicy,
    log_level: LogLevel,
}

impl DispatcherBuilder {
    pub fn bot(mut self, bot: BoxedBot) -> Self {
        self.bot = Some(bot);
        self
    }

    pub fn receiver(mut self, receiver: UpdateReceiver) -> Self {
        self.receiver = Some(receiver);
        self
    }

    pub fn policy(mut self, policy: ExecutionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn log_level(mut self, log_level: LogLevel) -> Self {
        self.log_level = log_level;
        self
    }

    pub fn build(self) -> FrameworkResult<Dispatcher> {
        let bot = self.bot.ok_or(FrameworkError::MissingBot)?;
        let receiver = self.receiver.ok_or(FrameworkError::MissingQueue)?;
        Ok(Dispatcher::from_parts(bot, receiver, self.policy, self.log_level))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{error_handler, handler};
    use crate::queue::{UpdateSender, event_queue};
    use crate::routing::command;
    use crate::testing::MockBot;
    use crate::HandlerError;
    use ferrogram_core::BotExt;
    use std::sync::atomic::AtomicUsize;

    type Log = Arc<Mutex<Vec<&'static str>>>;

    fn setup(policy: ExecutionPolicy) -> (Dispatcher, UpdateSender) {
        let (tx, rx) = event_queue();
        let dispatcher = Dispatcher::builder()
            .bot(MockBot::boxed())
            .receiver(rx)
            .policy(policy)
            .build()
            .unwrap();
        (dispatcher, tx)
    }

    fn recorder(log: &Log, label: &'static str, consume: bool) -> BoxedHandler {
        let log = Arc::clone(log);
        handler(
            |_| true,
            move |_bot, ctx: Arc<UpdateContext>| {
                let log = Arc::clone(&log);
                async move {
                    log.lock().push(label);
                    if consume {
                        ctx.consume();
                    }
                }
            },
        )
    }

    fn explode(message: &str) {
        panic!("{message}");
    }

    fn counter(seen: &Arc<AtomicUsize>) -> BoxedHandler {
        let seen = Arc::clone(seen);
        handler(
            |_| true,
            move |_bot, ctx: Arc<UpdateContext>| {
                let seen = Arc::clone(&seen);
                async move {
                    seen.fetch_add(1, Ordering::SeqCst);
                    if ctx.update().update_id == 1 {
                        panic!("update one is cursed");
                    }
                }
            },
        )
    }

    #[tokio::test]
    async fn test_consumed_update_stops_pass() {
        for policy in [ExecutionPolicy::Synchronous, ExecutionPolicy::concurrent()] {
            let (dispatcher, _tx) = setup(policy);
            let log = Log::default();
            dispatcher.add_handler(recorder(&log, "a", true));
            dispatcher.add_handler(recorder(&log, "b", false));

            let report = dispatcher.dispatch_update(Update::text_message(1, 1, "hi")).await;

            assert_eq!(*log.lock(), ["a"], "policy {policy:?}");
            assert_eq!(report.invoked, 1);
            assert_eq!(report.consumed_by, Some(0));
        }
    }

    #[tokio::test]
    async fn test_unconsumed_update_reaches_every_match() {
        let (dispatcher, _tx) = setup(ExecutionPolicy::concurrent());
        let log = Log::default();
        dispatcher.add_handler(recorder(&log, "a", false));
        dispatcher.add_handler(handler(|_| false, |_bot, _ctx| async {}));
        dispatcher.add_handler(recorder(&log, "c", false));

        let report = dispatcher.dispatch_update(Update::default()).await;

        assert_eq!(*log.lock(), ["a", "c"]);
        assert_eq!(report.invoked, 2);
        assert_eq!(report.skipped, 1);
        assert!(!report.is_consumed());
    }

    #[tokio::test]
    async fn test_start_and_help_commands() {
        let (tx, rx) = event_queue();
        let bot = Arc::new(MockBot::default());
        let dispatcher = Dispatcher::builder()
            .bot(bot.clone())
            .receiver(rx)
            .policy(ExecutionPolicy::Synchronous)
            .build()
            .unwrap();
        let log = Log::default();

        let start_log = Arc::clone(&log);
        dispatcher.add_handler(command("start", move |bot: BoxedBot, ctx: Arc<UpdateContext>| {
            let log = Arc::clone(&start_log);
            async move {
                log.lock().push("start");
                ctx.consume();
                let chat = ctx.update().chat_id().unwrap_or_default();
                let sent = bot.send_message(chat.into(), "Welcome!".into()).await?;
                assert_eq!(sent.chat.id, 42);
                Ok::<_, HandlerError>(())
            }
        }));
        // matches everything and never consumes
        dispatcher.add_handler(recorder(&log, "any", false));

        tx.send_update(Update::text_message(1, 42, "/start")).unwrap();
        tx.send_update(Update::text_message(2, 42, "/help")).unwrap();
        drop(tx);
        dispatcher.start_checking_updates().await;

        assert_eq!(*log.lock(), ["start", "any"]);
        assert_eq!(*bot.calls.lock(), ["sendMessage"]);
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_pass() {
        for policy in [ExecutionPolicy::Synchronous, ExecutionPolicy::concurrent()] {
            let (dispatcher, _tx) = setup(policy);
            let log = Log::default();
            dispatcher.add_handler(handler(
                |_| true,
                |_bot, _ctx| async { Err::<(), HandlerError>("nope".into()) },
            ));
            dispatcher.add_handler(handler(|_| true, |_bot, _ctx| async {
                explode("kaboom");
            }));
            dispatcher.add_handler(handler(|_| panic!("bad predicate"), |_bot, _ctx| async {}));
            dispatcher.add_handler(recorder(&log, "last", false));

            let report = dispatcher.dispatch_update(Update::default()).await;

            assert_eq!(*log.lock(), ["last"], "policy {policy:?}");
            assert_eq!(report.errors.len(), 3);
            assert!(matches!(report.errors[0], DispatchError::HandlerFailed { index: 0, .. }));
            assert!(matches!(
                &report.errors[1],
                DispatchError::HandlerPanicked { index: 1, message, .. } if message == "kaboom"
            ));
            assert!(matches!(report.errors[2], DispatchError::HandlerPanicked { index: 2, .. }));
        }
    }

    #[tokio::test]
    async fn test_loop_survives_panicking_handler() {
        let (dispatcher, tx) = setup(ExecutionPolicy::Synchronous);
        let seen = Arc::new(AtomicUsize::new(0));
        dispatcher.add_handler(counter(&seen));

        tx.send_update(Update::text_message(1, 1, "first")).unwrap();
        tx.send_update(Update::text_message(2, 1, "second")).unwrap();
        drop(tx);
        dispatcher.start_checking_updates().await;

        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_handler_timeout() {
        let (dispatcher, _tx) = setup(ExecutionPolicy::concurrent());
        let log = Log::default();
        dispatcher.add_handler(
            handler(|_| true, |_bot, _ctx| async {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }),
        );
        dispatcher.add_handler(recorder(&log, "next", false));

        let started = tokio::time::Instant::now();
        let report = dispatcher.dispatch_update(Update::default()).await;

        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(30) && elapsed < Duration::from_secs(31));
        assert_eq!(report.timeouts(), 1);
        assert!(matches!(
            report.errors[0],
            DispatchError::HandlerTimeout { index: 0, timeout, .. } if timeout == Duration::from_secs(30)
        ));
        assert_eq!(*log.lock(), ["next"]);
        // the timed-out callback is still running
        assert_eq!(dispatcher.in_flight(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_synchronous_policy_has_no_timeout() {
        let (dispatcher, _tx) = setup(ExecutionPolicy::Synchronous);
        dispatcher.add_handler(handler(|_| true, |_bot, _ctx| async {
            tokio::time::sleep(Duration::from_secs(45)).await;
        }));

        let report = dispatcher.dispatch_update(Update::default()).await;
        assert!(report.errors.is_empty());
    }

    #[tokio::test]
    async fn test_remove_handler() {
        let (dispatcher, _tx) = setup(ExecutionPolicy::Synchronous);
        let log = Log::default();
        let a = recorder(&log, "a", false);
        let b = recorder(&log, "b", false);
        dispatcher.add_handler(a.clone());
        dispatcher.add_handler(b);

        assert!(dispatcher.remove_handler(&a));
        dispatcher.dispatch_update(Update::default()).await;
        assert_eq!(*log.lock(), ["b"]);

        // removing an unknown handle changes nothing
        assert!(!dispatcher.remove_handler(&a));
        assert!(!dispatcher.remove_handler(&recorder(&log, "x", false)));
        assert_eq!(dispatcher.handler_count(), 1);
    }

    #[tokio::test]
    async fn test_errors_go_to_error_handlers_only() {
        let (dispatcher, tx) = setup(ExecutionPolicy::Synchronous);
        let log = Log::default();
        dispatcher.add_handler(recorder(&log, "update", false));

        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        dispatcher.add_error_handler(error_handler(move |_bot, error| {
            let sink = Arc::clone(&sink);
            async move {
                sink.lock().push(error);
            }
        }));

        tx.send_error(TelegramError::network("connection reset")).unwrap();
        drop(tx);
        dispatcher.start_checking_updates().await;

        assert_eq!(*received.lock(), [TelegramError::network("connection reset")]);
        assert!(log.lock().is_empty());
    }

    #[tokio::test]
    async fn test_failing_error_handler_does_not_stop_others() {
        let (dispatcher, _tx) = setup(ExecutionPolicy::Synchronous);
        let calls = Arc::new(AtomicUsize::new(0));
        dispatcher.add_error_handler(error_handler(|_bot, _error| async {
            Err::<(), HandlerError>("cannot cope".into())
        }));
        dispatcher.add_error_handler(error_handler(|_bot, _error| async {
            explode("worse");
        }));
        let c = Arc::clone(&calls);
        dispatcher.add_error_handler(error_handler(move |_bot, _error| {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
            }
        }));

        let report = dispatcher
            .dispatch_error(TelegramError::Api {
                code: 409,
                description: "Conflict".into(),
            })
            .await;

        assert_eq!(report.invoked, 3);
        assert_eq!(report.errors.len(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stop_is_observed_at_item_boundary() {
        let (dispatcher, tx) = setup(ExecutionPolicy::Synchronous);
        let seen = Arc::new(AtomicUsize::new(0));
        let stopper = dispatcher.clone();
        let s = Arc::clone(&seen);
        dispatcher.add_handler(handler(|_| true, move |_bot, _ctx| {
            stopper.stop_checking_updates();
            s.fetch_add(1, Ordering::SeqCst);
            async {}
        }));

        tx.send_update(Update::text_message(1, 1, "one")).unwrap();
        tx.send_update(Update::text_message(2, 1, "two")).unwrap();
        dispatcher.start_checking_updates().await;

        assert!(dispatcher.is_stopped());
        assert_eq!(seen.load(Ordering::SeqCst), 1);

        // restarting clears the flag and resumes with the queued item
        drop(tx);
        dispatcher.start_checking_updates().await;
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_interrupt_wakes_idle_loop() {
        let (dispatcher, _tx) = setup(ExecutionPolicy::Synchronous);
        let runner = dispatcher.clone();
        let handle = tokio::spawn(async move { runner.start_checking_updates().await });

        while !dispatcher.is_checking_updates() {
            tokio::task::yield_now().await;
        }
        dispatcher.interrupt();

        handle.await.unwrap();
        assert!(!dispatcher.is_checking_updates());
    }

    #[tokio::test]
    async fn test_interrupt_wakes_loop_waiting_for_slot() {
        let (dispatcher, tx) = setup(ExecutionPolicy::concurrent().max_concurrent_updates(1));
        dispatcher.add_handler(handler(|_| true, |_bot, _ctx| async {
            tokio::time::sleep(Duration::from_secs(25)).await;
        }));

        tx.send_update(Update::text_message(1, 1, "slow")).unwrap();
        tx.send_update(Update::text_message(2, 1, "queued")).unwrap();
        let runner = dispatcher.clone();
        let handle = tokio::spawn(async move { runner.start_checking_updates().await });

        while dispatcher.in_flight() == 0 {
            tokio::task::yield_now().await;
        }
        dispatcher.interrupt();

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("loop did not return after interrupt")
            .unwrap();
        assert!(!dispatcher.is_checking_updates());
        // the first pass keeps running; the second update was never taken
        assert!(dispatcher.in_flight() > 0);
        assert_eq!(dispatcher.inner.queue.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_loop_handles_every_update() {
        let (dispatcher, tx) = setup(ExecutionPolicy::concurrent().max_concurrent_updates(2));
        let seen = Arc::new(AtomicUsize::new(0));
        dispatcher.add_handler(counter(&seen));

        for id in 1..=5 {
            tx.send_update(Update::text_message(id, 1, "x")).unwrap();
        }
        drop(tx);
        dispatcher.start_checking_updates().await;
        dispatcher.wait_idle().await;

        assert_eq!(seen.load(Ordering::SeqCst), 5);
        assert_eq!(dispatcher.in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_waits_for_in_flight_work() {
        for (work, expected) in [(1, true), (10, false)] {
            let (dispatcher, tx) = setup(ExecutionPolicy::concurrent());
            dispatcher.add_handler(handler(|_| true, move |_bot, _ctx| async move {
                tokio::time::sleep(Duration::from_secs(work)).await;
            }));

            tx.send_update(Update::default()).unwrap();
            drop(tx);
            dispatcher.start_checking_updates().await;

            assert_eq!(dispatcher.shutdown(Duration::from_secs(5)).await, expected);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_idle_keeps_shutdown_closed() {
        let (dispatcher, tx) = setup(ExecutionPolicy::concurrent());
        dispatcher.add_handler(handler(|_| true, |_bot, _ctx| async {
            tokio::time::sleep(Duration::from_secs(1)).await;
        }));

        tx.send_update(Update::default()).unwrap();
        drop(tx);
        dispatcher.start_checking_updates().await;

        let idle = dispatcher.clone();
        let (drained, ()) = tokio::join!(dispatcher.shutdown(Duration::from_secs(5)), async move {
            idle.wait_idle().await
        });

        assert!(drained);
        assert!(dispatcher.inner.tracker.is_closed());
        assert_eq!(dispatcher.in_flight(), 0);
    }

    #[test]
    fn test_builder_requires_bot_and_queue() {
        let (_tx, rx) = event_queue();
        assert!(matches!(
            Dispatcher::builder().receiver(rx).build(),
            Err(FrameworkError::MissingBot)
        ));
        assert!(matches!(
            Dispatcher::builder().bot(MockBot::boxed()).build(),
            Err(FrameworkError::MissingQueue)
        ));
    }
}
