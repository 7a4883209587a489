//! The event queue between the update source and the dispatcher.
//!
//! The queue is unbounded and FIFO. Producers (a long-polling loop, a webhook
//! server, a test) hold cloneable [`UpdateSender`]s; the dispatcher owns the
//! single [`UpdateReceiver`]. When every sender is dropped the queue closes
//! and the dispatch loop ends after draining what is left.

use ferrogram_core::{TelegramError, Update};
use tokio::sync::mpsc;

use crate::error::{FrameworkError, FrameworkResult};

/// An item travelling through the event queue.
#[derive(Debug, Clone)]
pub enum DispatchableObject {
    /// An update for the handlers.
    Update(Update),
    /// A platform error for the error handlers.
    Error(TelegramError),
}

impl From<Update> for DispatchableObject {
    fn from(update: Update) -> Self {
        Self::Update(update)
    }
}

impl From<TelegramError> for DispatchableObject {
    fn from(error: TelegramError) -> Self {
        Self::Error(error)
    }
}

/// Producer side of the event queue.
#[derive(Debug, Clone)]
pub struct UpdateSender {
    tx: mpsc::UnboundedSender<DispatchableObject>,
}

impl UpdateSender {
    /// Enqueues any dispatchable item.
    pub fn send(&self, item: impl Into<DispatchableObject>) -> FrameworkResult<()> {
        self.tx
            .send(item.into())
            .map_err(|_| FrameworkError::QueueClosed)
    }

    /// Enqueues an update.
    pub fn send_update(&self, update: Update) -> FrameworkResult<()> {
        self.send(update)
    }

    /// Enqueues a platform error.
    pub fn send_error(&self, error: TelegramError) -> FrameworkResult<()> {
        self.send(error)
    }

    /// Returns `true` once the receiving dispatcher is gone.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer side of the event queue.
#[derive(Debug)]
pub struct UpdateReceiver {
    rx: mpsc::UnboundedReceiver<DispatchableObject>,
}

impl UpdateReceiver {
    /// Waits for the next item. Returns `None` once the queue is closed and
    /// drained.
    pub async fn recv(&mut self) -> Option<DispatchableObject> {
        self.rx.recv().await
    }

    /// Returns the number of items waiting.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

/// Creates a new unbounded event queue.
pub fn event_queue() -> (UpdateSender, UpdateReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (UpdateSender { tx }, UpdateReceiver { rx })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fifo_order_across_kinds() {
        let (tx, mut rx) = event_queue();
        tx.send_update(Update::text_message(1, 1, "a")).unwrap();
        tx.send_error(TelegramError::network("reset")).unwrap();
        tx.send_update(Update::text_message(2, 1, "b")).unwrap();
        assert_eq!(rx.len(), 3);

        assert!(matches!(rx.recv().await, Some(DispatchableObject::Update(u)) if u.update_id == 1));
        assert!(matches!(rx.recv().await, Some(DispatchableObject::Error(_))));
        assert!(matches!(rx.recv().await, Some(DispatchableObject::Update(u)) if u.update_id == 2));
    }

    #[tokio::test]
    async fn test_closed_when_senders_dropped() {
        let (tx, mut rx) = event_queue();
        let second = tx.clone();
        tx.send_update(Update::default()).unwrap();
        drop(tx);
        drop(second);

        assert!(rx.recv().await.is_some());
        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn test_send_after_receiver_dropped() {
        let (tx, rx) = event_queue();
        drop(rx);
        assert!(tx.is_closed());
        assert!(matches!(
            tx.send_update(Update::default()),
            Err(FrameworkError::QueueClosed)
        ));
    }
}
