//! Fan-out of committed events to downstream consumers.
//!
//! The bus carries warehouse events to whoever reacts to them (dashboard cards,
//! alerting, replication into other systems). It is not a source of truth: the
//! store's journal is, so a missed delivery can always be recovered by reading
//! the journal from a known sequence number.
//!
//! - **Transport-agnostic**: in-memory channels today, anything with broadcast semantics later
//! - **At-least-once**: consumers must tolerate duplicates (dedupe on `sequence_number`)
//! - **No persistence**: the bus only fans out

use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

/// Receiving end of a bus subscription.
///
/// Every subscription gets its own copy of each message published after it was
/// created, in publish order.
///
/// ```ignore
/// let subscription = store.subscribe();
/// while let Some(envelope) = subscription.recv() {
///     refresh_stock_cards(&envelope);
/// }
/// ```
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: Receiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(receiver: Receiver<M>) -> Self {
        Self { receiver }
    }

    /// Block for the next message. `None` once the bus is gone.
    pub fn recv(&self) -> Option<M> {
        self.receiver.recv().ok()
    }

    /// Next buffered message, if any.
    pub fn try_recv(&self) -> Option<M> {
        self.receiver.try_recv().ok()
    }

    /// Block for up to `timeout`.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<M, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Everything currently buffered, without blocking.
    pub fn drain(&self) -> Vec<M> {
        self.receiver.try_iter().collect()
    }
}

/// Publish/subscribe seam between the store and its consumers.
///
/// The store publishes after a command is applied; a failed `publish()` is a
/// delivery problem and never rolls the ledger back.
pub trait EventBus<M>: Send + Sync {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    fn publish(&self, message: M) -> Result<(), Self::Error>;

    fn subscribe(&self) -> Subscription<M>;
}

impl<M, B> EventBus<M> for Arc<B>
where
    B: EventBus<M> + ?Sized,
{
    type Error = B::Error;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        (**self).publish(message)
    }

    fn subscribe(&self) -> Subscription<M> {
        (**self).subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn recv_ends_when_sender_is_dropped() {
        let (tx, rx) = mpsc::channel();
        let subscription = Subscription::new(rx);
        tx.send(7u64).unwrap();
        drop(tx);

        assert_eq!(subscription.recv(), Some(7));
        assert_eq!(subscription.recv(), None);
        assert_eq!(
            subscription.recv_timeout(Duration::from_millis(1)),
            Err(RecvTimeoutError::Disconnected)
        );
    }
}
