use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError, TrySendError};
use tracing::debug;

use crate::dashboard::DisplayFrame;
use crate::error::HandoffError;

/// What happened to a published value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The slot was empty.
    Fresh,
    /// An unread value was evicted to make room.
    ReplacedStale,
}

#[derive(Debug, Default)]
struct Shared {
    dropped: AtomicU64,
    receiver_gone: AtomicBool,
}

/// Producer half of a single-slot, latest-wins mailbox.
///
/// Publishing never blocks: if the consumer has not picked up the previous
/// value yet, that value is thrown away.
#[derive(Debug)]
pub struct MailboxSender<T = DisplayFrame> {
    tx: Sender<T>,
    // Used only to evict the stale value from the producer side.
    evict: Receiver<T>,
    shared: Arc<Shared>,
}

/// Consumer half of the mailbox.
#[derive(Debug)]
pub struct MailboxReceiver<T = DisplayFrame> {
    rx: Receiver<T>,
    shared: Arc<Shared>,
}

/// Create a connected mailbox pair.
pub fn display_mailbox<T>() -> (MailboxSender<T>, MailboxReceiver<T>) {
    let (tx, rx) = bounded(1);
    let shared = Arc::new(Shared::default());
    (
        MailboxSender {
            tx,
            evict: rx.clone(),
            shared: Arc::clone(&shared),
        },
        MailboxReceiver { rx, shared },
    )
}

impl<T> MailboxSender<T> {
    /// Put `value` in the slot, evicting any value still waiting there.
    pub fn publish(&self, value: T) -> Result<Delivery, HandoffError> {
        if self.shared.receiver_gone.load(Ordering::Acquire) {
            return Err(HandoffError::Closed);
        }

        let mut value = value;
        let mut delivery = Delivery::Fresh;
        loop {
            match self.tx.try_send(value) {
                Ok(()) => return Ok(delivery),
                Err(TrySendError::Full(back)) => {
                    value = back;
                    if self.evict.try_recv().is_ok() {
                        let dropped = self.shared.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                        debug!(dropped, "renderer running late, discarding stale display frame");
                        delivery = Delivery::ReplacedStale;
                    }
                }
                // `evict` keeps the channel connected, so this cannot happen.
                Err(TrySendError::Disconnected(_)) => return Err(HandoffError::Closed),
            }
        }
    }

    /// Values evicted before the consumer saw them.
    pub fn dropped(&self) -> u64 {
        self.shared.dropped.load(Ordering::Relaxed)
    }
}

impl<T> MailboxReceiver<T> {
    /// Block until a value is published.
    pub fn recv(&self) -> Result<T, HandoffError> {
        self.rx.recv().map_err(|_| HandoffError::Disconnected)
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<T, HandoffError> {
        self.rx.recv_timeout(timeout).map_err(|err| match err {
            RecvTimeoutError::Timeout => HandoffError::Timeout,
            RecvTimeoutError::Disconnected => HandoffError::Disconnected,
        })
    }

    /// Take the waiting value, if any.
    pub fn try_recv(&self) -> Result<Option<T>, HandoffError> {
        match self.rx.try_recv() {
            Ok(value) => Ok(Some(value)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(HandoffError::Disconnected),
        }
    }

    /// Values evicted before this receiver saw them.
    pub fn dropped(&self) -> u64 {
        self.shared.dropped.load(Ordering::Relaxed)
    }
}

impl<T> Drop for MailboxReceiver<T> {
    fn drop(&mut self) {
        self.shared.receiver_gone.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn latest_value_wins() {
        let (tx, rx) = display_mailbox::<u32>();
        assert_eq!(tx.publish(1).unwrap(), Delivery::Fresh);
        assert_eq!(tx.publish(2).unwrap(), Delivery::ReplacedStale);
        assert_eq!(tx.publish(3).unwrap(), Delivery::ReplacedStale);

        assert_eq!(rx.recv().unwrap(), 3);
        assert_eq!(rx.try_recv().unwrap(), None);
        assert_eq!(tx.dropped(), 2);
        assert_eq!(rx.dropped(), 2);
    }

    #[test]
    fn consumed_slot_accepts_fresh_value() {
        let (tx, rx) = display_mailbox::<&str>();
        tx.publish("a").unwrap();
        assert_eq!(rx.try_recv().unwrap(), Some("a"));
        assert_eq!(tx.publish("b").unwrap(), Delivery::Fresh);
        assert_eq!(tx.dropped(), 0);
    }

    #[test]
    fn recv_timeout_on_empty_slot() {
        let (_tx, rx) = display_mailbox::<u8>();
        assert_eq!(
            rx.recv_timeout(Duration::from_millis(5)),
            Err(HandoffError::Timeout)
        );
    }

    #[test]
    fn receiver_sees_disconnect_after_last_value() {
        let (tx, rx) = display_mailbox::<u8>();
        tx.publish(7).unwrap();
        drop(tx);
        assert_eq!(rx.recv().unwrap(), 7);
        assert_eq!(rx.recv(), Err(HandoffError::Disconnected));
        assert_eq!(rx.try_recv(), Err(HandoffError::Disconnected));
    }

    #[test]
    fn publish_fails_once_receiver_is_dropped() {
        let (tx, rx) = display_mailbox::<u8>();
        drop(rx);
        assert_eq!(tx.publish(1), Err(HandoffError::Closed));
    }

    #[test]
    fn slow_consumer_never_blocks_producer() {
        let (tx, rx) = display_mailbox::<u32>();
        let consumer = thread::Builder::new()
            .name("test-renderer".into())
            .spawn(move || {
                let mut seen = Vec::new();
                while let Ok(value) = rx.recv() {
                    seen.push(value);
                    thread::sleep(Duration::from_millis(1));
                }
                seen
            })
            .unwrap();

        for n in 0..500 {
            tx.publish(n).unwrap();
        }
        let dropped = tx.dropped();
        drop(tx);

        let seen = consumer.join().unwrap();
        assert_eq!(seen.last(), Some(&499));
        assert!(seen.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(seen.len() as u64 + dropped, 500);
    }
}
