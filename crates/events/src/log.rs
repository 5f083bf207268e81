//! Append-only notification history with broadcast fan-out.
//!
//! The log is the observable surface of a shop: every committed operation the
//! outside world is entitled to see lands here, in commit order. Internal
//! events (catalog writes, registrations, destroy warnings) never reach it.
//!
//! - No IO / no async
//! - History is the source of truth; fan-out is best-effort
//! - Subscribers must tolerate duplicates if they replay from history

use std::sync::{Mutex, RwLock, mpsc};
use std::time::Duration;

use thiserror::Error;

use crate::event::Event;

#[derive(Debug, Error)]
pub enum LogError {
    /// Append failed due to internal lock poisoning.
    #[error("notification log lock poisoned")]
    Poisoned,
}

/// A subscription to the notification stream.
///
/// Each subscription gets a copy of every notification appended after it was
/// taken (broadcast semantics). Designed for single-threaded consumption.
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: mpsc::Receiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(receiver: mpsc::Receiver<M>) -> Self {
        Self { receiver }
    }

    /// Block until the next message is available.
    pub fn recv(&self) -> Result<M, mpsc::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a message without blocking.
    pub fn try_recv(&self) -> Result<M, mpsc::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Block for up to `timeout` waiting for a message.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<M, mpsc::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }
}

/// Append-only log of published notifications.
#[derive(Debug)]
pub struct NotificationLog<E> {
    history: RwLock<Vec<E>>,
    subscribers: Mutex<Vec<mpsc::Sender<E>>>,
}

impl<E> NotificationLog<E> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<E> Default for NotificationLog<E> {
    fn default() -> Self {
        Self {
            history: RwLock::new(Vec::new()),
            subscribers: Mutex::new(Vec::new()),
        }
    }
}

impl<E: Event> NotificationLog<E> {
    /// Append a notification to the history and fan it out to subscribers.
    pub fn append(&self, event: E) -> Result<(), LogError> {
        tracing::debug!(event_type = event.event_type(), "notification appended");

        let mut history = self.history.write().map_err(|_| LogError::Poisoned)?;
        let mut subs = self.subscribers.lock().map_err(|_| LogError::Poisoned)?;

        // Drop any dead subscribers while publishing.
        subs.retain(|tx| tx.send(event.clone()).is_ok());
        history.push(event);

        Ok(())
    }

    /// Snapshot of the full history, oldest first.
    pub fn all(&self) -> Vec<E> {
        match self.history.read() {
            Ok(history) => history.clone(),
            Err(_) => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.history.read().map(|h| h.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn subscribe(&self) -> Subscription<E> {
        let (tx, rx) = mpsc::channel();

        // If the lock is poisoned, we still return a subscription;
        // it just won't receive messages until the process restarts.
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.push(tx);
        }

        Subscription::new(rx)
    }
}
