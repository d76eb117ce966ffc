//! Broadcast of session changes.
//!
//! The auth service publishes an event whenever a session starts or ends or
//! a user's credentials change. Anything interested, such as the audit log
//! task started by the server, holds a [SessionSubscription]. Dropping the
//! subscription unsubscribes.

use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

use crate::auth::UserID;

/// Something that happened to a user's session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The stored session was read at start-up, `None` if there was none.
    Restored(Option<UserID>),
    SignedIn(UserID),
    SignedOut(UserID),
    PasswordChanged(UserID),
    EmailChanged(UserID),
}

/// The sending half, cheap to clone and share between services.
#[derive(Debug, Clone)]
pub struct SessionEvents {
    sender: broadcast::Sender<SessionEvent>,
}

impl SessionEvents {
    /// How many events a slow subscriber may fall behind before it skips ahead.
    pub const CAPACITY: usize = 64;

    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(Self::CAPACITY);
        Self { sender }
    }

    /// Send `event` to every current subscriber.
    pub fn publish(&self, event: SessionEvent) {
        if self.sender.send(event).is_err() {
            tracing::debug!("No subscribers for session event {event:?}");
        }
    }

    /// Start receiving events published from now on.
    pub fn subscribe(&self) -> SessionSubscription {
        SessionSubscription {
            receiver: self.sender.subscribe(),
        }
    }

    /// The number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new()
    }
}

/// A handle for receiving session events.
#[derive(Debug)]
pub struct SessionSubscription {
    receiver: broadcast::Receiver<SessionEvent>,
}

impl SessionSubscription {
    /// Wait for the next event. Returns `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<SessionEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Session subscriber fell behind, skipped {skipped} events");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Take the next event if one is waiting.
    pub fn try_recv(&mut self) -> Option<SessionEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!("Session subscriber fell behind, skipped {skipped} events");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }
}

/// Write every session event to the log until the channel closes.
pub async fn log_session_events(mut subscription: SessionSubscription) {
    while let Some(event) = subscription.recv().await {
        match event {
            SessionEvent::Restored(_) => {}
            SessionEvent::SignedIn(user_id) => tracing::info!(%user_id, "User signed in"),
            SessionEvent::SignedOut(user_id) => tracing::info!(%user_id, "User signed out"),
            SessionEvent::PasswordChanged(user_id) => {
                tracing::info!(%user_id, "User changed their password")
            }
            SessionEvent::EmailChanged(user_id) => {
                tracing::info!(%user_id, "User confirmed a new email address")
            }
        }
    }

    tracing::debug!("Session event channel closed");
}
