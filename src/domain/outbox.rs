//! A player's two delivery queues.
//!
//! [`mailbox`] creates the sending half ([`Outbox`], kept by the registry)
//! and the receiving half ([`Inbox`], handed to the connection loops).
//! The registry owns the only long-lived senders, so removing a player
//! from the registry is what closes its queues, exactly once.

use axum::extract::ws::Utf8Bytes;
use tokio::sync::{mpsc, oneshot};

use super::ServerMessage;

/// Sending half of a player's queues.
#[derive(Debug, Clone)]
pub struct Outbox {
    raw: mpsc::UnboundedSender<Utf8Bytes>,
    events: mpsc::Sender<ServerMessage>,
}

impl Outbox {
    /// Queues a pre-encoded text frame. Never waits.
    ///
    /// Returns `false` if the player's queues are already closed.
    pub fn send_raw(&self, text: impl Into<Utf8Bytes>) -> bool {
        self.raw.send(text.into()).is_ok()
    }

    /// Returns the structured-event sender.
    #[must_use]
    pub const fn events(&self) -> &mpsc::Sender<ServerMessage> {
        &self.events
    }
}

/// Receiving half of a player's queues, consumed by the connection loops.
#[derive(Debug)]
pub struct Inbox {
    /// Pre-encoded text frames, written before any structured event.
    pub raw: mpsc::UnboundedReceiver<Utf8Bytes>,
    /// Structured events produced by the conductor.
    pub events: mpsc::Receiver<ServerMessage>,
    /// Resolves once the player has been removed from the registry.
    pub hangup: oneshot::Receiver<()>,
}

/// Registry-side handle whose drop signals [`Inbox::hangup`].
#[derive(Debug)]
pub struct Hangup {
    _signal: oneshot::Sender<()>,
}

/// Creates the queues for one player. `capacity` bounds the event queue.
#[must_use]
pub fn mailbox(capacity: usize) -> (Outbox, Hangup, Inbox) {
    let (raw_tx, raw_rx) = mpsc::unbounded_channel();
    let (events_tx, events_rx) = mpsc::channel(capacity);
    let (hangup_tx, hangup_rx) = oneshot::channel();
    (
        Outbox {
            raw: raw_tx,
            events: events_tx,
        },
        Hangup { _signal: hangup_tx },
        Inbox {
            raw: raw_rx,
            events: events_rx,
            hangup: hangup_rx,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PlayerId;

    #[tokio::test]
    async fn dropping_senders_closes_inbox() {
        let (outbox, hangup, mut inbox) = mailbox(4);
        assert!(outbox.send_raw("hello"));
        drop(outbox);
        drop(hangup);

        assert_eq!(inbox.raw.recv().await.as_deref(), Some("hello"));
        assert!(inbox.raw.recv().await.is_none());
        assert!(inbox.events.recv().await.is_none());
        assert!((&mut inbox.hangup).await.is_err());
    }

    #[tokio::test]
    async fn events_are_fifo() {
        let (outbox, _hangup, mut inbox) = mailbox(4);
        let (first, second) = (PlayerId::new(), PlayerId::new());
        for uid in [first, second] {
            tokio_test::assert_ok!(
                outbox
                    .events()
                    .send(ServerMessage::IdentityAssignment { uid })
                    .await
            );
        }
        assert_eq!(
            inbox.events.recv().await,
            Some(ServerMessage::IdentityAssignment { uid: first })
        );
        assert_eq!(
            inbox.events.recv().await,
            Some(ServerMessage::IdentityAssignment { uid: second })
        );
    }

    #[test]
    fn send_raw_after_close_reports_failure() {
        let (outbox, _hangup, inbox) = mailbox(1);
        drop(inbox);
        assert!(!outbox.send_raw("late"));
    }
}
