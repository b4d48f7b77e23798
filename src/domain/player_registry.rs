//! The authoritative set of live players.
//!
//! [`PlayerRegistry`] keeps every connected player together with the
//! sending half of its queues behind one [`tokio::sync::Mutex`]. Insert,
//! remove and the conductor's enumeration snapshot all take that lock,
//! so a player can never be removed halfway through building a
//! recipient list.

use std::sync::Arc;

use tokio::sync::Mutex;

use super::outbox::{Hangup, Outbox};
use super::{Player, PlayerId};

/// A registered player and the registry-owned ends of its queues.
#[derive(Debug)]
pub struct Member {
    /// Shared player state.
    pub player: Arc<Player>,
    /// Sending half of the player's delivery queues.
    pub outbox: Outbox,
    /// Dropped on removal to stop the player's read loop.
    pub hangup: Hangup,
}

/// A delivery target captured by [`PlayerRegistry::recipients`].
#[derive(Debug, Clone)]
pub(crate) struct Recipient {
    pub(crate) player: Arc<Player>,
    pub(crate) outbox: Outbox,
}

/// Lock-guarded set of live players, in registration order.
///
/// # Concurrency
///
/// - `register`, `deregister` and `recipients` are mutually exclusive.
/// - `deregister` is an atomic remove-if-present: when both of a player's
///   loops fail at once, exactly one of them gets `true`.
#[derive(Debug, Default)]
pub struct PlayerRegistry {
    members: Mutex<Vec<Member>>,
}

impl PlayerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a player. Callers register each player exactly once.
    pub async fn register(&self, member: Member) {
        self.members.lock().await.push(member);
    }

    /// Removes the player if it is still present.
    ///
    /// Returns `true` if this call removed it. Dropping the member closes
    /// its delivery queues and signals its hang-up, so the caller that
    /// gets `true` is the one that finalized teardown, and the only one
    /// that logs the departure.
    pub async fn deregister(&self, id: PlayerId) -> bool {
        let removed = {
            let mut members = self.members.lock().await;
            members
                .iter()
                .position(|m| m.player.id() == id)
                .map(|idx| members.remove(idx))
        };
        if removed.is_some() {
            tracing::info!(player_id = %id, "player disconnected");
        }
        removed.is_some()
    }

    /// Returns `true` if the player is registered.
    #[cfg(test)]
    pub(crate) async fn contains(&self, id: PlayerId) -> bool {
        self.members
            .lock()
            .await
            .iter()
            .any(|m| m.player.id() == id)
    }

    /// Snapshot of current members, in registration order.
    pub(crate) async fn recipients(&self) -> Vec<Recipient> {
        self.members
            .lock()
            .await
            .iter()
            .map(|m| Recipient {
                player: Arc::clone(&m.player),
                outbox: m.outbox.clone(),
            })
            .collect()
    }

    /// Returns the number of live players.
    pub async fn len(&self) -> usize {
        self.members.lock().await.len()
    }

    /// Returns `true` if no player is connected.
    pub async fn is_empty(&self) -> bool {
        self.members.lock().await.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::outbox::{Inbox, mailbox};
    use crate::domain::Position;

    /// Registers a fresh player at `(x, y)` and returns its id and inbox.
    pub(crate) async fn join_at(
        registry: &PlayerRegistry,
        x: f64,
        y: f64,
        capacity: usize,
    ) -> (PlayerId, Inbox) {
        let id = PlayerId::new();
        let (outbox, hangup, inbox) = mailbox(capacity);
        registry
            .register(Member {
                player: Arc::new(Player::new(id, 20, Position::new(x, y))),
                outbox,
                hangup,
            })
            .await;
        (id, inbox)
    }

    #[tokio::test]
    async fn register_and_deregister() {
        let registry = PlayerRegistry::new();
        assert!(registry.is_empty().await);

        let (id, _inbox) = join_at(&registry, 0.0, 0.0, 4).await;
        assert!(registry.contains(id).await);
        assert_eq!(registry.len().await, 1);

        assert!(registry.deregister(id).await);
        assert!(!registry.contains(id).await);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn second_deregister_is_a_no_op() {
        let registry = PlayerRegistry::new();
        let (id, _inbox) = join_at(&registry, 0.0, 0.0, 4).await;

        assert!(registry.deregister(id).await);
        assert!(!registry.deregister(id).await);
    }

    #[tokio::test]
    async fn concurrent_deregister_removes_once() {
        let registry = Arc::new(PlayerRegistry::new());
        let (id, _inbox) = join_at(&registry, 0.0, 0.0, 4).await;

        let a = tokio::spawn({
            let registry = Arc::clone(&registry);
            async move { registry.deregister(id).await }
        });
        let b = tokio::spawn({
            let registry = Arc::clone(&registry);
            async move { registry.deregister(id).await }
        });
        let (a, b) = tokio::join!(a, b);
        let removed = [a.unwrap_or(false), b.unwrap_or(false)];
        assert_eq!(removed.iter().filter(|r| **r).count(), 1);
    }

    #[tokio::test]
    async fn deregister_closes_queues_and_hangs_up() {
        let registry = PlayerRegistry::new();
        let (id, mut inbox) = join_at(&registry, 0.0, 0.0, 4).await;

        registry.deregister(id).await;
        assert!(inbox.raw.recv().await.is_none());
        assert!(inbox.events.recv().await.is_none());
        assert!((&mut inbox.hangup).await.is_err());
    }

    #[tokio::test]
    async fn recipients_follow_registration_order() {
        let registry = PlayerRegistry::new();
        let (a, _ia) = join_at(&registry, 0.0, 0.0, 4).await;
        let (b, _ib) = join_at(&registry, 0.0, 0.0, 4).await;
        let (c, _ic) = join_at(&registry, 0.0, 0.0, 4).await;
        registry.deregister(b).await;

        let ids: Vec<PlayerId> = registry
            .recipients()
            .await
            .iter()
            .map(|r| r.player.id())
            .collect();
        assert_eq!(ids, vec![a, c]);
    }
}
