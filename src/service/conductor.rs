//! The conductor: the one task that fans events out to players.
//!
//! Every position broadcast and every join runs to completion inside
//! [`Conductor::run`] before the next one starts, so all players observe
//! events in a single global order.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::config::OverflowPolicy;
use crate::domain::player_registry::Recipient;
use crate::domain::{PlayerId, PlayerRegistry, PlayerSnapshot, PositionUpdate, ServerMessage};

/// Serialized broadcaster for position and join events.
///
/// Created together with its [`super::Hub`] by [`super::Hub::new`]. It
/// stops once every hub handle has been dropped and both input queues
/// have drained.
#[derive(Debug)]
pub struct Conductor {
    registry: Arc<PlayerRegistry>,
    positions: mpsc::Receiver<PositionUpdate>,
    joins: mpsc::Receiver<PlayerSnapshot>,
    policy: OverflowPolicy,
}

impl Conductor {
    pub(crate) fn new(
        registry: Arc<PlayerRegistry>,
        positions: mpsc::Receiver<PositionUpdate>,
        joins: mpsc::Receiver<PlayerSnapshot>,
        policy: OverflowPolicy,
    ) -> Self {
        Self {
            registry,
            positions,
            joins,
            policy,
        }
    }

    /// Processes events until both input queues are closed.
    pub async fn run(mut self) {
        tracing::debug!(policy = ?self.policy, "conductor started");
        loop {
            tokio::select! {
                Some(update) = self.positions.recv() => {
                    self.broadcast_position(update).await;
                }
                Some(newcomer) = self.joins.recv() => {
                    self.handle_join(newcomer).await;
                }
                else => break,
            }
        }
        tracing::debug!("conductor stopped");
    }

    /// Sends `update` to every registered player except its originator.
    ///
    /// Returns the number of players the update was delivered to. An
    /// originator that has already left is not an error: the update
    /// still reaches everyone else.
    pub async fn broadcast_position(&self, update: PositionUpdate) -> usize {
        let origin = update.id;
        let recipients = self.registry.recipients().await;
        let mut delivered = 0;
        for to in recipients.iter().filter(|r| Some(r.player.id()) != origin) {
            if self
                .deliver(to, ServerMessage::Position(update.clone()))
                .await
            {
                delivered += 1;
            }
        }
        tracing::debug!(origin = ?origin, delivered, "position broadcast");
        delivered
    }

    /// Runs both halves of the join protocol against one snapshot.
    pub async fn handle_join(&self, newcomer: PlayerSnapshot) {
        let recipients = self.registry.recipients().await;
        let announced = self.announce_newcomer(&recipients, newcomer).await;
        let bootstrapped = self.bootstrap_newcomer(&recipients, newcomer.uid).await;
        tracing::debug!(
            player_id = %newcomer.uid,
            announced,
            bootstrapped,
            "join processed"
        );
    }

    /// Tells every existing player about the newcomer.
    pub(crate) async fn announce_newcomer(
        &self,
        recipients: &[Recipient],
        newcomer: PlayerSnapshot,
    ) -> usize {
        let mut delivered = 0;
        for to in recipients.iter().filter(|r| r.player.id() != newcomer.uid) {
            if self
                .deliver(to, ServerMessage::JoinAnnouncement(newcomer))
                .await
            {
                delivered += 1;
            }
        }
        delivered
    }

    /// Sends the newcomer one bootstrap event per other player, in
    /// snapshot order. Does nothing if the newcomer already left.
    pub(crate) async fn bootstrap_newcomer(
        &self,
        recipients: &[Recipient],
        newcomer: PlayerId,
    ) -> usize {
        let Some(target) = recipients.iter().find(|r| r.player.id() == newcomer) else {
            tracing::debug!(player_id = %newcomer, "newcomer left before bootstrap");
            return 0;
        };
        let mut delivered = 0;
        for existing in recipients.iter().filter(|r| r.player.id() != newcomer) {
            if !self
                .deliver(target, ServerMessage::Bootstrap(existing.player.snapshot()))
                .await
            {
                break;
            }
            delivered += 1;
        }
        delivered
    }

    /// Hands one event to one player according to the overflow policy.
    ///
    /// Returns `false` if the player is gone or was evicted.
    async fn deliver(&self, to: &Recipient, msg: ServerMessage) -> bool {
        let player_id = to.player.id();
        let kind = msg.kind();
        match self.policy {
            OverflowPolicy::Block => {
                if to.outbox.events().send(msg).await.is_ok() {
                    return true;
                }
                tracing::debug!(%player_id, kind, "recipient already torn down");
                false
            }
            OverflowPolicy::Disconnect => match to.outbox.events().try_send(msg) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(%player_id, kind, "event queue full, disconnecting player");
                    self.registry.deregister(player_id).await;
                    false
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::debug!(%player_id, kind, "recipient already torn down");
                    false
                }
            },
        }
    }
}
