//! Hub handle: the front door used by the accept path and the player
//! connection loops.

use std::sync::Arc;

use tokio::sync::mpsc;

use super::Conductor;
use crate::config::HubConfig;
use crate::domain::outbox::mailbox;
use crate::domain::{
    Inbox, Member, Player, PlayerId, PlayerRegistry, PlayerSnapshot, Position, PositionUpdate,
    ServerMessage,
};
use crate::error::HubError;

/// A newly admitted player and the receiving ends of its queues.
#[derive(Debug)]
pub struct Admission {
    /// Shared player state, also held by the registry.
    pub player: Arc<Player>,
    /// Queues to be drained by the player's connection loops.
    pub inbox: Inbox,
}

/// Cloneable handle to the hub.
///
/// Owns the conductor's input senders; the conductor stops once every
/// clone of the hub has been dropped.
#[derive(Debug, Clone)]
pub struct Hub {
    registry: Arc<PlayerRegistry>,
    positions: mpsc::Sender<PositionUpdate>,
    joins: mpsc::Sender<PlayerSnapshot>,
    config: Arc<HubConfig>,
}

impl Hub {
    /// Creates a hub and the conductor that serves it. The caller is
    /// responsible for running [`Conductor::run`].
    #[must_use]
    pub fn new(config: HubConfig) -> (Self, Conductor) {
        let registry = Arc::new(PlayerRegistry::new());
        let (positions_tx, positions_rx) = mpsc::channel(config.conductor_queue_capacity);
        let (joins_tx, joins_rx) = mpsc::channel(config.conductor_queue_capacity);
        let conductor = Conductor::new(
            Arc::clone(&registry),
            positions_rx,
            joins_rx,
            config.overflow_policy,
        );
        let hub = Self {
            registry,
            positions: positions_tx,
            joins: joins_tx,
            config: Arc::new(config),
        };
        (hub, conductor)
    }

    /// Creates a hub and spawns its conductor on the current runtime.
    #[must_use]
    pub fn spawn(config: HubConfig) -> Self {
        let (hub, conductor) = Self::new(config);
        tokio::spawn(conductor.run());
        hub
    }

    /// Returns the registry of live players.
    #[must_use]
    pub fn registry(&self) -> &Arc<PlayerRegistry> {
        &self.registry
    }

    /// Returns the configuration the hub was built with.
    #[must_use]
    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Creates and registers a player at the spawn point, and queues its
    /// `getId` frame ahead of anything the conductor will send it.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Encode`] if the identity frame cannot be
    /// encoded; nothing is registered in that case.
    pub async fn admit(&self) -> Result<Admission, HubError> {
        let id = PlayerId::new();
        let spawn = Position::new(self.config.spawn_x, self.config.spawn_y);
        let player = Arc::new(Player::new(id, self.config.player_radius, spawn));
        let (outbox, hangup, inbox) = mailbox(self.config.delivery_queue_capacity);

        let greeting = ServerMessage::IdentityAssignment { uid: id }.encode()?;
        outbox.send_raw(greeting);

        self.registry
            .register(Member {
                player: Arc::clone(&player),
                outbox,
                hangup,
            })
            .await;
        tracing::info!(player_id = %id, "player admitted");
        Ok(Admission { player, inbox })
    }

    /// Queues a join for the conductor: announce the newcomer to everyone
    /// else and bootstrap it with the current world.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::ConductorUnavailable`] if the conductor stopped.
    pub async fn announce(&self, newcomer: PlayerSnapshot) -> Result<(), HubError> {
        self.joins
            .send(newcomer)
            .await
            .map_err(|_| HubError::ConductorUnavailable)
    }

    /// Queues a position update for broadcast to every other player.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::ConductorUnavailable`] if the conductor stopped.
    pub async fn publish(&self, update: PositionUpdate) -> Result<(), HubError> {
        self.positions
            .send(update)
            .await
            .map_err(|_| HubError::ConductorUnavailable)
    }

    /// Tears a player down: removes it from the registry, which closes its
    /// queues and stops both of its loops.
    ///
    /// Safe to call from both loops at once; only the first call returns
    /// `true`.
    pub async fn disconnect(&self, id: PlayerId) -> bool {
        self.registry.deregister(id).await
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn admit_registers_and_greets() {
        let (hub, _conductor) = Hub::new(HubConfig::default());
        let Ok(mut admission) = hub.admit().await else {
            panic!("admission failed");
        };
        let id = admission.player.id();
        assert!(hub.registry().contains(id).await);
        assert_eq!(admission.player.position(), Position::new(512.0, 512.0));
        assert_eq!(admission.player.radius(), 20);

        let Some(greeting) = admission.inbox.raw.recv().await else {
            panic!("no greeting queued");
        };
        let value: serde_json::Value = serde_json::from_str(greeting.as_str()).unwrap_or_default();
        assert_eq!(value["name"], "getId");
        assert_eq!(value["uid"], serde_json::Value::from(id.to_string()));
    }

    #[tokio::test]
    async fn disconnect_is_idempotent() {
        let (hub, _conductor) = Hub::new(HubConfig::default());
        let Ok(admission) = hub.admit().await else {
            panic!("admission failed");
        };
        let id = admission.player.id();
        let (first, second) = tokio::join!(hub.disconnect(id), hub.disconnect(id));
        assert!(first ^ second);
        assert!(hub.registry().is_empty().await);
    }

    #[tokio::test]
    async fn publish_fails_once_conductor_is_gone() {
        let (hub, conductor) = Hub::new(HubConfig::default());
        drop(conductor);
        assert!(matches!(
            hub.publish(PositionUpdate::new(0.0, 0.0)).await,
            Err(HubError::ConductorUnavailable)
        ));
        let Ok(admission) = hub.admit().await else {
            panic!("admission failed");
        };
        assert!(hub.announce(admission.player.snapshot()).await.is_err());
    }
}
