//! Per-player state shared between a connection and the conductor.

use serde::Serialize;
use tokio::sync::watch;

use super::PlayerId;

/// A point in arena coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Position {
    /// Creates a position from its two coordinates.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A connected player.
///
/// Identity and radius are fixed at admission. The position is held in a
/// `watch` cell: the player's own read loop is the only writer, and the
/// conductor always reads a whole `(x, y)` pair, never a half-updated one.
#[derive(Debug)]
pub struct Player {
    id: PlayerId,
    radius: u32,
    position: watch::Sender<Position>,
}

impl Player {
    /// Creates a player at `spawn` with the given radius.
    #[must_use]
    pub fn new(id: PlayerId, radius: u32, spawn: Position) -> Self {
        let (position, _) = watch::channel(spawn);
        Self {
            id,
            radius,
            position,
        }
    }

    /// Returns the player's identifier.
    #[must_use]
    pub const fn id(&self) -> PlayerId {
        self.id
    }

    /// Returns the player's radius.
    #[must_use]
    pub const fn radius(&self) -> u32 {
        self.radius
    }

    /// Returns the most recently stored position.
    #[must_use]
    pub fn position(&self) -> Position {
        *self.position.borrow()
    }

    /// Stores a new position. Called only from the player's read loop.
    pub fn move_to(&self, position: Position) {
        self.position.send_replace(position);
    }

    /// Captures the player's current state for a `new` event.
    #[must_use]
    pub fn snapshot(&self) -> PlayerSnapshot {
        let Position { x, y } = self.position();
        PlayerSnapshot {
            center_x: x,
            center_y: y,
            radius: self.radius,
            uid: self.id,
        }
    }
}

/// Point-in-time description of a player, as carried by `new` events.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    /// Horizontal coordinate of the player's center.
    pub center_x: f64,
    /// Vertical coordinate of the player's center.
    pub center_y: f64,
    /// Player radius.
    pub radius: u32,
    /// Player identifier.
    pub uid: PlayerId,
}
