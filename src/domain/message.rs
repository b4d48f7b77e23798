//! Wire messages exchanged with players.
//!
//! Inbound frames are decoded once, at the transport boundary, into a
//! [`PositionUpdate`]. Everything the hub sends is a [`ServerMessage`].
//!
//! ```text
//! client → hub   {"positionX": 10, "positionY": 20, ...}
//! hub → client   {"name": "getId", "uid": "…"}
//!                {"name": "new", "centerX": 512, "centerY": 512, "radius": 20, "uid": "…"}
//!                {"id": "…", "positionX": 10, "positionY": 20, ...}
//! ```

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use super::{PlayerId, PlayerSnapshot, Position};
use crate::error::HubError;

/// A position report sent by a player.
///
/// Fields other than the coordinates are kept in `extra` and forwarded
/// untouched. `id` is never read from the client: the hub stamps the
/// originator with [`PositionUpdate::stamped`] before broadcasting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionUpdate {
    /// Originating player, filled in by the hub.
    #[serde(default, skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub id: Option<PlayerId>,
    /// New horizontal coordinate.
    #[serde(rename = "positionX")]
    pub position_x: f64,
    /// New vertical coordinate.
    #[serde(rename = "positionY")]
    pub position_y: f64,
    /// Any additional client fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PositionUpdate {
    /// Creates an update with no extra fields.
    #[must_use]
    pub fn new(position_x: f64, position_y: f64) -> Self {
        Self {
            id: None,
            position_x,
            position_y,
            extra: Map::new(),
        }
    }

    /// Decodes one inbound frame.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Decode`] if the payload is not a JSON object
    /// with numeric `positionX` and `positionY` fields.
    pub fn decode(payload: &[u8]) -> Result<Self, HubError> {
        serde_json::from_slice(payload).map_err(HubError::Decode)
    }

    /// Marks `origin` as the sender, discarding any client-supplied `id`.
    #[must_use]
    pub fn stamped(mut self, origin: PlayerId) -> Self {
        self.extra.remove("id");
        self.id = Some(origin);
        self
    }

    /// Returns the reported coordinates.
    #[must_use]
    pub const fn position(&self) -> Position {
        Position::new(self.position_x, self.position_y)
    }
}

/// Every event the hub delivers to a player.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    /// Tells a freshly connected player its own identifier.
    IdentityAssignment {
        /// The newcomer's identifier.
        uid: PlayerId,
    },
    /// Tells an existing player that someone joined.
    JoinAnnouncement(PlayerSnapshot),
    /// Tells a newcomer about one player that was already present.
    Bootstrap(PlayerSnapshot),
    /// Relays another player's position update.
    Position(PositionUpdate),
}

impl ServerMessage {
    /// Encodes the message as a JSON text payload.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Encode`] if serialization fails.
    pub fn encode(&self) -> Result<String, HubError> {
        serde_json::to_string(self).map_err(HubError::Encode)
    }

    /// Returns a short label for logging.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::IdentityAssignment { .. } => "identity_assignment",
            Self::JoinAnnouncement(_) => "join_announcement",
            Self::Bootstrap(_) => "bootstrap",
            Self::Position(_) => "position",
        }
    }
}

/// Borrowed wire form of [`ServerMessage`]. Announcements and bootstrap
/// events share the `new` shape on the wire.
#[derive(Serialize)]
#[serde(untagged)]
enum Wire<'a> {
    Named(Named<'a>),
    Position(&'a PositionUpdate),
}

#[derive(Serialize)]
#[serde(tag = "name")]
enum Named<'a> {
    #[serde(rename = "getId")]
    GetId { uid: PlayerId },
    #[serde(rename = "new")]
    New(&'a PlayerSnapshot),
}

impl Serialize for ServerMessage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let wire = match self {
            Self::IdentityAssignment { uid } => Wire::Named(Named::GetId { uid: *uid }),
            Self::JoinAnnouncement(snap) | Self::Bootstrap(snap) => Wire::Named(Named::New(snap)),
            Self::Position(update) => Wire::Position(update),
        };
        wire.serialize(serializer)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn to_value(msg: &ServerMessage) -> Value {
        let Ok(json) = msg.encode() else {
            panic!("encode failed");
        };
        serde_json::from_str(&json).unwrap_or_default()
    }

    #[test]
    fn decode_keeps_extra_fields() {
        let Ok(update) = PositionUpdate::decode(br#"{"positionX":1.5,"positionY":2,"color":"red"}"#)
        else {
            panic!("valid frame rejected");
        };
        assert_eq!(update.position(), Position::new(1.5, 2.0));
        assert_eq!(update.extra.get("color"), Some(&Value::from("red")));
        assert!(update.id.is_none());
    }

    #[test]
    fn decode_rejects_missing_coordinates() {
        assert!(matches!(
            PositionUpdate::decode(br#"{"positionX":1}"#),
            Err(HubError::Decode(_))
        ));
        assert!(PositionUpdate::decode(b"not json").is_err());
        assert!(PositionUpdate::decode(br#"{"positionX":"1","positionY":2}"#).is_err());
    }

    #[test]
    fn stamping_replaces_client_id() {
        let Ok(update) = PositionUpdate::decode(br#"{"positionX":0,"positionY":0,"id":"spoofed"}"#)
        else {
            panic!("valid frame rejected");
        };
        let origin = PlayerId::new();
        let value = to_value(&ServerMessage::Position(update.stamped(origin)));
        assert_eq!(value["id"], Value::from(origin.to_string()));
        assert!(value.get("name").is_none());
    }

    #[test]
    fn identity_assignment_wire_shape() {
        let uid = PlayerId::new();
        let value = to_value(&ServerMessage::IdentityAssignment { uid });
        assert_eq!(value["name"], "getId");
        assert_eq!(value["uid"], Value::from(uid.to_string()));
    }

    #[test]
    fn announcement_and_bootstrap_share_new_shape() {
        let snap = PlayerSnapshot {
            center_x: 512.0,
            center_y: 256.0,
            radius: 20,
            uid: PlayerId::new(),
        };
        let announce = to_value(&ServerMessage::JoinAnnouncement(snap));
        let bootstrap = to_value(&ServerMessage::Bootstrap(snap));
        assert_eq!(announce, bootstrap);
        assert_eq!(announce["name"], "new");
        assert_eq!(announce["centerY"], 256.0);
        assert_eq!(announce["radius"], 20);
    }

    #[test]
    fn kind_labels() {
        let msg = ServerMessage::Position(PositionUpdate::new(0.0, 0.0));
        assert_eq!(msg.kind(), "position");
    }
}
