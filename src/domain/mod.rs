//! Domain layer: player identity and state, wire messages, delivery
//! queues, and the registry of live players.

pub mod message;
pub mod outbox;
pub mod player;
pub mod player_id;
pub mod player_registry;

pub use message::{PositionUpdate, ServerMessage};
pub use outbox::{Inbox, Outbox};
pub use player::{Player, PlayerSnapshot, Position};
pub use player_id::PlayerId;
pub use player_registry::{Member, PlayerRegistry};
