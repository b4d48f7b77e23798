//! # arena-hub
//!
//! Real-time state-synchronization hub for multiplayer arena sessions.
//!
//! Every player holds a WebSocket connection. Position updates from one
//! player are relayed to every other player, and a player who joins is
//! told about everyone already in the arena.
//!
//! ## Architecture
//!
//! ```text
//! Players (WebSocket)
//!     │
//!     ├── WS Handler + read/write loops (ws/)
//!     │
//!     ├── Hub handle (service/)
//!     ├── Conductor task (service/)
//!     │
//!     └── PlayerRegistry + delivery queues (domain/)
//! ```
//!
//! The conductor is the only component that fans events out. It works
//! from a snapshot of the registry taken under the registry lock, and it
//! finishes one broadcast before starting the next.

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod ws;
