//! WebSocket layer: the upgrade handler and the per-player read and
//! write loops.

pub mod connection;
pub mod handler;
