//! Type-safe player identifier.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for a connected player.
///
/// Wraps a UUID v4 generated at admission and never changed afterwards.
/// Serialized as the plain UUID string, which is what clients see in the
/// `uid` and `id` fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(uuid::Uuid);

impl PlayerId {
    /// Creates a new random `PlayerId` (UUID v4).
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
