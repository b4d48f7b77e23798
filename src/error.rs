//! Hub error types.
//!
//! [`HubError`] is the central error type for the hub. None of these
//! errors is retried: configuration errors abort startup, and every
//! per-connection error ends in teardown of that connection only.

/// Errors raised by the hub, its connections, and its configuration.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// A configuration value could not be accepted.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The WebSocket transport failed while reading or writing a frame.
    #[error("transport error: {0}")]
    Transport(#[from] axum::Error),

    /// An inbound frame was not a valid position update.
    #[error("malformed frame: {0}")]
    Decode(#[source] serde_json::Error),

    /// An outbound event could not be encoded.
    #[error("failed to encode event: {0}")]
    Encode(#[source] serde_json::Error),

    /// The peer closed the connection or the stream ended.
    #[error("connection closed")]
    ConnectionClosed,

    /// The conductor task is no longer accepting events.
    #[error("conductor is not running")]
    ConductorUnavailable,
}

impl HubError {
    /// Returns `true` if the error means the peer simply went away,
    /// as opposed to a protocol or transport fault.
    #[must_use]
    pub const fn is_disconnect(&self) -> bool {
        matches!(self, Self::ConnectionClosed)
    }
}
