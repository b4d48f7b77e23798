//! Hub configuration loaded from environment variables.
//!
//! All settings come from environment variables (or a `.env` file via
//! `dotenvy`). Only the bind address and the route path are visible to
//! clients; the remaining keys tune the spawn state and delivery queues.

use std::net::SocketAddr;
use std::str::FromStr;

use crate::error::HubError;

/// Route of the health probe; the player route may not shadow it.
pub const HEALTH_PATH: &str = "/health";

/// What the conductor does when a recipient's event queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Wait until the recipient drains its queue. A stalled client
    /// stalls every broadcast behind it.
    #[default]
    Block,
    /// Tear the recipient down and move on to the next one.
    Disconnect,
}

impl FromStr for OverflowPolicy {
    type Err = HubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "block" => Ok(Self::Block),
            "disconnect" => Ok(Self::Disconnect),
            other => Err(HubError::InvalidConfig(format!(
                "unknown overflow policy {other:?}"
            ))),
        }
    }
}

/// Top-level hub configuration.
///
/// Loaded once at startup via [`HubConfig::from_env`].
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Socket address to bind the HTTP server to (e.g. `127.0.0.1:5000`).
    pub listen_addr: SocketAddr,

    /// Route that upgrades to the player WebSocket.
    pub route_path: String,

    /// Horizontal spawn coordinate for new players.
    pub spawn_x: f64,

    /// Vertical spawn coordinate for new players.
    pub spawn_y: f64,

    /// Radius assigned to every new player.
    pub player_radius: u32,

    /// Capacity of each player's outbound event queue.
    pub delivery_queue_capacity: usize,

    /// Capacity of each of the conductor's two input queues.
    pub conductor_queue_capacity: usize,

    /// Behaviour when a player's event queue is full.
    pub overflow_policy: OverflowPolicy,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            route_path: "/playersocket".to_string(),
            spawn_x: 512.0,
            spawn_y: 512.0,
            player_radius: 20,
            delivery_queue_capacity: 256,
            conductor_queue_capacity: 1024,
            overflow_policy: OverflowPolicy::Block,
        }
    }
}

impl HubConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to the [`Default`] values when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::InvalidConfig`] if `LISTEN_ADDR` cannot be
    /// parsed, `ROUTE_PATH` is not a plain absolute path distinct from
    /// [`HEALTH_PATH`], a queue capacity is zero, or `OVERFLOW_POLICY` is
    /// not `block` or `disconnect`.
    pub fn from_env() -> Result<Self, HubError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, HubError> {
        let defaults = Self::default();

        let listen_addr = match lookup("LISTEN_ADDR") {
            Some(raw) => raw
                .parse()
                .map_err(|e| HubError::InvalidConfig(format!("LISTEN_ADDR {raw:?}: {e}")))?,
            None => defaults.listen_addr,
        };

        let route_path = lookup("ROUTE_PATH").unwrap_or(defaults.route_path);
        validate_route(&route_path)?;

        let overflow_policy = match lookup("OVERFLOW_POLICY") {
            Some(raw) => raw.parse()?,
            None => defaults.overflow_policy,
        };

        let config = Self {
            listen_addr,
            route_path,
            spawn_x: parse_or(&lookup, "SPAWN_X", defaults.spawn_x),
            spawn_y: parse_or(&lookup, "SPAWN_Y", defaults.spawn_y),
            player_radius: parse_or(&lookup, "PLAYER_RADIUS", defaults.player_radius),
            delivery_queue_capacity: parse_or(
                &lookup,
                "DELIVERY_QUEUE_CAPACITY",
                defaults.delivery_queue_capacity,
            ),
            conductor_queue_capacity: parse_or(
                &lookup,
                "CONDUCTOR_QUEUE_CAPACITY",
                defaults.conductor_queue_capacity,
            ),
            overflow_policy,
        };

        // tokio's bounded mpsc panics on a zero capacity
        if config.delivery_queue_capacity == 0 || config.conductor_queue_capacity == 0 {
            return Err(HubError::InvalidConfig(
                "queue capacities must be greater than zero".to_string(),
            ));
        }

        Ok(config)
    }
}

/// Rejects route paths the router would refuse to mount.
///
/// Captures and wildcards (`{id}`, `:id`, `*rest`) make axum panic at
/// startup, as does a route that collides with [`HEALTH_PATH`].
fn validate_route(route_path: &str) -> Result<(), HubError> {
    if !route_path.starts_with('/') {
        return Err(HubError::InvalidConfig(format!(
            "ROUTE_PATH must start with '/', got {route_path:?}"
        )));
    }
    if route_path.contains(['{', '}'])
        || route_path
            .split('/')
            .any(|segment| segment.starts_with([':', '*']))
    {
        return Err(HubError::InvalidConfig(format!(
            "ROUTE_PATH must be a literal path, got {route_path:?}"
        )));
    }
    if route_path == HEALTH_PATH {
        return Err(HubError::InvalidConfig(format!(
            "ROUTE_PATH {route_path:?} collides with the health probe"
        )));
    }
    Ok(())
}

/// Parses a looked-up value as `T`, returning `default` on missing
/// or invalid values.
fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    lookup(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<HubConfig, HubError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        HubConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let Ok(config) = load(&[]) else {
            panic!("defaults must load");
        };
        assert_eq!(config.listen_addr.to_string(), "127.0.0.1:5000");
        assert_eq!(config.route_path, "/playersocket");
        assert_eq!(config.player_radius, 20);
        assert_eq!(config.overflow_policy, OverflowPolicy::Block);
    }

    #[test]
    fn overrides_are_applied() {
        let Ok(config) = load(&[
            ("LISTEN_ADDR", "0.0.0.0:9000"),
            ("ROUTE_PATH", "/arena"),
            ("PLAYER_RADIUS", "32"),
            ("SPAWN_X", "10.5"),
            ("OVERFLOW_POLICY", "Disconnect"),
        ]) else {
            panic!("overrides must load");
        };
        assert_eq!(config.listen_addr.port(), 9000);
        assert_eq!(config.route_path, "/arena");
        assert_eq!(config.player_radius, 32);
        assert!((config.spawn_x - 10.5).abs() < f64::EPSILON);
        assert_eq!(config.overflow_policy, OverflowPolicy::Disconnect);
    }

    #[test]
    fn unparsable_numbers_fall_back() {
        let Ok(config) = load(&[("PLAYER_RADIUS", "huge")]) else {
            panic!("fallback must load");
        };
        assert_eq!(config.player_radius, 20);
    }

    #[test]
    fn bad_listen_addr_is_rejected() {
        assert!(matches!(
            load(&[("LISTEN_ADDR", "localhost")]),
            Err(HubError::InvalidConfig(_))
        ));
    }

    #[test]
    fn relative_route_is_rejected() {
        assert!(load(&[("ROUTE_PATH", "playersocket")]).is_err());
    }

    #[test]
    fn health_route_is_rejected() {
        assert!(matches!(
            load(&[("ROUTE_PATH", HEALTH_PATH)]),
            Err(HubError::InvalidConfig(_))
        ));
    }

    #[test]
    fn route_with_capture_syntax_is_rejected() {
        for route in ["/{", "/players/{id}", "/}", "/:id", "/*rest"] {
            assert!(
                matches!(load(&[("ROUTE_PATH", route)]), Err(HubError::InvalidConfig(_))),
                "{route} accepted"
            );
        }
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(load(&[("DELIVERY_QUEUE_CAPACITY", "0")]).is_err());
        assert!(load(&[("CONDUCTOR_QUEUE_CAPACITY", "0")]).is_err());
    }

    #[test]
    fn unknown_policy_is_rejected() {
        assert!(load(&[("OVERFLOW_POLICY", "drop")]).is_err());
    }
}
