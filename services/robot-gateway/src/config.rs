//! Gateway configuration
//!
//! Defaults match the reference deployment; every field can be overridden
//! through a `DISPATCH_*` environment variable (an optional `.env` file is
//! loaded first).
//!
//! | Variable | Default |
//! |----------|---------|
//! | `DISPATCH_LISTEN_ADDR` | `0.0.0.0:8080` |
//! | `DISPATCH_TICK_MS` | `1000` |
//! | `DISPATCH_TICK_POLICY` | `single` |
//! | `DISPATCH_ORDER_INTAKE_CAPACITY` | `100` |
//! | `DISPATCH_PRESENCE_INTAKE_CAPACITY` | `100` |
//! | `DISPATCH_MATCH_OUTPUT_CAPACITY` | `10` |
//! | `DISPATCH_HUB_COMMAND_CAPACITY` | `100` |
//! | `DISPATCH_SESSION_OUTBOUND_CAPACITY` | `256` |
//! | `DISPATCH_STALE_MATCH_POLICY` | `requeue` |

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use matching_engine::{EngineConfig, TickPolicy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What the hub does with a match whose robot has no live session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaleMatchPolicy {
    /// Hand the order back to the engine with its original sequence
    #[default]
    Requeue,
    /// Log and forget the order
    Drop,
}

impl FromStr for StaleMatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "requeue" => Ok(StaleMatchPolicy::Requeue),
            "drop" => Ok(StaleMatchPolicy::Drop),
            other => Err(format!("expected requeue or drop, got {other}")),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Hub tuning
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Pending hub commands before senders wait (default: 100)
    pub command_capacity: usize,
    pub stale_match_policy: StaleMatchPolicy,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            command_capacity: 100,
            stale_match_policy: StaleMatchPolicy::Requeue,
        }
    }
}

/// Everything the gateway binary needs to start
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub listen_addr: SocketAddr,
    pub engine: EngineConfig,
    pub hub: HubConfig,
    /// Frames buffered per session before it counts as lagging (default: 256)
    pub session_outbound_capacity: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            engine: EngineConfig::default(),
            hub: HubConfig::default(),
            session_outbound_capacity: 256,
        }
    }
}

impl GatewayConfig {
    /// Load from the process environment, after an optional `.env` file
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset keys keep their default
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = parse_var::<_, SocketAddr>(&lookup, "DISPATCH_LISTEN_ADDR")? {
            config.listen_addr = addr;
        }
        if let Some(ms) = positive_var(&lookup, "DISPATCH_TICK_MS")? {
            config.engine.tick_interval = Duration::from_millis(ms as u64);
        }
        if let Some(raw) = lookup("DISPATCH_TICK_POLICY") {
            config.engine.tick_policy =
                TickPolicy::parse(&raw).ok_or_else(|| ConfigError::Invalid {
                    key: "DISPATCH_TICK_POLICY",
                    reason: format!("expected single or drain, got {raw}"),
                })?;
        }
        if let Some(n) = positive_var(&lookup, "DISPATCH_ORDER_INTAKE_CAPACITY")? {
            config.engine.order_intake_capacity = n;
        }
        if let Some(n) = positive_var(&lookup, "DISPATCH_PRESENCE_INTAKE_CAPACITY")? {
            config.engine.presence_intake_capacity = n;
        }
        if let Some(n) = positive_var(&lookup, "DISPATCH_MATCH_OUTPUT_CAPACITY")? {
            config.engine.match_output_capacity = n;
        }
        if let Some(n) = positive_var(&lookup, "DISPATCH_HUB_COMMAND_CAPACITY")? {
            config.hub.command_capacity = n;
        }
        if let Some(n) = positive_var(&lookup, "DISPATCH_SESSION_OUTBOUND_CAPACITY")? {
            config.session_outbound_capacity = n;
        }
        if let Some(policy) = parse_var::<_, StaleMatchPolicy>(&lookup, "DISPATCH_STALE_MATCH_POLICY")? {
            config.hub.stale_match_policy = policy;
        }

        Ok(config)
    }
}

fn parse_var<F, T>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::Invalid {
                key,
                reason: e.to_string(),
            }),
    }
}

// Channel capacities and the tick period must be non-zero
fn positive_var<F>(lookup: &F, key: &'static str) -> Result<Option<usize>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match parse_var::<F, usize>(lookup, key)? {
        Some(0) => Err(ConfigError::Invalid {
            key,
            reason: "must be greater than zero".to_string(),
        }),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let config = GatewayConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.listen_addr, SocketAddr::from(([0, 0, 0, 0], 8080)));
        assert_eq!(config.engine.tick_interval, Duration::from_secs(1));
        assert_eq!(config.hub.command_capacity, 100);
        assert_eq!(config.session_outbound_capacity, 256);
        assert_eq!(config.hub.stale_match_policy, StaleMatchPolicy::Requeue);
    }

    #[test]
    fn test_overrides() {
        let config = GatewayConfig::from_lookup(lookup_from(&[
            ("DISPATCH_LISTEN_ADDR", "127.0.0.1:9000"),
            ("DISPATCH_TICK_MS", "250"),
            ("DISPATCH_TICK_POLICY", "drain"),
            ("DISPATCH_MATCH_OUTPUT_CAPACITY", "4"),
            ("DISPATCH_STALE_MATCH_POLICY", "drop"),
        ]))
        .unwrap();

        assert_eq!(config.listen_addr.port(), 9000);
        assert_eq!(config.engine.tick_interval, Duration::from_millis(250));
        assert_eq!(config.engine.tick_policy, TickPolicy::Drain);
        assert_eq!(config.engine.match_output_capacity, 4);
        assert_eq!(config.hub.stale_match_policy, StaleMatchPolicy::Drop);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = GatewayConfig::from_lookup(lookup_from(&[(
            "DISPATCH_SESSION_OUTBOUND_CAPACITY",
            "0",
        )]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "DISPATCH_SESSION_OUTBOUND_CAPACITY",
                ..
            }
        ));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(GatewayConfig::from_lookup(lookup_from(&[("DISPATCH_TICK_MS", "soon")])).is_err());
        assert!(
            GatewayConfig::from_lookup(lookup_from(&[("DISPATCH_TICK_POLICY", "all")])).is_err()
        );
        assert!(GatewayConfig::from_lookup(lookup_from(&[(
            "DISPATCH_STALE_MATCH_POLICY",
            "retry"
        )]))
        .is_err());
    }
}
