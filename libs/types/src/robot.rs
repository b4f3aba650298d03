//! Robot presence types
//!
//! Presence events are transition requests relayed from live sessions to
//! the matching engine. Connection status is per-session metadata kept by
//! the dispatch hub.

use crate::ids::RobotId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Requested presence transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceState {
    /// Robot is connected and ready to take an order
    Online,
    /// Robot is leaving the availability pool
    Offline,
}

impl fmt::Display for PresenceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresenceState::Online => write!(f, "online"),
            PresenceState::Offline => write!(f, "offline"),
        }
    }
}

/// Presence change for one robot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RobotPresence {
    pub robot_id: RobotId,
    pub state: PresenceState,
}

impl RobotPresence {
    pub fn online(robot_id: RobotId) -> Self {
        Self {
            robot_id,
            state: PresenceState::Online,
        }
    }

    pub fn offline(robot_id: RobotId) -> Self {
        Self {
            robot_id,
            state: PresenceState::Offline,
        }
    }
}

/// Connection status of a session as tracked by the hub
///
/// `Unbound → Online → Delivery → Online → …`, with `Offline` between
/// rounds when a bound robot leaves the pool; any state may end on
/// disconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// Connected, no robot identity announced yet
    Unbound,
    /// Bound to a robot that is waiting for work
    Online,
    /// Bound robot has been handed an assignment
    Delivery,
    /// Bound robot reported offline; the session stays open
    Offline,
}

impl ConnectionStatus {
    pub fn is_bound(&self) -> bool {
        !matches!(self, ConnectionStatus::Unbound)
    }
}
