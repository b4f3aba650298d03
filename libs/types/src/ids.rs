//! Identifier types for dispatch entities
//!
//! Order and owner ids come from the order-acceptance layer (the relational
//! store assigns them). Robot ids are chosen by the robots themselves.
//! Session ids are generated here with UUID v7 so that they sort by
//! connection time.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of a persisted delivery order
///
/// Assigned by the persistence layer before the order reaches the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(u64);

impl OrderId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for OrderId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the customer who placed an order
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for OwnerId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Logical robot identity
///
/// Stable across reconnects; a robot announces it in its first `online`
/// frame and a session is bound to it from then on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RobotId(String);

impl RobotId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Try to create a RobotId, returning None for blank input
    pub fn try_new(id: impl Into<String>) -> Option<Self> {
        let s = id.into();
        if s.trim().is_empty() {
            None
        } else {
            Some(Self(s))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RobotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RobotId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Identifier of one live connection
///
/// Uses UUID v7 for time-based sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Create a new SessionId with current timestamp
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_creation() {
        let id1 = SessionId::new();
        let id2 = SessionId::new();
        assert_ne!(id1, id2, "SessionIds should be unique");
    }

    #[test]
    fn test_order_id_serializes_as_number() {
        let id = OrderId::new(101);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "101");

        let deserialized: OrderId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }

    #[test]
    fn test_robot_id_serializes_as_string() {
        let robot = RobotId::new("r1");
        let json = serde_json::to_string(&robot).unwrap();
        assert_eq!(json, "\"r1\"");
    }

    #[test]
    fn test_robot_id_try_new() {
        assert!(RobotId::try_new("rX").is_some());
        assert!(RobotId::try_new("").is_none());
        assert!(RobotId::try_new("   ").is_none());
    }

    #[test]
    fn test_display() {
        assert_eq!(OrderId::new(7).to_string(), "7");
        assert_eq!(RobotId::from("rA").to_string(), "rA");
        assert_eq!(OwnerId::from("user-1").to_string(), "user-1");
    }
}
