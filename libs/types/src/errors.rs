//! Error types for the dispatch core
//!
//! None of these is fatal: the owning loop logs them and carries on.

use crate::ids::{OrderId, RobotId, SessionId};
use thiserror::Error;

/// Availability and order queue errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("Robot already queued: {0}")]
    AlreadyQueued(RobotId),

    #[error("Robot not available: {0}")]
    NotFound(RobotId),

    #[error("Queue is empty")]
    Empty,

    #[error("Order already pending: {0}")]
    DuplicateOrder(OrderId),
}

/// Matching engine errors seen by callers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Matching engine is not running")]
    Closed,
}

/// Dispatch hub errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HubError {
    #[error("Session is bound to robot {bound}, refused {requested}")]
    IdentityMismatch { bound: RobotId, requested: RobotId },

    #[error("Stale match: robot {robot_id} has no live session for order {order_id}")]
    StaleMatch { order_id: OrderId, robot_id: RobotId },

    #[error("Unknown session: {0}")]
    UnknownSession(SessionId),

    #[error("Dispatch hub is not running")]
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_error_display() {
        let err = QueueError::AlreadyQueued(RobotId::from("r1"));
        assert_eq!(err.to_string(), "Robot already queued: r1");
        assert_eq!(QueueError::Empty.to_string(), "Queue is empty");
        assert_eq!(
            QueueError::DuplicateOrder(OrderId::new(42)).to_string(),
            "Order already pending: 42"
        );
    }

    #[test]
    fn test_identity_mismatch_display() {
        let err = HubError::IdentityMismatch {
            bound: RobotId::from("r1"),
            requested: RobotId::from("r2"),
        };
        assert!(err.to_string().contains("r1"));
        assert!(err.to_string().contains("r2"));
    }

    #[test]
    fn test_stale_match_display() {
        let err = HubError::StaleMatch {
            order_id: OrderId::new(7),
            robot_id: RobotId::from("rX"),
        };
        assert_eq!(
            err.to_string(),
            "Stale match: robot rX has no live session for order 7"
        );
    }
}
