//! Match results emitted by the matching engine

use crate::ids::{OrderId, OwnerId, RobotId};
use crate::order::Order;
use serde::{Deserialize, Serialize};

/// One-shot pairing of an order with a robot
///
/// Emitted once by the engine and never replayed. The owner and sequence
/// travel with the match so an undeliverable match can be handed back to
/// the engine without losing its priority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub order_id: OrderId,
    pub robot_id: RobotId,
    pub owner_id: OwnerId,
    /// Sequence of the matched order
    pub sequence: u64,
    /// Order intake time, Unix millis
    pub accepted_at: i64,
    /// Unix millis
    pub matched_at: i64,
}

impl Match {
    pub fn new(order: Order, robot_id: RobotId, matched_at: i64) -> Self {
        Self {
            order_id: order.order_id,
            robot_id,
            owner_id: order.owner_id,
            sequence: order.sequence,
            accepted_at: order.accepted_at,
            matched_at,
        }
    }

    /// Rebuild the order this match consumed
    pub fn into_order(self) -> Order {
        Order {
            owner_id: self.owner_id,
            order_id: self.order_id,
            sequence: self.sequence,
            accepted_at: self.accepted_at,
        }
    }
}
