//! Order intake types
//!
//! An order enters the dispatch core as an [`OrderRequest`] and becomes an
//! [`Order`] once the matching engine has stamped it with a sequence number.

use crate::ids::{OrderId, OwnerId};
use serde::{Deserialize, Serialize};

/// Order as submitted by the order-acceptance layer
///
/// The order must already be durably recorded when this is submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub owner_id: OwnerId,
    pub order_id: OrderId,
}

impl OrderRequest {
    pub fn new(owner_id: OwnerId, order_id: OrderId) -> Self {
        Self { owner_id, order_id }
    }

    /// Stamp the request with its engine sequence number
    pub fn sequenced(self, sequence: u64, accepted_at: i64) -> Order {
        Order {
            owner_id: self.owner_id,
            order_id: self.order_id,
            sequence,
            accepted_at,
        }
    }
}

/// Order accepted into the matching engine
///
/// `sequence` is the sole priority key: the lowest sequence is matched
/// first. It is unique for the lifetime of the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub owner_id: OwnerId,
    pub order_id: OrderId,
    pub sequence: u64,
    /// Unix millis at engine intake
    pub accepted_at: i64,
}

impl Order {
    /// Milliseconds this order has been waiting as of `now`
    pub fn waited_millis(&self, now: i64) -> i64 {
        (now - self.accepted_at).max(0)
    }
}
