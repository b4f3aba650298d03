use serde::{Deserialize, Serialize};
use types::ids::{OrderId, OwnerId};

/// Body of `POST /v1/orders`; the order must already be persisted
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderRequest {
    pub owner_id: OwnerId,
    pub order_id: OrderId,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderResponse {
    pub order_id: OrderId,
    pub status: String,
}

impl OrderResponse {
    pub fn queued(order_id: OrderId) -> Self {
        Self {
            order_id,
            status: "QUEUED".to_string(),
        }
    }
}
