use crate::error::AppError;
use crate::models::{CreateOrderRequest, OrderResponse};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};

/// Queue an already persisted order for dispatch
pub async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), AppError> {
    if payload.owner_id.as_str().trim().is_empty() {
        return Err(AppError::BadRequest("owner_id must not be blank".into()));
    }

    state
        .engine
        .submit_order(payload.owner_id.clone(), payload.order_id)
        .await?;

    tracing::debug!(order_id = %payload.order_id, owner_id = %payload.owner_id, "Order accepted");
    Ok((
        StatusCode::ACCEPTED,
        Json(OrderResponse::queued(payload.order_id)),
    ))
}
