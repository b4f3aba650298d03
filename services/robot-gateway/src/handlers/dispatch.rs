use crate::error::AppError;
use crate::state::AppState;
use axum::{extract::State, Json};
use matching_engine::EngineSnapshot;

pub async fn get_queues(State(state): State<AppState>) -> Result<Json<EngineSnapshot>, AppError> {
    Ok(Json(state.engine.snapshot().await?))
}
