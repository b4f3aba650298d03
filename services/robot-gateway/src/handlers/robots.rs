use crate::error::AppError;
use crate::hub::{HubSnapshot, SessionView};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use types::ids::RobotId;

pub async fn list_robots(State(state): State<AppState>) -> Result<Json<HubSnapshot>, AppError> {
    Ok(Json(state.hub.snapshot().await?))
}

/// Live session serving one robot
pub async fn get_robot(
    State(state): State<AppState>,
    Path(robot_id): Path<String>,
) -> Result<Json<SessionView>, AppError> {
    let robot_id = RobotId::try_new(robot_id)
        .ok_or_else(|| AppError::BadRequest("robot_id must not be blank".into()))?;

    let snapshot = state.hub.snapshot().await?;
    snapshot
        .robot(&robot_id)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Robot {robot_id} is not connected")))
}
