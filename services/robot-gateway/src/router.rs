use crate::handlers::{dispatch, health, order, robots, ws};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/orders", post(order::create_order))
        .route("/dispatch/queues", get(dispatch::get_queues))
        .route("/robots", get(robots::list_robots))
        .route("/robots/{robot_id}", get(robots::get_robot))
        .route("/ws", get(ws::ws_handler));

    Router::new()
        .route("/health", get(health::health))
        .nest("/v1", api_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
