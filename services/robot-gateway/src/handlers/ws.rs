use crate::session::run_session;
use crate::state::AppState;
use axum::{
    extract::{ws::WebSocketUpgrade, State},
    response::Response,
};
use futures::stream::StreamExt;

/// Upgrade into a robot or monitoring session
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let capacity = state.session_outbound_capacity;
    ws.on_upgrade(move |socket| {
        let (sink, stream) = socket.split();
        run_session(sink, stream, state.hub, capacity)
    })
}
