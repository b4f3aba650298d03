use robot_gateway::{create_router, AppState, GatewayConfig};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let config = GatewayConfig::from_env()?;
    tracing::info!(
        tick_ms = config.engine.tick_interval.as_millis() as u64,
        tick_policy = ?config.engine.tick_policy,
        stale_match_policy = ?config.hub.stale_match_policy,
        "Starting robot dispatch gateway"
    );

    let (state, tasks) = AppState::start(&config);
    let app = create_router(state);

    let listener = TcpListener::bind(config.listen_addr).await?;
    tracing::info!("Listening on {}", config.listen_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Sessions may still hold hub handles; the actors are not awaited
    tasks.hub.abort();
    tasks.engine.abort();
    tracing::info!("Gateway stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
