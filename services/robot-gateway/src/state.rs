use matching_engine::EngineHandle;
use tokio::task::JoinHandle;

use crate::config::GatewayConfig;
use crate::hub::{self, HubHandle};

#[derive(Clone)]
pub struct AppState {
    pub engine: EngineHandle,
    pub hub: HubHandle,
    pub session_outbound_capacity: usize,
}

/// Background actors started with the state
pub struct ServiceTasks {
    pub engine: JoinHandle<()>,
    pub hub: JoinHandle<()>,
}

impl AppState {
    /// Start the engine and the hub on the current runtime
    pub fn start(config: &GatewayConfig) -> (Self, ServiceTasks) {
        let (engine, matches, engine_task) = matching_engine::spawn(config.engine.clone());
        let (hub, hub_task) = hub::spawn(engine.clone(), matches, config.hub.clone());

        let state = Self {
            engine,
            hub,
            session_outbound_capacity: config.session_outbound_capacity,
        };
        let tasks = ServiceTasks {
            engine: engine_task,
            hub: hub_task,
        };
        (state, tasks)
    }
}
