//! Robot dispatch gateway
//!
//! Hosts the matching engine and the dispatch hub behind an axum server:
//! order intake over HTTP, robot sessions over WebSocket.

pub mod config;
pub mod error;
pub mod handlers;
pub mod hub;
pub mod models;
pub mod protocol;
pub mod router;
pub mod session;
pub mod state;

pub use config::{GatewayConfig, HubConfig, StaleMatchPolicy};
pub use hub::{HubHandle, HubSnapshot, SessionView};
pub use router::create_router;
pub use state::AppState;
