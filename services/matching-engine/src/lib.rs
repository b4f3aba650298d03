//! Matching Engine Service
//!
//! Pairs pending delivery orders with available robots.
//!
//! **Fairness:**
//! - Orders are matched in intake order (engine-assigned sequence numbers)
//! - Robots are matched in the order they became available
//!
//! **Key Invariants:**
//! - A robot id appears in the availability set at most once
//! - No order or robot appears in more than one emitted match
//! - Only the engine task mutates the queues
//!
//! # Architecture
//!
//! ```text
//!  order intake ──┐
//!                 ├──► EngineService ──tick──► MatchStream
//! presence intake ┘      (owns queues)
//! ```

pub mod config;
pub mod engine;
pub mod events;
pub mod queue;
pub mod runtime;

pub use config::{EngineConfig, TickPolicy};
pub use engine::MatchingEngine;
pub use events::EngineSnapshot;
pub use runtime::{spawn, EngineHandle, EngineService, MatchStream};
