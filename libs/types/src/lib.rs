//! Types library for the robot dispatch service
//!
//! Core type definitions shared by the matching engine and the robot
//! gateway. Everything here is plain data: no channels, no I/O.
//!
//! # Modules
//! - `ids`: Identifiers (OrderId, OwnerId, RobotId, SessionId)
//! - `order`: Order intake and sequenced order types
//! - `robot`: Robot presence and session connection status
//! - `dispatch`: Match results
//! - `errors`: Error taxonomy
//! - `clock`: Wall-clock helpers

pub mod clock;
pub mod dispatch;
pub mod errors;
pub mod ids;
pub mod order;
pub mod robot;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::dispatch::*;
    pub use crate::errors::*;
    pub use crate::ids::*;
    pub use crate::order::*;
    pub use crate::robot::*;
}
