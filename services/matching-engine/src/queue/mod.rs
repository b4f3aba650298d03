//! Queue data structures owned by the matching engine
//!
//! Pure data structures with no concurrency of their own; the engine loop
//! is their only writer.

pub mod availability;
pub mod order_queue;

pub use availability::RobotAvailabilitySet;
pub use order_queue::OrderQueue;
