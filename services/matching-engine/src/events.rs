//! Messages consumed by the matching engine loop
//!
//! The engine owns its queues exclusively; everything else talks to it
//! through these messages.

use serde::Serialize;
use tokio::sync::oneshot;
use types::ids::RobotId;
use types::order::{Order, OrderRequest};

use crate::config::TickPolicy;

/// Order intake channel payload
#[derive(Debug, Clone)]
pub enum OrderIntake {
    /// Fresh order: the engine assigns the next sequence number
    New(OrderRequest),
    /// Order handed back after an undeliverable match; keeps its sequence
    Requeue(Order),
}

/// Read-only queries answered by the engine loop
#[derive(Debug)]
pub enum EngineQuery {
    Snapshot(oneshot::Sender<EngineSnapshot>),
}

/// Point-in-time view of the engine state
#[derive(Debug, Clone, Serialize)]
pub struct EngineSnapshot {
    /// Orders waiting for a robot
    pub pending_orders: usize,
    /// Milliseconds the head of the order queue has been waiting
    pub oldest_wait_ms: Option<i64>,
    /// Head of the order queue, in match order
    pub next_orders: Vec<Order>,
    /// Available robots, longest-waiting first
    pub available_robots: Vec<RobotId>,
    /// Robots matched and not yet back online
    pub assigned_robots: usize,
    /// Sequence the next fresh order will receive
    pub next_sequence: u64,
    /// Matches emitted since start
    pub total_matches: u64,
    /// Pairings allowed per tick
    pub tick_policy: TickPolicy,
}
