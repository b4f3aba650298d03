//! Matching engine configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How many pairings a single tick may produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TickPolicy {
    /// At most one match per tick
    Single,
    /// Pair oldest order with longest-waiting robot until either side is empty
    Drain,
}

impl TickPolicy {
    /// Upper bound on matches per tick
    pub fn limit(&self) -> usize {
        match self {
            TickPolicy::Single => 1,
            TickPolicy::Drain => usize::MAX,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Some(TickPolicy::Single),
            "drain" => Some(TickPolicy::Drain),
            _ => None,
        }
    }
}

/// Configuration for the matching engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Interval between match ticks (default: 1s)
    pub tick_interval: Duration,
    /// Pairings per tick (default: single)
    pub tick_policy: TickPolicy,
    /// Outstanding order submissions before callers wait (default: 100)
    pub order_intake_capacity: usize,
    /// Outstanding presence updates before callers wait (default: 100)
    pub presence_intake_capacity: usize,
    /// Matches buffered for the consumer (default: 10)
    pub match_output_capacity: usize,
    /// Pending status queries (default: 16)
    pub query_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            tick_policy: TickPolicy::Single,
            order_intake_capacity: 100,
            presence_intake_capacity: 100,
            match_output_capacity: 10,
            query_capacity: 16,
        }
    }
}
