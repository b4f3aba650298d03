//! Matching engine core
//!
//! Owns the order queue and the robot availability set and pairs them.
//! Purely synchronous: the runtime module feeds it events one at a time
//! and decides when to tick.

use std::collections::HashSet;

use types::dispatch::Match;
use types::errors::QueueError;
use types::ids::{OrderId, RobotId};
use types::order::{Order, OrderRequest};
use types::robot::{PresenceState, RobotPresence};

use crate::config::TickPolicy;
use crate::events::EngineSnapshot;
use crate::queue::{OrderQueue, RobotAvailabilitySet};

/// Orders included in a snapshot
const SNAPSHOT_ORDER_LIMIT: usize = 20;

/// Main matching engine
pub struct MatchingEngine {
    /// Pending orders by sequence
    orders: OrderQueue,
    /// Ids of the orders in `orders`; an id is pending at most once
    pending_ids: HashSet<OrderId>,
    /// Robots waiting for work, FIFO
    robots: RobotAvailabilitySet,
    /// Robots matched and not yet back online
    assigned: HashSet<RobotId>,
    /// Sequence handed to the next fresh order
    next_sequence: u64,
    total_matches: u64,
    tick_policy: TickPolicy,
}

/// What a presence update did to the engine state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceOutcome {
    /// Robot joined the availability set
    Queued,
    /// Assigned robot finished and rejoined the availability set
    Rejoined,
    /// Waiting robot left the availability set
    Removed,
    /// Assigned robot went offline; nothing was queued
    ReleasedWhileAssigned,
}

impl MatchingEngine {
    pub fn new(tick_policy: TickPolicy) -> Self {
        Self {
            orders: OrderQueue::new(),
            pending_ids: HashSet::new(),
            robots: RobotAvailabilitySet::new(),
            assigned: HashSet::new(),
            next_sequence: 1,
            total_matches: 0,
            tick_policy,
        }
    }

    /// Accept a fresh order, stamping it with the next sequence number
    ///
    /// Returns the assigned sequence. An order id that is already pending
    /// is rejected with `DuplicateOrder` and consumes no sequence.
    pub fn accept_order(&mut self, request: OrderRequest, now: i64) -> Result<u64, QueueError> {
        if !self.pending_ids.insert(request.order_id) {
            return Err(QueueError::DuplicateOrder(request.order_id));
        }
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.orders.insert(request.sequenced(sequence, now));
        Ok(sequence)
    }

    /// Put back an order that already carries a sequence number
    ///
    /// Its original sequence is kept, so it goes ahead of every order
    /// accepted after it. Rejected with `DuplicateOrder` if the same id was
    /// resubmitted while the match was in flight.
    pub fn requeue_order(&mut self, order: Order) -> Result<(), QueueError> {
        if !self.pending_ids.insert(order.order_id) {
            return Err(QueueError::DuplicateOrder(order.order_id));
        }
        if order.sequence >= self.next_sequence {
            self.next_sequence = order.sequence + 1;
        }
        self.orders.insert(order);
        Ok(())
    }

    /// Apply a robot presence transition
    ///
    /// `online` enqueues the robot (rejecting duplicates); `offline` removes
    /// it. An offline for a robot that is currently assigned only clears the
    /// assignment. An offline for a robot the engine does not know about is
    /// `NotFound`.
    pub fn apply_presence(&mut self, presence: RobotPresence) -> Result<PresenceOutcome, QueueError> {
        let RobotPresence { robot_id, state } = presence;
        match state {
            PresenceState::Online => {
                let was_assigned = self.assigned.remove(&robot_id);
                self.robots.enqueue(robot_id)?;
                if was_assigned {
                    Ok(PresenceOutcome::Rejoined)
                } else {
                    Ok(PresenceOutcome::Queued)
                }
            }
            PresenceState::Offline => match self.robots.dequeue(&robot_id) {
                Ok(()) => Ok(PresenceOutcome::Removed),
                Err(err) => {
                    if self.assigned.remove(&robot_id) {
                        Ok(PresenceOutcome::ReleasedWhileAssigned)
                    } else {
                        Err(err)
                    }
                }
            },
        }
    }

    /// Whether a tick would produce at least one match
    pub fn has_pair(&self) -> bool {
        !self.orders.is_empty() && !self.robots.is_empty()
    }

    /// Pair the oldest order with the longest-waiting robot
    pub fn match_one(&mut self, now: i64) -> Option<Match> {
        if !self.has_pair() {
            return None;
        }

        let order = self.orders.pop()?;
        let robot_id = match self.robots.pop_front() {
            Ok(robot_id) => robot_id,
            Err(_) => {
                self.orders.insert(order);
                return None;
            }
        };

        self.pending_ids.remove(&order.order_id);
        self.assigned.insert(robot_id.clone());
        self.total_matches += 1;
        Some(Match::new(order, robot_id, now))
    }

    /// Run one tick under the configured policy
    pub fn tick(&mut self, now: i64) -> Vec<Match> {
        let limit = self.tick_policy.limit();
        let mut matches = Vec::new();
        while matches.len() < limit {
            match self.match_one(now) {
                Some(matched) => matches.push(matched),
                None => break,
            }
        }
        matches
    }

    pub fn tick_policy(&self) -> TickPolicy {
        self.tick_policy
    }

    pub fn pending_orders(&self) -> usize {
        self.orders.len()
    }

    pub fn available_robots(&self) -> usize {
        self.robots.len()
    }

    pub fn is_available(&self, robot_id: &RobotId) -> bool {
        self.robots.contains(robot_id)
    }

    pub fn is_assigned(&self, robot_id: &RobotId) -> bool {
        self.assigned.contains(robot_id)
    }

    pub fn is_pending(&self, order_id: &OrderId) -> bool {
        self.pending_ids.contains(order_id)
    }

    pub fn snapshot(&self, now: i64) -> EngineSnapshot {
        EngineSnapshot {
            pending_orders: self.orders.len(),
            oldest_wait_ms: self.orders.peek().map(|order| order.waited_millis(now)),
            next_orders: self.orders.snapshot(SNAPSHOT_ORDER_LIMIT),
            available_robots: self.robots.snapshot(),
            assigned_robots: self.assigned.len(),
            next_sequence: self.next_sequence,
            total_matches: self.total_matches,
            tick_policy: self.tick_policy,
        }
    }
}

impl Default for MatchingEngine {
    fn default() -> Self {
        Self::new(TickPolicy::Single)
    }
}
