//! Robot availability set
//!
//! FIFO of robots waiting for an assignment that also supports removal of
//! an arbitrary robot (a robot may go offline while waiting, not only when
//! it is popped).
//!
//! Every enqueue takes a fresh ticket. The index maps a robot to its live
//! ticket; the FIFO holds `(ticket, robot)` pairs in arrival order. Removal
//! only drops the index entry, leaving a tombstone in the FIFO that
//! `pop_front` skips. Tombstones are compacted once they outnumber live
//! entries, so memory stays proportional to the live set.

use std::collections::{HashMap, VecDeque};

use types::errors::QueueError;
use types::ids::RobotId;

/// Tombstones tolerated before a compaction pass is considered
const COMPACTION_SLACK: usize = 32;

/// Ordered set of available robots
#[derive(Debug, Default)]
pub struct RobotAvailabilitySet {
    /// Arrival order, may contain tombstones
    fifo: VecDeque<(u64, RobotId)>,
    /// Robot → live ticket
    index: HashMap<RobotId, u64>,
    next_ticket: u64,
}

impl RobotAvailabilitySet {
    pub fn new() -> Self {
        Self {
            fifo: VecDeque::new(),
            index: HashMap::new(),
            next_ticket: 0,
        }
    }

    /// Append a robot to the back of the queue
    ///
    /// Fails with `AlreadyQueued` if the robot is already waiting.
    pub fn enqueue(&mut self, robot_id: RobotId) -> Result<(), QueueError> {
        if self.index.contains_key(&robot_id) {
            return Err(QueueError::AlreadyQueued(robot_id));
        }

        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.fifo.push_back((ticket, robot_id.clone()));
        self.index.insert(robot_id, ticket);
        Ok(())
    }

    /// Remove a robot from anywhere in the queue
    ///
    /// Fails with `NotFound` if the robot is not waiting.
    pub fn dequeue(&mut self, robot_id: &RobotId) -> Result<(), QueueError> {
        if self.index.remove(robot_id).is_none() {
            return Err(QueueError::NotFound(robot_id.clone()));
        }
        self.compact_if_sparse();
        Ok(())
    }

    /// Remove and return the robot that has waited longest
    pub fn pop_front(&mut self) -> Result<RobotId, QueueError> {
        if self.index.is_empty() {
            self.fifo.clear();
            return Err(QueueError::Empty);
        }

        while let Some((ticket, robot_id)) = self.fifo.pop_front() {
            if self.is_live(ticket, &robot_id) {
                self.index.remove(&robot_id);
                return Ok(robot_id);
            }
        }

        // Index and FIFO disagree; the FIFO is authoritative for order, so
        // anything left in the index is unreachable.
        self.index.clear();
        Err(QueueError::Empty)
    }

    /// Robot that would be popped next
    pub fn front(&self) -> Option<&RobotId> {
        self.fifo
            .iter()
            .find(|(ticket, robot_id)| self.is_live(*ticket, robot_id))
            .map(|(_, robot_id)| robot_id)
    }

    pub fn contains(&self, robot_id: &RobotId) -> bool {
        self.index.contains_key(robot_id)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Waiting robots, longest-waiting first
    pub fn snapshot(&self) -> Vec<RobotId> {
        self.fifo
            .iter()
            .filter(|(ticket, robot_id)| self.is_live(*ticket, robot_id))
            .map(|(_, robot_id)| robot_id.clone())
            .collect()
    }

    fn is_live(&self, ticket: u64, robot_id: &RobotId) -> bool {
        self.index.get(robot_id) == Some(&ticket)
    }

    fn compact_if_sparse(&mut self) {
        let live = self.index.len();
        if self.fifo.len() <= live * 2 + COMPACTION_SLACK {
            return;
        }

        let index = &self.index;
        self.fifo
            .retain(|(ticket, robot_id)| index.get(robot_id) == Some(ticket));
    }

    #[cfg(test)]
    fn raw_len(&self) -> usize {
        self.fifo.len()
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::VecDeque;

    #[derive(Debug, Clone)]
    enum Op {
        Enqueue(u8),
        Dequeue(u8),
        Pop,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u8..16).prop_map(Op::Enqueue),
            (0u8..16).prop_map(Op::Dequeue),
            Just(Op::Pop),
        ]
    }

    proptest! {
        /// The set behaves exactly like a naive Vec-backed FIFO set
        #[test]
        fn prop_matches_reference_model(ops in proptest::collection::vec(op_strategy(), 0..300)) {
            let mut set = RobotAvailabilitySet::new();
            let mut model: VecDeque<RobotId> = VecDeque::new();

            for op in ops {
                match op {
                    Op::Enqueue(n) => {
                        let id = RobotId::new(format!("r{}", n));
                        let expected_dup = model.contains(&id);
                        let result = set.enqueue(id.clone());
                        prop_assert_eq!(result.is_err(), expected_dup);
                        if !expected_dup {
                            model.push_back(id);
                        }
                    }
                    Op::Dequeue(n) => {
                        let id = RobotId::new(format!("r{}", n));
                        let position = model.iter().position(|r| r == &id);
                        let result = set.dequeue(&id);
                        prop_assert_eq!(result.is_ok(), position.is_some());
                        if let Some(pos) = position {
                            model.remove(pos);
                        }
                    }
                    Op::Pop => {
                        let expected = model.pop_front();
                        let result = set.pop_front().ok();
                        prop_assert_eq!(result, expected);
                    }
                }
                prop_assert_eq!(set.len(), model.len());
            }

            prop_assert_eq!(set.snapshot(), model.into_iter().collect::<Vec<_>>());
        }
    }
}
