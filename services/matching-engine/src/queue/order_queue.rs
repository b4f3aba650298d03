//! Pending order queue
//!
//! Min-heap keyed by the engine-assigned sequence number. The order with
//! the lowest sequence (the one accepted first) is always popped first.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use types::order::Order;

/// Heap entry ordered by sequence, smallest first
#[derive(Debug, Clone)]
struct QueuedOrder(Order);

impl PartialEq for QueuedOrder {
    fn eq(&self, other: &Self) -> bool {
        self.0.sequence == other.0.sequence
    }
}

impl Eq for QueuedOrder {}

impl PartialOrd for QueuedOrder {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedOrder {
    // Reversed so that BinaryHeap (a max-heap) yields the lowest sequence
    fn cmp(&self, other: &Self) -> Ordering {
        other.0.sequence.cmp(&self.0.sequence)
    }
}

/// Priority queue of orders waiting for a robot
///
/// Supports insert and pop only. Orders cannot be removed by identity.
#[derive(Debug, Default)]
pub struct OrderQueue {
    heap: BinaryHeap<QueuedOrder>,
}

impl OrderQueue {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
        }
    }

    /// Insert an order, O(log n)
    pub fn insert(&mut self, order: Order) {
        self.heap.push(QueuedOrder(order));
    }

    /// Remove and return the order with the lowest sequence, O(log n)
    pub fn pop(&mut self) -> Option<Order> {
        self.heap.pop().map(|entry| entry.0)
    }

    /// Order that would be popped next
    pub fn peek(&self) -> Option<&Order> {
        self.heap.peek().map(|entry| &entry.0)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Up to `limit` pending orders in match order
    ///
    /// Clones and sorts; intended for status reporting, not the hot path.
    pub fn snapshot(&self, limit: usize) -> Vec<Order> {
        let mut orders: Vec<Order> = self.heap.iter().map(|entry| entry.0.clone()).collect();
        orders.sort_by_key(|order| order.sequence);
        orders.truncate(limit);
        orders
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ids::{OrderId, OwnerId};
    use types::order::OrderRequest;

    fn order(id: u64, sequence: u64) -> Order {
        OrderRequest::new(OwnerId::from("owner"), OrderId::new(id)).sequenced(sequence, 0)
    }

    #[test]
    fn test_pop_empty_returns_none() {
        let mut queue = OrderQueue::new();
        assert!(queue.pop().is_none());
        assert!(queue.peek().is_none());
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn test_pops_lowest_sequence_first() {
        let mut queue = OrderQueue::new();
        queue.insert(order(300, 3));
        queue.insert(order(100, 1));
        queue.insert(order(200, 2));

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.peek().unwrap().order_id, OrderId::new(100));
        assert_eq!(queue.pop().unwrap().sequence, 1);
        assert_eq!(queue.pop().unwrap().sequence, 2);
        assert_eq!(queue.pop().unwrap().sequence, 3);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_reinserted_order_regains_its_place() {
        let mut queue = OrderQueue::new();
        queue.insert(order(101, 1));
        queue.insert(order(102, 2));

        let first = queue.pop().unwrap();
        queue.insert(order(103, 3));
        queue.insert(first);

        assert_eq!(queue.pop().unwrap().order_id, OrderId::new(101));
    }

    #[test]
    fn test_snapshot_is_sorted_and_limited() {
        let mut queue = OrderQueue::new();
        for seq in [5, 2, 9, 1, 7] {
            queue.insert(order(seq * 10, seq));
        }

        let snapshot = queue.snapshot(3);
        let sequences: Vec<u64> = snapshot.iter().map(|o| o.sequence).collect();
        assert_eq!(sequences, vec![1, 2, 5]);
        assert_eq!(queue.len(), 5);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use types::ids::{OrderId, OwnerId};
    use types::order::OrderRequest;

    proptest! {
        #[test]
        fn prop_pop_order_is_strictly_increasing(
            sequences in proptest::collection::hash_set(1u64..10_000, 0..200),
        ) {
            let mut queue = OrderQueue::new();
            for seq in &sequences {
                queue.insert(
                    OrderRequest::new(OwnerId::from("o"), OrderId::new(*seq)).sequenced(*seq, 0),
                );
            }

            let mut last = 0u64;
            let mut popped = 0usize;
            while let Some(order) = queue.pop() {
                prop_assert!(order.sequence > last);
                last = order.sequence;
                popped += 1;
            }
            prop_assert_eq!(popped, sequences.len());
        }
    }
}
