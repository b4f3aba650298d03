//! Matching engine actor
//!
//! A single task owns the [`MatchingEngine`] and processes, one at a time:
//! order intake, robot presence intake, status queries and the match tick.
//! Callers hold an [`EngineHandle`]; the match consumer holds the
//! [`MatchStream`].
//!
//! The tick reserves room on the match channel before popping anything, so
//! a backlogged consumer defers matching instead of stalling the loop or
//! losing a pairing.

use tokio::sync::mpsc::error::{TryRecvError, TrySendError};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use types::clock;
use types::dispatch::Match;
use types::errors::EngineError;
use types::ids::{OrderId, OwnerId, RobotId};
use types::order::{Order, OrderRequest};
use types::robot::{PresenceState, RobotPresence};

use crate::config::EngineConfig;
use crate::engine::{MatchingEngine, PresenceOutcome};
use crate::events::{EngineQuery, EngineSnapshot, OrderIntake};

/// Submission side of the engine, cheap to clone
#[derive(Debug, Clone)]
pub struct EngineHandle {
    order_tx: mpsc::Sender<OrderIntake>,
    presence_tx: mpsc::Sender<RobotPresence>,
    query_tx: mpsc::Sender<EngineQuery>,
}

impl EngineHandle {
    /// Hand a persisted order to the engine
    ///
    /// Waits while the intake queue is full.
    pub async fn submit_order(&self, owner_id: OwnerId, order_id: OrderId) -> Result<(), EngineError> {
        self.order_tx
            .send(OrderIntake::New(OrderRequest::new(owner_id, order_id)))
            .await
            .map_err(|_| EngineError::Closed)
    }

    /// Report a robot presence change
    ///
    /// Waits while the intake queue is full.
    pub async fn submit_robot_presence(
        &self,
        robot_id: RobotId,
        state: PresenceState,
    ) -> Result<(), EngineError> {
        self.presence_tx
            .send(RobotPresence { robot_id, state })
            .await
            .map_err(|_| EngineError::Closed)
    }

    /// Return an order whose match could not be delivered
    pub async fn requeue_order(&self, order: Order) -> Result<(), EngineError> {
        self.order_tx
            .send(OrderIntake::Requeue(order))
            .await
            .map_err(|_| EngineError::Closed)
    }

    pub async fn snapshot(&self) -> Result<EngineSnapshot, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.query_tx
            .send(EngineQuery::Snapshot(reply_tx))
            .await
            .map_err(|_| EngineError::Closed)?;
        reply_rx.await.map_err(|_| EngineError::Closed)
    }

    pub fn is_closed(&self) -> bool {
        self.order_tx.is_closed()
    }
}

/// Ordered, non-restartable sequence of matches
///
/// Must be drained; while it is full the engine defers new pairings.
#[derive(Debug)]
pub struct MatchStream {
    rx: mpsc::Receiver<Match>,
}

impl MatchStream {
    /// Next match, or `None` once the engine has stopped
    pub async fn recv(&mut self) -> Option<Match> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Result<Match, TryRecvError> {
        self.rx.try_recv()
    }
}

/// The engine task: owns the queues and every receiving end
pub struct EngineService {
    engine: MatchingEngine,
    config: EngineConfig,
    order_rx: mpsc::Receiver<OrderIntake>,
    presence_rx: mpsc::Receiver<RobotPresence>,
    query_rx: mpsc::Receiver<EngineQuery>,
    match_tx: mpsc::Sender<Match>,
}

impl EngineService {
    pub fn new(config: EngineConfig) -> (Self, EngineHandle, MatchStream) {
        let (order_tx, order_rx) = mpsc::channel(config.order_intake_capacity);
        let (presence_tx, presence_rx) = mpsc::channel(config.presence_intake_capacity);
        let (query_tx, query_rx) = mpsc::channel(config.query_capacity);
        let (match_tx, match_rx) = mpsc::channel(config.match_output_capacity);

        let service = Self {
            engine: MatchingEngine::new(config.tick_policy),
            config,
            order_rx,
            presence_rx,
            query_rx,
            match_tx,
        };
        let handle = EngineHandle {
            order_tx,
            presence_tx,
            query_tx,
        };
        (service, handle, MatchStream { rx: match_rx })
    }

    /// Run until every handle is dropped or the match consumer goes away
    pub async fn run(mut self) {
        let period = self.config.tick_interval;
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            tick_ms = period.as_millis() as u64,
            tick_policy = ?self.config.tick_policy,
            "Matching engine started"
        );

        let mut orders_open = true;
        let mut presence_open = true;

        loop {
            tokio::select! {
                biased;

                _ = ticker.tick() => {
                    if !self.on_tick() {
                        break;
                    }
                }
                intake = self.order_rx.recv(), if orders_open => match intake {
                    Some(OrderIntake::New(request)) => self.on_order(request),
                    Some(OrderIntake::Requeue(order)) => self.on_requeue(order),
                    None => orders_open = false,
                },
                presence = self.presence_rx.recv(), if presence_open => match presence {
                    Some(presence) => self.on_presence(presence),
                    None => presence_open = false,
                },
                Some(query) = self.query_rx.recv() => self.on_query(query),
            }

            if !orders_open && !presence_open {
                info!("Engine intake closed");
                break;
            }
        }

        info!(
            pending_orders = self.engine.pending_orders(),
            available_robots = self.engine.available_robots(),
            "Matching engine stopped"
        );
    }

    fn on_order(&mut self, request: OrderRequest) {
        let order_id = request.order_id;
        match self.engine.accept_order(request, clock::now_millis()) {
            Ok(sequence) => {
                debug!(%order_id, sequence, pending = self.engine.pending_orders(), "Order queued")
            }
            Err(err) => warn!(%order_id, error = %err, "Order submission ignored"),
        }
    }

    fn on_requeue(&mut self, order: Order) {
        let order_id = order.order_id;
        let sequence = order.sequence;
        match self.engine.requeue_order(order) {
            Ok(()) => info!(%order_id, sequence, "Order returned to queue"),
            Err(err) => warn!(%order_id, sequence, error = %err, "Requeue ignored"),
        }
    }

    fn on_presence(&mut self, presence: RobotPresence) {
        let robot_id = presence.robot_id.clone();
        let state = presence.state;
        match self.engine.apply_presence(presence) {
            Ok(PresenceOutcome::ReleasedWhileAssigned) => {
                debug!(%robot_id, "Assigned robot went offline")
            }
            Ok(outcome) => {
                debug!(%robot_id, ?outcome, available = self.engine.available_robots(), "Presence applied")
            }
            Err(err) => warn!(%robot_id, %state, error = %err, "Presence update dropped"),
        }
    }

    fn on_query(&mut self, query: EngineQuery) {
        match query {
            EngineQuery::Snapshot(reply) => {
                // The asker may have given up; nothing to do then
                let _ = reply.send(self.engine.snapshot(clock::now_millis()));
            }
        }
    }

    /// Emit up to the policy's limit of matches. Returns false once the
    /// consumer is gone.
    fn on_tick(&mut self) -> bool {
        if self.match_tx.is_closed() {
            warn!("Match consumer dropped");
            return false;
        }

        let limit = self.engine.tick_policy().limit();
        let mut emitted = 0usize;

        while emitted < limit && self.engine.has_pair() {
            let permit = match self.match_tx.try_reserve() {
                Ok(permit) => permit,
                Err(TrySendError::Full(())) => {
                    debug!(
                        pending_orders = self.engine.pending_orders(),
                        "Match consumer backlogged, deferring"
                    );
                    break;
                }
                Err(TrySendError::Closed(())) => {
                    warn!("Match consumer dropped");
                    return false;
                }
            };

            let Some(matched) = self.engine.match_one(clock::now_millis()) else {
                break;
            };
            info!(
                order_id = %matched.order_id,
                robot_id = %matched.robot_id,
                sequence = matched.sequence,
                "Match created"
            );
            permit.send(matched);
            emitted += 1;
        }

        true
    }
}

/// Start the engine on the current runtime
pub fn spawn(config: EngineConfig) -> (EngineHandle, MatchStream, JoinHandle<()>) {
    let (service, handle, matches) = EngineService::new(config);
    let task = tokio::spawn(service.run());
    (handle, matches, task)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config() -> EngineConfig {
        EngineConfig::default()
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_order_is_sequenced() {
        let (handle, _matches, _task) = spawn(config());

        for id in 0..5 {
            handle.submit_order(OwnerId::from("o"), OrderId::new(id)).await.unwrap();
        }

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.pending_orders, 5);
        assert_eq!(snapshot.next_sequence, 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_presence_online_then_offline() {
        let (handle, _matches, _task) = spawn(config());

        handle
            .submit_robot_presence(RobotId::from("robot-test"), PresenceState::Online)
            .await
            .unwrap();
        assert_eq!(handle.snapshot().await.unwrap().available_robots.len(), 1);

        handle
            .submit_robot_presence(RobotId::from("robot-test"), PresenceState::Offline)
            .await
            .unwrap();
        assert!(handle.snapshot().await.unwrap().available_robots.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_match_emitted_on_tick() {
        let (handle, mut matches, _task) = spawn(config());

        handle.submit_order(OwnerId::from("o"), OrderId::new(111)).await.unwrap();
        handle
            .submit_robot_presence(RobotId::from("robot-222"), PresenceState::Online)
            .await
            .unwrap();

        let matched = time::timeout(Duration::from_secs(2), matches.recv())
            .await
            .expect("match within two ticks")
            .unwrap();
        assert_eq!(matched.order_id, OrderId::new(111));
        assert_eq!(matched.robot_id, RobotId::from("robot-222"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_match_before_first_interval() {
        let (handle, mut matches, _task) = spawn(config());

        handle.submit_order(OwnerId::from("o"), OrderId::new(1)).await.unwrap();
        handle
            .submit_robot_presence(RobotId::from("r1"), PresenceState::Online)
            .await
            .unwrap();
        handle.snapshot().await.unwrap();

        assert!(matches.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_engine_stops_when_handles_dropped() {
        let (handle, mut matches, task) = spawn(config());
        drop(handle);

        task.await.unwrap();
        assert!(matches.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_engine_stops_when_consumer_dropped() {
        let (handle, matches, task) = spawn(config());
        drop(matches);

        time::timeout(Duration::from_secs(5), task)
            .await
            .expect("engine exits on the next tick")
            .unwrap();
        assert!(handle.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_submission_queued_once() {
        let (handle, _matches, _task) = spawn(config());

        handle.submit_order(OwnerId::from("o"), OrderId::new(42)).await.unwrap();
        handle.submit_order(OwnerId::from("o"), OrderId::new(42)).await.unwrap();

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.pending_orders, 1);
        assert_eq!(snapshot.next_sequence, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_engine_stops_when_consumer_dropped() {
        let (handle, matches, task) = spawn(config());
        drop(matches);

        handle.submit_order(OwnerId::from("o"), OrderId::new(1)).await.unwrap();
        handle
            .submit_robot_presence(RobotId::from("r1"), PresenceState::Online)
            .await
            .unwrap();

        time::timeout(Duration::from_secs(5), task)
            .await
            .expect("engine exits")
            .unwrap();
        assert!(handle.is_closed());
        assert_eq!(
            handle.submit_order(OwnerId::from("o"), OrderId::new(2)).await,
            Err(EngineError::Closed)
        );
    }
}
