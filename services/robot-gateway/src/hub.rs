//! Dispatch hub actor
//!
//! Single owner of the session registry and the robot → session index. It
//! consumes the engine's match stream and pushes assignments onto
//! per-session outbound queues, and it translates robot status frames into
//! engine presence updates.
//!
//! The hub never awaits a session write: outbound queues are fed with
//! `try_send`, and a session whose queue is full is disconnected. It does
//! await engine intake capacity, which is safe because the engine never
//! awaits the hub.

use std::collections::HashMap;

use serde::Serialize;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use matching_engine::{EngineHandle, MatchStream};
use types::clock;
use types::dispatch::Match;
use types::errors::HubError;
use types::ids::{RobotId, SessionId};
use types::robot::{ConnectionStatus, PresenceState, RobotPresence};

use crate::config::{HubConfig, StaleMatchPolicy};
use crate::protocol::{Assignment, MonitorEvent, OutboundFrame};

/// Commands accepted by the hub task
#[derive(Debug)]
pub enum HubCommand {
    Register {
        session_id: SessionId,
        outbound: mpsc::Sender<OutboundFrame>,
    },
    Unregister {
        session_id: SessionId,
    },
    Presence {
        session_id: SessionId,
        presence: RobotPresence,
    },
    Snapshot {
        reply: oneshot::Sender<HubSnapshot>,
    },
}

/// Registry entry for one live connection
#[derive(Debug)]
struct SessionEntry {
    robot_id: Option<RobotId>,
    status: ConnectionStatus,
    outbound: mpsc::Sender<OutboundFrame>,
    connected_at: i64,
}

/// Read-only view of one session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionView {
    pub session_id: SessionId,
    pub robot_id: Option<RobotId>,
    pub status: ConnectionStatus,
    /// Whether the robot index points at this session
    pub active: bool,
    pub connected_at: i64,
}

/// Point-in-time view of the hub
#[derive(Debug, Clone, Serialize)]
pub struct HubSnapshot {
    pub sessions: Vec<SessionView>,
    pub bound_robots: usize,
    pub delivered_matches: u64,
    pub stale_matches: u64,
}

impl HubSnapshot {
    /// Session currently serving `robot_id`, if any
    pub fn robot(&self, robot_id: &RobotId) -> Option<&SessionView> {
        self.sessions
            .iter()
            .find(|s| s.active && s.robot_id.as_ref() == Some(robot_id))
    }
}

/// Handle to the hub task, cheap to clone
#[derive(Debug, Clone)]
pub struct HubHandle {
    tx: mpsc::Sender<HubCommand>,
}

impl HubHandle {
    pub async fn register(
        &self,
        session_id: SessionId,
        outbound: mpsc::Sender<OutboundFrame>,
    ) -> Result<(), HubError> {
        self.send(HubCommand::Register {
            session_id,
            outbound,
        })
        .await
    }

    pub async fn unregister(&self, session_id: SessionId) -> Result<(), HubError> {
        self.send(HubCommand::Unregister { session_id }).await
    }

    pub async fn presence(
        &self,
        session_id: SessionId,
        presence: RobotPresence,
    ) -> Result<(), HubError> {
        self.send(HubCommand::Presence {
            session_id,
            presence,
        })
        .await
    }

    pub async fn snapshot(&self) -> Result<HubSnapshot, HubError> {
        let (reply, rx) = oneshot::channel();
        self.send(HubCommand::Snapshot { reply }).await?;
        rx.await.map_err(|_| HubError::Closed)
    }

    async fn send(&self, command: HubCommand) -> Result<(), HubError> {
        self.tx.send(command).await.map_err(|_| HubError::Closed)
    }
}

/// Why an assignment could not be handed to a session
enum DeliveryFailure {
    NoSession,
    Lagging(SessionId),
}

/// Hub state; every method runs on the hub task
pub struct DispatchHub {
    sessions: HashMap<SessionId, SessionEntry>,
    robot_index: HashMap<RobotId, SessionId>,
    engine: EngineHandle,
    stale_policy: StaleMatchPolicy,
    delivered: u64,
    stale: u64,
}

impl DispatchHub {
    pub fn new(engine: EngineHandle, stale_policy: StaleMatchPolicy) -> Self {
        Self {
            sessions: HashMap::new(),
            robot_index: HashMap::new(),
            engine,
            stale_policy,
            delivered: 0,
            stale: 0,
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Session currently indexed for `robot_id`
    pub fn session_for(&self, robot_id: &RobotId) -> Option<SessionId> {
        self.robot_index.get(robot_id).copied()
    }

    pub async fn handle(&mut self, command: HubCommand) {
        match command {
            HubCommand::Register {
                session_id,
                outbound,
            } => self.register(session_id, outbound),
            HubCommand::Unregister { session_id } => self.unregister(session_id).await,
            HubCommand::Presence {
                session_id,
                presence,
            } => {
                if let Err(err) = self.apply_presence(session_id, presence).await {
                    warn!(%session_id, error = %err, "Presence update rejected");
                }
            }
            HubCommand::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
        }
    }

    pub fn register(&mut self, session_id: SessionId, outbound: mpsc::Sender<OutboundFrame>) {
        self.sessions.insert(
            session_id,
            SessionEntry {
                robot_id: None,
                status: ConnectionStatus::Unbound,
                outbound,
                connected_at: clock::now_millis(),
            },
        );
        info!(%session_id, total = self.sessions.len(), "Session registered");
    }

    /// Remove a session; forwards `offline` if it was the robot's live session
    pub async fn unregister(&mut self, session_id: SessionId) {
        let Some(entry) = self.sessions.remove(&session_id) else {
            debug!(%session_id, "Unregister for unknown session ignored");
            return;
        };

        if let Some(robot_id) = entry.robot_id {
            if self.robot_index.get(&robot_id) == Some(&session_id) {
                self.robot_index.remove(&robot_id);
                self.forward(RobotPresence::offline(robot_id.clone())).await;
                self.notify_monitors(MonitorEvent::Presence {
                    robot_id,
                    status: PresenceState::Offline,
                });
            }
        }

        info!(%session_id, total = self.sessions.len(), "Session disconnected");
    }

    pub async fn apply_presence(
        &mut self,
        session_id: SessionId,
        presence: RobotPresence,
    ) -> Result<(), HubError> {
        let entry = self
            .sessions
            .get_mut(&session_id)
            .ok_or(HubError::UnknownSession(session_id))?;
        let robot_id = presence.robot_id.clone();

        match presence.state {
            PresenceState::Online => {
                match entry.robot_id.clone() {
                    Some(bound) if bound != robot_id => {
                        return Err(HubError::IdentityMismatch {
                            bound,
                            requested: robot_id,
                        });
                    }
                    Some(_) => {}
                    None => entry.robot_id = Some(robot_id.clone()),
                }
                entry.status = ConnectionStatus::Online;

                if let Some(previous) = self.robot_index.insert(robot_id.clone(), session_id) {
                    if previous != session_id {
                        warn!(%robot_id, %previous, %session_id, "Robot taken over by newer session");
                    }
                }
                info!(%robot_id, %session_id, "Robot online");
            }
            PresenceState::Offline => {
                let Some(bound) = entry.robot_id.clone() else {
                    debug!(%session_id, %robot_id, "Offline from unbound session ignored");
                    return Ok(());
                };
                if bound != robot_id {
                    return Err(HubError::IdentityMismatch {
                        bound,
                        requested: robot_id,
                    });
                }

                match self.robot_index.get(&robot_id) {
                    Some(owner) if *owner != session_id => {
                        debug!(%robot_id, %session_id, "Offline from superseded session ignored");
                        return Ok(());
                    }
                    Some(_) => {
                        self.robot_index.remove(&robot_id);
                    }
                    None => {}
                }
                entry.status = ConnectionStatus::Offline;
                info!(%robot_id, %session_id, "Robot offline");
            }
        }

        let state = presence.state;
        self.forward(presence).await;
        self.notify_monitors(MonitorEvent::Presence {
            robot_id,
            status: state,
        });
        Ok(())
    }

    /// Deliver one engine match to its robot's session
    pub async fn on_match(&mut self, matched: Match) {
        match self.deliver(&matched) {
            Ok(session_id) => {
                self.delivered += 1;
                info!(
                    order_id = %matched.order_id,
                    robot_id = %matched.robot_id,
                    %session_id,
                    "Assignment delivered"
                );
                self.notify_monitors(MonitorEvent::Match(Assignment::from(&matched)));
            }
            Err(failure) => {
                self.stale += 1;
                let err = HubError::StaleMatch {
                    order_id: matched.order_id,
                    robot_id: matched.robot_id.clone(),
                };
                warn!(error = %err, policy = ?self.stale_policy, "Undeliverable match");

                if let DeliveryFailure::Lagging(session_id) = failure {
                    self.unregister(session_id).await;
                }
                self.handle_stale(matched).await;
            }
        }
    }

    fn deliver(&mut self, matched: &Match) -> Result<SessionId, DeliveryFailure> {
        let session_id = self
            .robot_index
            .get(&matched.robot_id)
            .copied()
            .ok_or(DeliveryFailure::NoSession)?;
        let entry = self
            .sessions
            .get_mut(&session_id)
            .ok_or(DeliveryFailure::NoSession)?;

        entry.status = ConnectionStatus::Delivery;
        match entry
            .outbound
            .try_send(OutboundFrame::Assignment(Assignment::from(matched)))
        {
            Ok(()) => Ok(session_id),
            Err(TrySendError::Full(_)) => {
                warn!(%session_id, "Outbound queue full, disconnecting session");
                Err(DeliveryFailure::Lagging(session_id))
            }
            Err(TrySendError::Closed(_)) => Err(DeliveryFailure::Lagging(session_id)),
        }
    }

    async fn handle_stale(&mut self, matched: Match) {
        match self.stale_policy {
            StaleMatchPolicy::Requeue => {
                let order_id = matched.order_id;
                if let Err(err) = self.engine.requeue_order(matched.into_order()).await {
                    warn!(%order_id, error = %err, "Could not requeue order");
                }
            }
            StaleMatchPolicy::Drop => {
                debug!(order_id = %matched.order_id, "Stale match dropped");
            }
        }
    }

    async fn forward(&self, presence: RobotPresence) {
        let robot_id = presence.robot_id.clone();
        if let Err(err) = self
            .engine
            .submit_robot_presence(presence.robot_id, presence.state)
            .await
        {
            warn!(%robot_id, error = %err, "Presence not forwarded");
        }
    }

    /// Fan an event out to unbound sessions; full queues are disconnected
    fn notify_monitors(&mut self, event: MonitorEvent) {
        let mut lagging = Vec::new();
        for (session_id, entry) in &self.sessions {
            if entry.status.is_bound() {
                continue;
            }
            if entry
                .outbound
                .try_send(OutboundFrame::Event(event.clone()))
                .is_err()
            {
                lagging.push(*session_id);
            }
        }

        for session_id in lagging {
            warn!(%session_id, "Monitor lagging, disconnecting session");
            // Monitors are unbound, so this never forwards presence or recurses
            self.sessions.remove(&session_id);
        }
    }

    pub fn snapshot(&self) -> HubSnapshot {
        let mut sessions: Vec<SessionView> = self
            .sessions
            .iter()
            .map(|(session_id, entry)| SessionView {
                session_id: *session_id,
                robot_id: entry.robot_id.clone(),
                status: entry.status,
                active: entry
                    .robot_id
                    .as_ref()
                    .is_some_and(|r| self.robot_index.get(r) == Some(session_id)),
                connected_at: entry.connected_at,
            })
            .collect();
        sessions.sort_by_key(|s| s.session_id);

        HubSnapshot {
            sessions,
            bound_robots: self.robot_index.len(),
            delivered_matches: self.delivered,
            stale_matches: self.stale,
        }
    }
}

/// The hub task: owns the hub state, the command receiver and the matches
pub struct HubService {
    hub: DispatchHub,
    commands: mpsc::Receiver<HubCommand>,
    matches: MatchStream,
}

impl HubService {
    pub fn new(engine: EngineHandle, matches: MatchStream, config: HubConfig) -> (Self, HubHandle) {
        let (tx, commands) = mpsc::channel(config.command_capacity);
        let service = Self {
            hub: DispatchHub::new(engine, config.stale_match_policy),
            commands,
            matches,
        };
        (service, HubHandle { tx })
    }

    /// Run until every handle is dropped
    pub async fn run(mut self) {
        info!(policy = ?self.hub.stale_policy, "Dispatch hub started");
        let mut matches_open = true;

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.hub.handle(command).await,
                    None => break,
                },
                matched = self.matches.recv(), if matches_open => match matched {
                    Some(matched) => self.hub.on_match(matched).await,
                    None => {
                        warn!("Match stream closed");
                        matches_open = false;
                    }
                },
            }
        }

        info!(sessions = self.hub.session_count(), "Dispatch hub stopped");
    }
}

/// Start the hub on the current runtime
pub fn spawn(
    engine: EngineHandle,
    matches: MatchStream,
    config: HubConfig,
) -> (HubHandle, JoinHandle<()>) {
    let (service, handle) = HubService::new(engine, matches, config);
    let task = tokio::spawn(service.run());
    (handle, task)
}
