//! WebSocket wire protocol
//!
//! Inbound frames are decoded once into [`InboundFrame`], a closed set of
//! variants each carrying its own typed payload. Outbound frames are
//! either the bare assignment sent to a matched robot or a tagged event
//! for monitoring clients.
//!
//! ```text
//! robot → hub   {"type":"update","payload":{"robot_id":"r1","status":"online"}}
//! hub → robot   {"robot_id":"r1","order_id":101}
//! hub → monitor {"type":"match","payload":{"robot_id":"r1","order_id":101}}
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;
use types::dispatch::Match;
use types::ids::{OrderId, RobotId};
use types::robot::{PresenceState, RobotPresence};

/// Frame received from a session
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum InboundFrame {
    /// Robot status change
    Update(RobotUpdate),
}

/// Payload of an `update` frame
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RobotUpdate {
    pub robot_id: RobotId,
    pub status: RobotStatus,
}

/// Status values a robot may report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RobotStatus {
    Online,
    Offline,
    /// Robot is powering down; handled like offline
    Shutdown,
}

impl RobotStatus {
    pub fn presence_state(&self) -> PresenceState {
        match self {
            RobotStatus::Online => PresenceState::Online,
            RobotStatus::Offline | RobotStatus::Shutdown => PresenceState::Offline,
        }
    }
}

impl RobotUpdate {
    pub fn into_presence(self) -> RobotPresence {
        RobotPresence {
            state: self.status.presence_state(),
            robot_id: self.robot_id,
        }
    }
}

/// Wire decoding errors
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("Malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Frame carries a blank robot id")]
    BlankRobotId,
}

/// Decode a text frame
pub fn decode_frame(text: &str) -> Result<InboundFrame, FrameError> {
    let frame: InboundFrame = serde_json::from_str(text)?;
    match &frame {
        InboundFrame::Update(update) if update.robot_id.as_str().trim().is_empty() => {
            Err(FrameError::BlankRobotId)
        }
        _ => Ok(frame),
    }
}

/// Assignment pushed to the matched robot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub robot_id: RobotId,
    pub order_id: OrderId,
}

impl From<&Match> for Assignment {
    fn from(matched: &Match) -> Self {
        Self {
            robot_id: matched.robot_id.clone(),
            order_id: matched.order_id,
        }
    }
}

/// Event fanned out to monitoring sessions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum MonitorEvent {
    /// An assignment was delivered to a robot
    Match(Assignment),
    /// A robot joined or left the pool
    Presence {
        robot_id: RobotId,
        status: PresenceState,
    },
}

/// Anything queued on a session's outbound path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    Assignment(Assignment),
    Event(MonitorEvent),
}

impl OutboundFrame {
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        match self {
            OutboundFrame::Assignment(assignment) => serde_json::to_string(assignment),
            OutboundFrame::Event(event) => serde_json::to_string(event),
        }
    }
}
