//! WebSocket protocol message definitions
//! These are the wire types for spectator/voter communication

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::direction::Cell;
use crate::game::engine::{Phase, TurnReport};
use crate::game::state::{
    CheckpointRecord, GameResult, Projectile, SessionMode, Ship, ShotHighlights,
};
use crate::game::votes::{Tally, VoteChoice};
use crate::game::world::{BlockedTile, Checkpoint, Hazard, Viewport, World};

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Cast or replace this voter's choice for the current turn
    Vote {
        /// Voter name (the voter id)
        name: String,
        /// FORWARD, LEFT, RIGHT or SHOOT
        action: String,
    },

    /// Ping for latency measurement
    Ping {
        /// Client timestamp
        t: u64,
    },
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    /// Welcome message after connection
    Welcome {
        connection_id: Uuid,
        server_now_ms: u64,
    },

    /// Full session snapshot (sent on every driver tick)
    State { payload: Box<Snapshot> },

    /// A vote sent over this connection was accepted
    VoteAccepted { action: VoteChoice },

    /// A vote sent over this connection was rejected
    VoteRejected { code: String, message: String },

    /// Error message
    Error { code: String, message: String },

    /// Pong response
    Pong {
        /// Echo back client timestamp
        t: u64,
    },
}

/// Vote weight per action label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct VoteCounts {
    pub forward: u32,
    pub left: u32,
    pub right: u32,
    pub shoot: u32,
}

impl From<&Tally> for VoteCounts {
    fn from(tally: &Tally) -> Self {
        Self {
            forward: tally.get(VoteChoice::Forward),
            left: tally.get(VoteChoice::Left),
            right: tally.get(VoteChoice::Right),
            shoot: tally.get(VoteChoice::Shoot),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteSummary {
    pub counts_by_action: VoteCounts,
    pub total_votes: u32,
    pub unique_voters: usize,
}

/// Everything a renderer needs to draw the current turn
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub map_id: String,
    pub world: World,
    pub viewport: Viewport,
    pub ship: Ship,
    pub enemy: Ship,
    pub prev: Cell,
    pub blocked: Vec<BlockedTile>,
    pub hazards: Vec<Hazard>,
    pub checkpoints: Vec<Checkpoint>,
    pub last_checkpoint_id: Option<String>,
    pub last_checkpoint: Option<CheckpointRecord>,
    pub projectiles: Vec<Projectile>,
    pub shot_tiles: ShotHighlights,
    pub mode: SessionMode,
    pub result: Option<GameResult>,
    /// The turn currently collecting votes
    pub turn: u64,
    pub phase: Phase,
    pub countdown_ms: u64,
    pub server_now_ms: u64,
    /// Label of the action that would resolve now
    pub queued_action: Option<&'static str>,
    pub votes: VoteSummary,
    pub last_turn: Option<TurnReport>,
}
