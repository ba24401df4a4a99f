//! Snapshot building for network transmission

use crate::ws::protocol::{ServerMsg, Snapshot, VoteCounts, VoteSummary};

use super::engine::TurnEngine;
use super::state::{Action, Move};
use super::votes::VoteCollector;

/// Builds client snapshots from the engine and the live vote tally
#[derive(Debug, Clone, Copy)]
pub struct SnapshotBuilder {
    lock_window_ms: u64,
}

impl SnapshotBuilder {
    pub fn new(lock_window_ms: u64) -> Self {
        Self { lock_window_ms }
    }

    pub fn build(&self, engine: &TurnEngine, votes: &VoteCollector, now_ms: u64) -> Snapshot {
        let state = engine.state();
        let terrain = &state.terrain;
        let tally = votes.tally();

        Snapshot {
            map_id: state.map_id.clone(),
            world: terrain.world,
            viewport: state.viewport,
            ship: state.ship.clone(),
            enemy: state.enemy.clone(),
            prev: state.prev,
            blocked: terrain.blocked_tiles().to_vec(),
            hazards: terrain.hazards().to_vec(),
            checkpoints: terrain.checkpoints.clone(),
            last_checkpoint_id: state.last_checkpoint_id.clone(),
            last_checkpoint: state.last_checkpoint.clone(),
            projectiles: state
                .projectiles
                .iter()
                .filter(|p| !p.expired(now_ms))
                .cloned()
                .collect(),
            shot_tiles: state.shot_tiles.clone(),
            mode: state.mode,
            result: state.result,
            turn: state.turn_index + 1,
            phase: engine.phase(now_ms, self.lock_window_ms),
            countdown_ms: engine.ms_left(now_ms),
            server_now_ms: now_ms,
            queued_action: engine.projected_action().and_then(action_label),
            votes: VoteSummary {
                counts_by_action: VoteCounts::from(&tally),
                total_votes: tally.total(),
                unique_voters: votes.unique_voters(),
            },
            last_turn: engine.last_report().cloned(),
        }
    }

    /// Build the broadcast message
    pub fn build_msg(&self, engine: &TurnEngine, votes: &VoteCollector, now_ms: u64) -> ServerMsg {
        ServerMsg::State {
            payload: Box::new(self.build(engine, votes, now_ms)),
        }
    }
}

/// Vote label for an action; `Noop` has none
pub fn action_label(action: Action) -> Option<&'static str> {
    match action {
        Action::Move(Move::F) => Some("FORWARD"),
        Action::Move(Move::L) => Some("LEFT"),
        Action::Move(Move::R) => Some("RIGHT"),
        Action::Shoot => Some("SHOOT"),
        Action::Noop => None,
    }
}
