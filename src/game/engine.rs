//! Turn engine - wall-clock scheduling and the authoritative per-turn sequence

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::maps::MapDef;

use super::combat::{resolve_hits, resolve_shoot, ShotOutcome};
use super::movement::{resolve_move, MoveOutcome};
use super::opponent::OpponentPolicy;
use super::state::{
    Action, CheckpointRecord, GameResult, GameState, SessionMode, ShipId, ShipStats,
};
use super::votes::VoteCollector;

/// Client-facing voting phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Voting,
    Locked,
    Resolving,
}

/// What one ship's action did this turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionOutcome {
    Move(MoveOutcome),
    Shoot(ShotOutcome),
    Noop,
}

/// Memory of the last resolved turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnReport {
    pub turn: u64,
    pub player_action: Action,
    pub player: ActionOutcome,
    pub opponent_action: Option<Action>,
    pub opponent: Option<ActionOutcome>,
}

#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    pub turn_ms: u64,
    /// How long a result stays on screen before the session returns to start
    pub result_reset_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            turn_ms: 2000,
            result_reset_ms: 2000,
        }
    }
}

/// Owns the session state and resolves exactly one action per turn
pub struct TurnEngine {
    state: GameState,
    map: MapDef,
    config: EngineConfig,
    next_tick_at: u64,
    votes: Option<Arc<VoteCollector>>,
    opponent: Box<dyn OpponentPolicy>,
    last_report: Option<TurnReport>,
}

impl TurnEngine {
    pub fn new(
        map: MapDef,
        config: EngineConfig,
        votes: Option<Arc<VoteCollector>>,
        mut opponent: Box<dyn OpponentPolicy>,
        now_ms: u64,
    ) -> Self {
        let config = EngineConfig {
            turn_ms: config.turn_ms.max(1),
            ..config
        };
        opponent.reseed(map.seed);
        Self {
            state: map.initial_state(),
            map,
            config,
            next_tick_at: now_ms + config.turn_ms,
            votes,
            opponent,
            last_report: None,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn map(&self) -> &MapDef {
        &self.map
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    pub fn last_report(&self) -> Option<&TurnReport> {
        self.last_report.as_ref()
    }

    pub fn next_tick_at(&self) -> u64 {
        self.next_tick_at
    }

    pub fn opponent_name(&self) -> &'static str {
        self.opponent.name()
    }

    /// Direct command; overrides the vote for the next resolved turn
    pub fn queue_action(&mut self, action: Action) {
        self.state.queued_action = Some(action);
    }

    /// Fully reset state and schedule onto `map`
    pub fn load_map(&mut self, map: MapDef, now_ms: u64) {
        info!(map_id = %map.id, "Loading map");
        self.opponent.reseed(map.seed);
        self.state = map.initial_state();
        self.map = map;
        self.next_tick_at = now_ms + self.config.turn_ms;
        self.last_report = None;
        if let Some(votes) = &self.votes {
            votes.reset();
        }
    }

    /// Reload the current map and return to `Start`
    pub fn reset(&mut self, now_ms: u64) {
        let map = self.map.clone();
        self.load_map(map, now_ms);
    }

    /// `Start -> Playing`; the first turn resolves one full interval from now
    pub fn start(&mut self, now_ms: u64) -> bool {
        if self.state.mode != SessionMode::Start {
            return false;
        }
        self.state.mode = SessionMode::Playing;
        self.next_tick_at = now_ms + self.config.turn_ms;
        info!(map_id = %self.state.map_id, "Session started");
        true
    }

    /// Milliseconds until the next turn resolves
    pub fn ms_left(&self, now_ms: u64) -> u64 {
        self.next_tick_at.saturating_sub(now_ms)
    }

    pub fn phase(&self, now_ms: u64, lock_window_ms: u64) -> Phase {
        if self.state.result.is_some() {
            Phase::Resolving
        } else if self.ms_left(now_ms) <= lock_window_ms {
            Phase::Locked
        } else {
            Phase::Voting
        }
    }

    /// The action that would resolve if the turn ended now
    pub fn projected_action(&self) -> Option<Action> {
        self.state.queued_action.or_else(|| {
            self.votes
                .as_ref()
                .and_then(|v| v.resolve_winner())
                .map(|choice| choice.to_action())
        })
    }

    /// Drive the engine. Resolves at most one turn per call; returns true if it did.
    pub fn update(&mut self, now_ms: u64) -> bool {
        self.state.prune_projectiles(now_ms);

        match self.state.mode {
            SessionMode::Start => return false,
            SessionMode::ResultSet => {
                let shown_for = self
                    .state
                    .result_at
                    .map(|at| now_ms.saturating_sub(at))
                    .unwrap_or(u64::MAX);
                if shown_for >= self.config.result_reset_ms {
                    self.reset(now_ms);
                }
                return false;
            }
            SessionMode::Playing => {}
        }

        if now_ms < self.next_tick_at {
            return false;
        }

        // catch up to within one interval, never replaying missed turns
        let overdue = now_ms - self.next_tick_at;
        self.next_tick_at += (overdue / self.config.turn_ms + 1) * self.config.turn_ms;

        self.resolve_turn(now_ms);
        true
    }

    fn resolve_turn(&mut self, now_ms: u64) {
        // read-and-clear in one step so every vote lands in exactly one turn
        let winner = self.votes.as_ref().and_then(|v| v.take_winner());
        let player_action = self
            .state
            .queued_action
            .take()
            .or_else(|| winner.map(|choice| choice.to_action()))
            .unwrap_or(Action::Noop);

        self.state.turn_index += 1;
        let turn = self.state.turn_index;

        let player = self.resolve_action(ShipId::Player, player_action, now_ms);
        self.check_result(now_ms);

        let (opponent_action, opponent) = if self.state.result.is_none() {
            let action = self.opponent.choose(&self.state);
            let outcome = self.resolve_action(ShipId::Opponent, action, now_ms);
            self.check_result(now_ms);
            (Some(action), Some(outcome))
        } else {
            (None, None)
        };

        let world = self.state.terrain.world;
        self.state.viewport = self.state.viewport.focus(&world, self.state.ship.cell());

        debug!(
            turn,
            ?player_action,
            ?opponent_action,
            ship_hp = self.state.ship.hp,
            enemy_hp = self.state.enemy.hp,
            "Turn resolved"
        );

        self.last_report = Some(TurnReport {
            turn,
            player_action,
            player,
            opponent_action,
            opponent,
        });
    }

    fn resolve_action(&mut self, actor: ShipId, action: Action, now_ms: u64) -> ActionOutcome {
        match action {
            Action::Move(mv) => {
                let (next, outcome) = resolve_move(&self.state, actor, mv, now_ms);
                self.state = next;
                if outcome.moved {
                    self.apply_hazard(actor, now_ms);
                }
                if actor == ShipId::Player {
                    self.capture_checkpoint();
                }
                ActionOutcome::Move(outcome)
            }
            Action::Shoot => {
                let (next, mut outcome) = resolve_shoot(&self.state, actor, now_ms);
                self.state = next;
                if outcome.shot {
                    let (next, hit) = resolve_hits(&self.state, actor, now_ms);
                    self.state = next;
                    outcome.hit = hit;
                }
                ActionOutcome::Shoot(outcome)
            }
            Action::Noop => {
                if actor == ShipId::Player {
                    self.state.prev = self.state.ship.cell();
                }
                ActionOutcome::Noop
            }
        }
    }

    fn apply_hazard(&mut self, actor: ShipId, now_ms: u64) {
        let cell = self.state.ship(actor).cell();
        let damage = self.state.terrain.hazard_damage(cell);
        if damage > 0 {
            self.state.ship_mut(actor).take_damage(damage, now_ms);
            debug!(?actor, x = cell.x, y = cell.y, damage, "Hazard damage");
        }
    }

    fn capture_checkpoint(&mut self) {
        let cell = self.state.ship.cell();
        let Some(checkpoint) = self
            .state
            .terrain
            .checkpoints
            .iter()
            .find(|cp| cp.contains(cell))
            .cloned()
        else {
            return;
        };

        if self.state.last_checkpoint_id.as_deref() == Some(checkpoint.id.as_str()) {
            return;
        }

        info!(checkpoint = %checkpoint.id, turn = self.state.turn_index, "Checkpoint captured");
        self.state.last_checkpoint = Some(CheckpointRecord {
            checkpoint_id: checkpoint.id.clone(),
            turn_index: self.state.turn_index,
            ship_stats: ShipStats::from(&self.state.ship),
            enemy_stats: Some(ShipStats::from(&self.state.enemy)),
        });
        self.state.last_checkpoint_id = Some(checkpoint.id);
    }

    /// Record the first terminal result; later calls never overwrite it
    fn check_result(&mut self, now_ms: u64) {
        if self.state.result.is_some() {
            return;
        }
        let result = if self.state.enemy.is_sunk() {
            GameResult::Win
        } else if self.state.ship.is_sunk() {
            GameResult::Loss
        } else {
            return;
        };

        self.state.result = Some(result);
        self.state.result_at = Some(now_ms);
        self.state.mode = SessionMode::ResultSet;
        info!(?result, turn = self.state.turn_index, "Result set");
    }
}
