//! Application state shared across routes, sockets and the driver

use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info};
use uuid::Uuid;

use crate::chat::{self, ChatMessage};
use crate::config::Config;
use crate::game::engine::{EngineConfig, Phase, TurnEngine};
use crate::game::opponent::policy_from_name;
use crate::game::snapshot::SnapshotBuilder;
use crate::game::state::SessionMode;
use crate::game::votes::{VoteChoice, VoteCollector};
use crate::maps::{MapCatalog, MapError};
use crate::util::rate_limit::VoteRateLimiter;
use crate::util::time::monotonic_millis;
use crate::ws::protocol::{ServerMsg, Snapshot};

/// Snapshot fan-out buffer; slow sockets skip ahead on lag
const SNAPSHOT_CHANNEL_CAPACITY: usize = 64;

/// Why a vote was refused
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VoteError {
    #[error("name and action are required")]
    Missing,

    #[error("invalid action: {0}")]
    InvalidAction(String),

    #[error("voting is closed for this turn")]
    NotVoting,

    #[error("too many votes, slow down")]
    RateLimited,
}

impl VoteError {
    pub fn code(&self) -> &'static str {
        match self {
            VoteError::Missing => "missing_fields",
            VoteError::InvalidAction(_) => "invalid_action",
            VoteError::NotVoting => "not_voting",
            VoteError::RateLimited => "rate_limited",
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub engine: Arc<Mutex<TurnEngine>>,
    pub votes: Arc<VoteCollector>,
    pub maps: Arc<MapCatalog>,
    pub snapshots: SnapshotBuilder,
    pub snapshot_tx: broadcast::Sender<ServerMsg>,
    pub vote_limiter: VoteRateLimiter,
    /// Open WebSocket sessions, with their connect time
    pub spectators: Arc<DashMap<Uuid, u64>>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, MapError> {
        let config = Arc::new(config);

        // Built-in maps, plus any authored ones
        let mut maps = MapCatalog::builtin();
        if let Some(path) = &config.maps_file {
            maps.extend_from_file(path)?;
        }
        let map = maps.get(&config.default_map)?.clone();

        let votes = Arc::new(VoteCollector::new());
        let opponent = policy_from_name(&config.opponent, config.opponent_seed);
        let engine = TurnEngine::new(
            map,
            EngineConfig {
                turn_ms: config.turn_ms,
                result_reset_ms: config.result_reset_ms,
            },
            Some(votes.clone()),
            opponent,
            monotonic_millis(),
        );
        info!(
            map_id = %config.default_map,
            opponent = engine.opponent_name(),
            maps = maps.list().len(),
            "Session ready"
        );

        let (snapshot_tx, _) = broadcast::channel(SNAPSHOT_CHANNEL_CAPACITY);

        Ok(Self {
            snapshots: SnapshotBuilder::new(config.lock_window_ms),
            vote_limiter: VoteRateLimiter::new(config.vote_rate_limit),
            engine: Arc::new(Mutex::new(engine)),
            votes,
            maps: Arc::new(maps),
            snapshot_tx,
            spectators: Arc::new(DashMap::new()),
            config,
        })
    }

    /// Session clock
    pub fn now_ms(&self) -> u64 {
        monotonic_millis()
    }

    pub fn snapshot(&self) -> Snapshot {
        let engine = self.engine.lock();
        self.snapshots.build(&engine, &self.votes, self.now_ms())
    }

    pub fn broadcast_snapshot(&self) {
        let msg = {
            let engine = self.engine.lock();
            self.snapshots.build_msg(&engine, &self.votes, self.now_ms())
        };
        // no receivers is fine
        let _ = self.snapshot_tx.send(msg);
    }

    /// One driver step: auto-start, advance the clock, broadcast.
    /// Returns true if a turn resolved.
    pub fn tick(&self) -> bool {
        let now = self.now_ms();
        let (resolved, msg) = {
            let mut engine = self.engine.lock();
            if self.config.auto_start && engine.state().mode == SessionMode::Start {
                engine.start(now);
            }
            let resolved = engine.update(now);
            (resolved, self.snapshots.build_msg(&engine, &self.votes, now))
        };

        if resolved {
            self.vote_limiter.prune();
        }
        let _ = self.snapshot_tx.send(msg);
        resolved
    }

    /// Validate and record a crowd vote, then push a fresh snapshot
    pub fn cast_vote(&self, name: &str, action: &str) -> Result<VoteChoice, VoteError> {
        let name = name.trim();
        if name.is_empty() || action.trim().is_empty() {
            return Err(VoteError::Missing);
        }
        let choice = VoteChoice::from_label(action)
            .ok_or_else(|| VoteError::InvalidAction(action.to_string()))?;

        {
            // held across the insert so a turn cannot resolve in between
            let engine = self.engine.lock();
            if !self.voting_open(&engine) {
                return Err(VoteError::NotVoting);
            }
            if !self.vote_limiter.check(name) {
                return Err(VoteError::RateLimited);
            }
            if !self.votes.add_vote(name, choice, 1) {
                return Err(VoteError::InvalidAction(action.to_string()));
            }
        }

        debug!(voter = %name, ?choice, "Vote accepted");
        self.broadcast_snapshot();
        Ok(choice)
    }

    /// Feed one chat message into the vote pool. Outside the voting window
    /// the message is dropped like any other vote.
    pub fn ingest_chat(&self, message: &ChatMessage) -> Option<VoteChoice> {
        let choice = {
            let engine = self.engine.lock();
            if !self.voting_open(&engine) {
                return None;
            }
            chat::ingest(&self.votes, message)?
        };
        self.broadcast_snapshot();
        Some(choice)
    }

    fn voting_open(&self, engine: &TurnEngine) -> bool {
        engine.state().mode == SessionMode::Playing
            && engine.phase(self.now_ms(), self.config.lock_window_ms) == Phase::Voting
    }

    /// Direct command that overrides the crowd for the next turn
    pub fn queue_action(&self, choice: VoteChoice) {
        self.engine.lock().queue_action(choice.to_action());
        info!(?choice, "Direct action queued");
        self.broadcast_snapshot();
    }

    pub fn start(&self) -> bool {
        let started = self.engine.lock().start(self.now_ms());
        self.broadcast_snapshot();
        started
    }

    pub fn reset(&self) {
        self.engine.lock().reset(self.now_ms());
        self.broadcast_snapshot();
    }

    pub fn load_map(&self, map_id: &str) -> Result<(), MapError> {
        let map = self.maps.get(map_id)?.clone();
        self.engine.lock().load_map(map, self.now_ms());
        self.broadcast_snapshot();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> AppState {
        AppState::new(Config {
            opponent: "idle".to_string(),
            ..Config::default()
        })
        .unwrap()
    }

    #[test]
    fn test_unknown_default_map_fails() {
        let result = AppState::new(Config {
            default_map: "atlantis".to_string(),
            ..Config::default()
        });
        assert!(matches!(result, Err(MapError::UnknownMap(_))));
    }

    #[test]
    fn test_votes_need_a_running_session() {
        let state = state();
        assert_eq!(state.cast_vote("alice", "LEFT"), Err(VoteError::NotVoting));
        assert!(state.start());
        assert_eq!(state.cast_vote("alice", "LEFT"), Ok(VoteChoice::Left));
        assert_eq!(state.votes.unique_voters(), 1);
    }

    #[test]
    fn test_chat_votes_need_a_running_session() {
        let state = state();
        let message = ChatMessage {
            channel_id: Some("UC1".to_string()),
            display_name: Some("Ann".to_string()),
            text: "shoot".to_string(),
        };
        assert_eq!(state.ingest_chat(&message), None);
        assert_eq!(state.votes.unique_voters(), 0);

        assert!(state.start());
        assert_eq!(state.ingest_chat(&message), Some(VoteChoice::Shoot));
        assert_eq!(state.votes.unique_voters(), 1);

        state.reset();
        assert_eq!(state.votes.unique_voters(), 0);
        assert_eq!(state.ingest_chat(&message), None);
        assert_eq!(state.votes.unique_voters(), 0);
    }

    #[test]
    fn test_vote_validation() {
        let state = state();
        state.start();
        assert_eq!(state.cast_vote("  ", "LEFT"), Err(VoteError::Missing));
        assert_eq!(state.cast_vote("alice", ""), Err(VoteError::Missing));
        assert_eq!(
            state.cast_vote("alice", "JUMP"),
            Err(VoteError::InvalidAction("JUMP".to_string()))
        );
    }

    #[test]
    fn test_vote_rate_limit() {
        let state = AppState::new(Config {
            vote_rate_limit: 1,
            ..Config::default()
        })
        .unwrap();
        state.start();
        assert!(state.cast_vote("alice", "F").is_ok());
        assert_eq!(state.cast_vote("alice", "R"), Err(VoteError::RateLimited));
        assert!(state.cast_vote("bob", "R").is_ok());
    }

    #[test]
    fn test_accepted_vote_is_broadcast() {
        let state = state();
        let mut rx = state.snapshot_tx.subscribe();
        state.start();
        state.cast_vote("alice", "SHOOT").unwrap();

        let mut last = None;
        while let Ok(msg) = rx.try_recv() {
            last = Some(msg);
        }
        match last {
            Some(ServerMsg::State { payload }) => {
                assert_eq!(payload.votes.counts_by_action.shoot, 1);
                assert_eq!(payload.queued_action, Some("SHOOT"));
            }
            other => panic!("expected a state message, got {other:?}"),
        }
    }

    #[test]
    fn test_tick_auto_starts() {
        let state = state();
        assert!(!state.tick());
        assert_eq!(state.engine.lock().state().mode, SessionMode::Playing);
    }

    #[test]
    fn test_load_map_switches_session() {
        let state = state();
        state.load_map("grand-world").unwrap();
        assert_eq!(state.snapshot().map_id, "grand-world");
        assert!(matches!(state.load_map("atlantis"), Err(MapError::UnknownMap(_))));
    }
}
