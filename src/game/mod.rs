//! Game simulation modules

pub mod combat;
pub mod direction;
pub mod engine;
pub mod movement;
pub mod opponent;
pub mod snapshot;
pub mod state;
pub mod votes;
pub mod world;

pub use direction::{Cell, Direction};
pub use engine::{ActionOutcome, EngineConfig, Phase, TurnEngine, TurnReport};
pub use opponent::{policy_from_name, OpponentPolicy};
pub use snapshot::SnapshotBuilder;
pub use state::{Action, GameResult, GameState, Move, SessionMode, Ship, ShipId};
pub use votes::{VoteChoice, VoteCollector};
