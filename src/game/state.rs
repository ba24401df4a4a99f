//! Per-turn game state value and its building blocks

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::direction::{Cell, Direction};
use super::world::{Terrain, Viewport};

/// Maneuver relative to the ship's facing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Move {
    /// One tile forward
    F,
    /// Forward, then one tile to port; ends facing left
    L,
    /// Forward, then one tile to starboard; ends facing right
    R,
}

/// The single action resolved for a ship in a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "move", rename_all = "snake_case")]
pub enum Action {
    Move(Move),
    Shoot,
    Noop,
}

/// Which of the two ships
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipId {
    Player,
    Opponent,
}

impl ShipId {
    pub fn other(self) -> Self {
        match self {
            ShipId::Player => ShipId::Opponent,
            ShipId::Opponent => ShipId::Player,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ship {
    pub x: i32,
    pub y: i32,
    pub dir: Direction,
    pub hp: u32,
    pub max_hp: u32,
    pub ammo: u32,
    /// Timestamp (ms) of the last damage taken, 0 if never
    pub last_damage_at: u64,
}

impl Ship {
    pub fn cell(&self) -> Cell {
        Cell::new(self.x, self.y)
    }

    pub fn place(&mut self, cell: Cell) {
        self.x = cell.x;
        self.y = cell.y;
    }

    /// Subtract damage, floored at zero. Returns the damage actually applied.
    pub fn take_damage(&mut self, damage: u32, now_ms: u64) -> u32 {
        if damage == 0 {
            return 0;
        }
        let applied = damage.min(self.hp);
        self.hp -= applied;
        self.last_damage_at = now_ms;
        applied
    }

    pub fn is_sunk(&self) -> bool {
        self.hp == 0
    }
}

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    #[default]
    Start,
    Playing,
    ResultSet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameResult {
    Win,
    Loss,
}

/// Display-only cannonball flight
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Projectile {
    pub owner: ShipId,
    pub from_x: i32,
    pub from_y: i32,
    pub to_x: i32,
    pub to_y: i32,
    pub spawn_time: u64,
    pub duration_ms: u64,
    pub path: Vec<Cell>,
}

impl Projectile {
    pub fn expired(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.spawn_time) >= self.duration_ms
    }
}

/// Shot path tile with its cosmetic severity (3 = near, 1 = far)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShotTile {
    pub x: i32,
    pub y: i32,
    pub severity: u8,
}

impl ShotTile {
    pub fn cell(&self) -> Cell {
        Cell::new(self.x, self.y)
    }
}

/// Last broadside of each ship; a ship's tiles stay until it fires again
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ShotHighlights {
    pub player: Vec<ShotTile>,
    pub opponent: Vec<ShotTile>,
}

impl ShotHighlights {
    pub fn get(&self, id: ShipId) -> &[ShotTile] {
        match id {
            ShipId::Player => &self.player,
            ShipId::Opponent => &self.opponent,
        }
    }

    pub fn set(&mut self, id: ShipId, tiles: Vec<ShotTile>) {
        match id {
            ShipId::Player => self.player = tiles,
            ShipId::Opponent => self.opponent = tiles,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipStats {
    pub x: i32,
    pub y: i32,
    pub dir: Direction,
    pub hp: u32,
    pub max_hp: u32,
    pub ammo: u32,
}

impl From<&Ship> for ShipStats {
    fn from(ship: &Ship) -> Self {
        Self {
            x: ship.x,
            y: ship.y,
            dir: ship.dir,
            hp: ship.hp,
            max_hp: ship.max_hp,
            ammo: ship.ammo,
        }
    }
}

/// Captured on entering a checkpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckpointRecord {
    pub checkpoint_id: String,
    pub turn_index: u64,
    pub ship_stats: ShipStats,
    pub enemy_stats: Option<ShipStats>,
}

/// Complete session state. Resolvers take it by reference and return a new value.
#[derive(Debug, Clone)]
pub struct GameState {
    pub map_id: String,
    pub seed: u64,
    pub terrain: Arc<Terrain>,
    pub viewport: Viewport,
    pub ship: Ship,
    pub enemy: Ship,
    /// Player cell before the last resolved turn
    pub prev: Cell,
    pub queued_action: Option<Action>,
    pub projectiles: Vec<Projectile>,
    pub shot_tiles: ShotHighlights,
    pub mode: SessionMode,
    pub result: Option<GameResult>,
    pub result_at: Option<u64>,
    pub turn_index: u64,
    pub last_checkpoint_id: Option<String>,
    pub last_checkpoint: Option<CheckpointRecord>,
}

impl GameState {
    pub fn new(
        map_id: impl Into<String>,
        seed: u64,
        terrain: Arc<Terrain>,
        viewport: Viewport,
        ship: Ship,
        enemy: Ship,
    ) -> Self {
        let prev = ship.cell();
        let viewport = viewport.focus(&terrain.world, prev);
        Self {
            map_id: map_id.into(),
            seed,
            terrain,
            viewport,
            ship,
            enemy,
            prev,
            queued_action: None,
            projectiles: Vec::new(),
            shot_tiles: ShotHighlights::default(),
            mode: SessionMode::Start,
            result: None,
            result_at: None,
            turn_index: 0,
            last_checkpoint_id: None,
            last_checkpoint: None,
        }
    }

    pub fn ship(&self, id: ShipId) -> &Ship {
        match id {
            ShipId::Player => &self.ship,
            ShipId::Opponent => &self.enemy,
        }
    }

    pub fn ship_mut(&mut self, id: ShipId) -> &mut Ship {
        match id {
            ShipId::Player => &mut self.ship,
            ShipId::Opponent => &mut self.enemy,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.mode == SessionMode::Playing
    }

    /// Drop projectiles whose flight is over
    pub fn prune_projectiles(&mut self, now_ms: u64) -> bool {
        let before = self.projectiles.len();
        self.projectiles.retain(|p| !p.expired(now_ms));
        self.projectiles.len() != before
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::game::world::{BlockedGroup, BlockedTile, Hazard, World};

    pub fn ship(x: i32, y: i32, dir: Direction) -> Ship {
        Ship {
            x,
            y,
            dir,
            hp: 3,
            max_hp: 3,
            ammo: 15,
            last_damage_at: 0,
        }
    }

    /// 7x7 open sea, player at (3,3) facing N, opponent parked in a corner
    pub fn open_state() -> GameState {
        state_with(Vec::new(), Vec::new())
    }

    pub fn state_with(blocked: Vec<BlockedTile>, hazards: Vec<Hazard>) -> GameState {
        let world = World::from_grid(7, 7);
        let terrain = Terrain::new(world, blocked, &[] as &[BlockedGroup], hazards, Vec::new());
        let viewport = Viewport::new(7, 7, &world);
        GameState::new(
            "test",
            1,
            Arc::new(terrain),
            viewport,
            ship(3, 3, Direction::N),
            ship(6, 6, Direction::W),
        )
    }

    pub fn blocked(x: i32, y: i32, kind: crate::game::world::BlockedKind) -> BlockedTile {
        BlockedTile {
            x,
            y,
            kind,
            group_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_damage_floors_at_zero() {
        let mut s = ship(0, 0, Direction::N);
        assert_eq!(s.take_damage(5, 42), 3);
        assert_eq!(s.hp, 0);
        assert_eq!(s.last_damage_at, 42);
        assert!(s.is_sunk());
    }

    #[test]
    fn test_zero_damage_keeps_timestamp() {
        let mut s = ship(0, 0, Direction::N);
        assert_eq!(s.take_damage(0, 42), 0);
        assert_eq!(s.last_damage_at, 0);
    }

    #[test]
    fn test_prune_projectiles() {
        let mut state = open_state();
        state.projectiles.push(Projectile {
            owner: ShipId::Player,
            from_x: 3,
            from_y: 3,
            to_x: 2,
            to_y: 3,
            spawn_time: 100,
            duration_ms: 450,
            path: vec![Cell::new(2, 3)],
        });
        assert!(!state.prune_projectiles(549));
        assert_eq!(state.projectiles.len(), 1);
        assert!(state.prune_projectiles(550));
        assert!(state.projectiles.is_empty());
    }

    #[test]
    fn test_action_wire_shape() {
        let json = serde_json::to_value(Action::Move(Move::L)).unwrap();
        assert_eq!(json, serde_json::json!({"type": "move", "move": "L"}));
        let shoot: Action = serde_json::from_str(r#"{"type":"shoot"}"#).unwrap();
        assert_eq!(shoot, Action::Shoot);
    }
}
