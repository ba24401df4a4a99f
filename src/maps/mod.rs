//! Map catalogue - authored map definitions and conversion into session state

mod builtin;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::game::direction::{Cell, Direction};
use crate::game::state::{GameState, Ship};
use crate::game::world::{
    AnchorMode, BlockedGroup, BlockedKind, BlockedTile, Checkpoint, Hazard, Terrain, Viewport, World,
};

pub use builtin::builtin_maps;

/// Map loading errors
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("Unknown map: {0}")]
    UnknownMap(String),

    #[error("Failed to read map file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Malformed map file {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSize {
    pub rows: i32,
    pub cols: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpawnDef {
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub dir: Direction,
    pub hp: u32,
    #[serde(default)]
    pub max_hp: Option<u32>,
    pub ammo: u32,
}

impl SpawnDef {
    fn ship(&self) -> Ship {
        Ship {
            x: self.x,
            y: self.y,
            dir: self.dir,
            hp: self.hp,
            max_hp: self.max_hp.unwrap_or(self.hp).max(self.hp),
            ammo: self.ammo,
            last_damage_at: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedDef {
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorDef {
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub anchor_mode: AnchorMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FootprintDef {
    pub w: i32,
    pub h: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedGroupDef {
    pub id: String,
    #[serde(default)]
    pub kind: Option<String>,
    pub anchor: AnchorDef,
    pub footprint: FootprintDef,
}

/// Authored map, as supplied by the built-in catalogue or `MAPS_FILE`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapDef {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub grid: Option<GridSize>,
    #[serde(default)]
    pub world: Option<World>,
    #[serde(default)]
    pub viewport: Option<GridSize>,
    pub spawn: SpawnDef,
    pub enemy_spawn: SpawnDef,
    #[serde(default)]
    pub blocked: Vec<BlockedDef>,
    #[serde(default)]
    pub blocked_groups: Vec<BlockedGroupDef>,
    #[serde(default)]
    pub hazards: Vec<Hazard>,
    #[serde(default)]
    pub checkpoints: Vec<Checkpoint>,
}

impl MapDef {
    /// World bounds: explicit `world`, else the grid, else a 7x7 grid
    pub fn world(&self) -> World {
        match (self.world, self.grid) {
            (Some(world), _) => world,
            (None, Some(grid)) => World::from_grid(grid.cols, grid.rows),
            (None, None) => World::from_grid(7, 7),
        }
    }

    pub fn terrain(&self) -> Terrain {
        let singles = self
            .blocked
            .iter()
            .map(|b| BlockedTile {
                x: b.x,
                y: b.y,
                kind: b.kind.as_deref().map(BlockedKind::parse).unwrap_or_default(),
                group_id: None,
            })
            .collect();

        let groups: Vec<BlockedGroup> = self
            .blocked_groups
            .iter()
            .map(|g| BlockedGroup {
                id: g.id.clone(),
                kind: g.kind.as_deref().map(BlockedKind::parse).unwrap_or_default(),
                anchor: Cell::new(g.anchor.x, g.anchor.y),
                anchor_mode: g.anchor.anchor_mode,
                width: g.footprint.w,
                height: g.footprint.h,
            })
            .collect();

        Terrain::new(
            self.world(),
            singles,
            &groups,
            self.hazards.clone(),
            self.checkpoints.clone(),
        )
    }

    /// Fresh session state for this map
    pub fn initial_state(&self) -> GameState {
        let terrain = self.terrain();
        let world = terrain.world;
        let viewport = match (self.viewport, self.grid) {
            (Some(v), _) | (None, Some(v)) => Viewport::new(v.cols, v.rows, &world),
            (None, None) => Viewport::new(world.width(), world.height(), &world),
        };
        GameState::new(
            self.id.clone(),
            self.seed,
            Arc::new(terrain),
            viewport,
            self.spawn.ship(),
            self.enemy_spawn.ship(),
        )
    }
}

/// Catalogue entry for listings
#[derive(Debug, Clone, Serialize)]
pub struct MapSummary {
    pub id: String,
    pub name: String,
}

/// All loadable maps, keyed by id
#[derive(Debug, Clone)]
pub struct MapCatalog {
    maps: BTreeMap<String, MapDef>,
}

impl MapCatalog {
    pub fn builtin() -> Self {
        Self::from_defs(builtin_maps())
    }

    pub fn from_defs(defs: Vec<MapDef>) -> Self {
        let mut maps = BTreeMap::new();
        for def in defs {
            maps.insert(def.id.clone(), def);
        }
        Self { maps }
    }

    /// Add maps from a JSON array file; a duplicate id replaces the existing map
    pub fn extend_from_file(&mut self, path: &Path) -> Result<usize, MapError> {
        let path_str = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| MapError::Read {
            path: path_str.clone(),
            source,
        })?;
        let defs: Vec<MapDef> = serde_json::from_str(&raw).map_err(|source| MapError::Parse {
            path: path_str.clone(),
            source,
        })?;

        let count = defs.len();
        for def in defs {
            self.maps.insert(def.id.clone(), def);
        }
        info!(path = %path_str, count, "Loaded map definitions");
        Ok(count)
    }

    pub fn get(&self, id: &str) -> Result<&MapDef, MapError> {
        self.maps
            .get(id)
            .ok_or_else(|| MapError::UnknownMap(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.maps.contains_key(id)
    }

    pub fn list(&self) -> Vec<MapSummary> {
        self.maps
            .values()
            .map(|m| MapSummary {
                id: m.id.clone(),
                name: m.name.clone(),
            })
            .collect()
    }
}

impl Default for MapCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
