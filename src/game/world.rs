//! World bounds, camera window, and static terrain (blocked set, hazards, checkpoints)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::direction::Cell;

/// Inclusive world bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct World {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl World {
    pub fn new(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// World covering a `cols` x `rows` grid anchored at the origin
    pub fn from_grid(cols: i32, rows: i32) -> Self {
        Self::new(0, 0, cols.max(1) - 1, rows.max(1) - 1)
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.x >= self.min_x && cell.x <= self.max_x && cell.y >= self.min_y && cell.y <= self.max_y
    }

    pub fn clamp(&self, cell: Cell) -> Cell {
        Cell::new(
            cell.x.clamp(self.min_x, self.max_x.max(self.min_x)),
            cell.y.clamp(self.min_y, self.max_y.max(self.min_y)),
        )
    }

    pub fn width(&self) -> i32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> i32 {
        self.max_y - self.min_y + 1
    }
}

/// Camera window over the world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub cols: i32,
    pub rows: i32,
    pub x0: i32,
    pub y0: i32,
}

impl Viewport {
    pub fn new(cols: i32, rows: i32, world: &World) -> Self {
        Self {
            cols: cols.max(1),
            rows: rows.max(1),
            x0: world.min_x,
            y0: world.min_y,
        }
    }

    /// Re-center on `focus`, never extending outside the world
    pub fn focus(&self, world: &World, focus: Cell) -> Self {
        let max_x0 = world.min_x.max(world.max_x - self.cols + 1);
        let max_y0 = world.min_y.max(world.max_y - self.rows + 1);
        Self {
            x0: (focus.x - self.cols / 2).clamp(world.min_x, max_x0),
            y0: (focus.y - self.rows / 2).clamp(world.min_y, max_y0),
            ..*self
        }
    }
}

/// Kind of an impassable tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockedKind {
    #[default]
    Rock,
    Reef,
    Wall,
}

impl BlockedKind {
    /// Damage taken when a ship runs into this tile
    pub fn ram_damage(self) -> u32 {
        match self {
            BlockedKind::Wall => 0,
            BlockedKind::Rock | BlockedKind::Reef => 1,
        }
    }

    /// Walls stop cannon fire; rocks and reefs do not
    pub fn stops_shot(self) -> bool {
        matches!(self, BlockedKind::Wall)
    }

    /// Lenient parse used for authored data; unknown kinds are rocks
    pub fn parse(kind: &str) -> Self {
        match kind.to_ascii_lowercase().as_str() {
            "reef" => BlockedKind::Reef,
            "wall" => BlockedKind::Wall,
            _ => BlockedKind::Rock,
        }
    }
}

/// A single blocked tile, authored or expanded from a group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockedTile {
    pub x: i32,
    pub y: i32,
    pub kind: BlockedKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
}

/// Where a group's anchor sits inside its footprint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnchorMode {
    /// Anchor is the top-left cell
    #[default]
    Top,
    /// Anchor is the bottom-left cell
    Bottom,
}

/// Rectangular multi-tile obstacle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockedGroup {
    pub id: String,
    pub kind: BlockedKind,
    pub anchor: Cell,
    pub anchor_mode: AnchorMode,
    pub width: i32,
    pub height: i32,
}

impl BlockedGroup {
    /// Expand the part of the footprint inside `world` into tiles, row by row from the top
    pub fn expand(&self, world: &World) -> Vec<BlockedTile> {
        if self.width <= 0 || self.height <= 0 {
            return Vec::new();
        }
        let (width, height) = (i64::from(self.width), i64::from(self.height));
        let left = i64::from(self.anchor.x);
        let top = match self.anchor_mode {
            AnchorMode::Top => i64::from(self.anchor.y),
            AnchorMode::Bottom => i64::from(self.anchor.y) - height + 1,
        };

        let x0 = left.max(i64::from(world.min_x));
        let x1 = (left + width - 1).min(i64::from(world.max_x));
        let y0 = top.max(i64::from(world.min_y));
        let y1 = (top + height - 1).min(i64::from(world.max_y));
        if x0 > x1 || y0 > y1 {
            return Vec::new();
        }

        // the clipped range lies inside the i32 world bounds
        let (x0, x1, y0, y1) = (x0 as i32, x1 as i32, y0 as i32, y1 as i32);
        let mut tiles = Vec::with_capacity(((x1 - x0 + 1) as usize) * ((y1 - y0 + 1) as usize));
        for y in y0..=y1 {
            for x in x0..=x1 {
                tiles.push(BlockedTile {
                    x,
                    y,
                    kind: self.kind,
                    group_id: Some(self.id.clone()),
                });
            }
        }
        tiles
    }
}

/// Damaging tile; ships can sail onto it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hazard {
    pub x: i32,
    pub y: i32,
    pub damage: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub id: String,
    pub x: i32,
    pub y: i32,
    pub radius: f64,
    #[serde(default)]
    pub label: String,
}

impl Checkpoint {
    /// Euclidean distance test against the radius
    pub fn contains(&self, cell: Cell) -> bool {
        let dx = f64::from(cell.x - self.x);
        let dy = f64::from(cell.y - self.y);
        dx * dx + dy * dy <= self.radius * self.radius
    }
}

/// Static per-map terrain, computed once per map load and shared between states
#[derive(Debug, Clone)]
pub struct Terrain {
    pub world: World,
    blocked: Vec<BlockedTile>,
    blocked_index: HashMap<Cell, BlockedKind>,
    hazards: Vec<Hazard>,
    hazard_index: HashMap<Cell, u32>,
    pub checkpoints: Vec<Checkpoint>,
}

impl Terrain {
    /// Build the blocked set from authored tiles and groups. Authored tiles win overlaps.
    pub fn new(
        world: World,
        singles: Vec<BlockedTile>,
        groups: &[BlockedGroup],
        hazards: Vec<Hazard>,
        checkpoints: Vec<Checkpoint>,
    ) -> Self {
        let mut blocked = Vec::new();
        let mut blocked_index = HashMap::new();
        let expanded = groups.iter().flat_map(|g| g.expand(&world));
        for tile in singles.into_iter().chain(expanded) {
            let cell = Cell::new(tile.x, tile.y);
            if blocked_index.contains_key(&cell) {
                continue;
            }
            blocked_index.insert(cell, tile.kind);
            blocked.push(tile);
        }

        let mut hazard_index = HashMap::new();
        for hazard in &hazards {
            hazard_index.insert(Cell::new(hazard.x, hazard.y), hazard.damage);
        }

        Self {
            world,
            blocked,
            blocked_index,
            hazards,
            hazard_index,
            checkpoints,
        }
    }

    /// Open terrain with no obstacles
    pub fn open(world: World) -> Self {
        Self::new(world, Vec::new(), &[], Vec::new(), Vec::new())
    }

    pub fn blocked_kind(&self, cell: Cell) -> Option<BlockedKind> {
        self.blocked_index.get(&cell).copied()
    }

    pub fn hazard_damage(&self, cell: Cell) -> u32 {
        self.hazard_index.get(&cell).copied().unwrap_or(0)
    }

    pub fn blocked_tiles(&self) -> &[BlockedTile] {
        &self.blocked
    }

    pub fn hazards(&self) -> &[Hazard] {
        &self.hazards
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(x: i32, y: i32, kind: BlockedKind) -> BlockedTile {
        BlockedTile {
            x,
            y,
            kind,
            group_id: None,
        }
    }

    #[test]
    fn test_bottom_anchor_expands_upwards() {
        let group = BlockedGroup {
            id: "northern-wall".into(),
            kind: BlockedKind::Wall,
            anchor: Cell::new(10, 7),
            anchor_mode: AnchorMode::Bottom,
            width: 4,
            height: 2,
        };
        let tiles = group.expand(&World::from_grid(30, 20));
        assert_eq!(tiles.len(), 8);
        assert!(tiles.iter().all(|t| t.kind == BlockedKind::Wall));
        assert!(tiles.iter().all(|t| t.group_id.as_deref() == Some("northern-wall")));
        let min_y = tiles.iter().map(|t| t.y).min().unwrap();
        let max_y = tiles.iter().map(|t| t.y).max().unwrap();
        let min_x = tiles.iter().map(|t| t.x).min().unwrap();
        let max_x = tiles.iter().map(|t| t.x).max().unwrap();
        assert_eq!((min_x, max_x, min_y, max_y), (10, 13, 6, 7));
    }

    #[test]
    fn test_top_anchor_expands_downwards() {
        let group = BlockedGroup {
            id: "g".into(),
            kind: BlockedKind::Reef,
            anchor: Cell::new(1, 1),
            anchor_mode: AnchorMode::Top,
            width: 2,
            height: 2,
        };
        let cells: Vec<(i32, i32)> = group.expand(&World::from_grid(5, 5)).iter().map(|t| (t.x, t.y)).collect();
        assert_eq!(cells, vec![(1, 1), (2, 1), (1, 2), (2, 2)]);
    }

    #[test]
    fn test_footprint_is_clipped_to_the_world() {
        let world = World::from_grid(7, 7);
        let huge = BlockedGroup {
            id: "huge".into(),
            kind: BlockedKind::Rock,
            anchor: Cell::new(5, 5),
            anchor_mode: AnchorMode::Top,
            width: 50_000,
            height: 50_000,
        };
        let cells: Vec<(i32, i32)> = huge.expand(&world).iter().map(|t| (t.x, t.y)).collect();
        assert_eq!(cells, vec![(5, 5), (6, 5), (5, 6), (6, 6)]);

        let outside = BlockedGroup {
            id: "outside".into(),
            anchor: Cell::new(-100, 40),
            ..huge.clone()
        };
        assert!(outside.expand(&world).is_empty());

        let edge = BlockedGroup {
            id: "edge".into(),
            anchor: Cell::new(i32::MAX, i32::MIN),
            anchor_mode: AnchorMode::Bottom,
            width: i32::MAX,
            height: i32::MAX,
            ..huge.clone()
        };
        assert!(edge.expand(&world).is_empty());

        let empty = BlockedGroup {
            id: "empty".into(),
            width: 0,
            height: -3,
            ..huge
        };
        assert!(empty.expand(&world).is_empty());

        let terrain = Terrain::new(world, Vec::new(), &[outside, edge], Vec::new(), Vec::new());
        assert!(terrain.blocked_tiles().is_empty());
    }

    #[test]
    fn test_authored_tile_wins_overlap() {
        let group = BlockedGroup {
            id: "g".into(),
            kind: BlockedKind::Wall,
            anchor: Cell::new(0, 0),
            anchor_mode: AnchorMode::Top,
            width: 2,
            height: 1,
        };
        let terrain = Terrain::new(
            World::from_grid(5, 5),
            vec![single(1, 0, BlockedKind::Rock)],
            &[group],
            Vec::new(),
            Vec::new(),
        );
        assert_eq!(terrain.blocked_kind(Cell::new(1, 0)), Some(BlockedKind::Rock));
        assert_eq!(terrain.blocked_kind(Cell::new(0, 0)), Some(BlockedKind::Wall));
        assert_eq!(terrain.blocked_tiles().len(), 2);
    }

    #[test]
    fn test_viewport_clamps_to_world() {
        let world = World::new(0, 0, 24, 24);
        let view = Viewport::new(13, 13, &world);

        assert_eq!(view.focus(&world, Cell::new(12, 12)).x0, 6);
        assert_eq!(view.focus(&world, Cell::new(0, 0)).x0, 0);
        assert_eq!(view.focus(&world, Cell::new(24, 24)).y0, 12);

        let wide = Viewport::new(40, 40, &world);
        let focused = wide.focus(&world, Cell::new(20, 20));
        assert_eq!((focused.x0, focused.y0), (0, 0));
    }

    #[test]
    fn test_kind_rules() {
        assert_eq!(BlockedKind::Wall.ram_damage(), 0);
        assert_eq!(BlockedKind::Rock.ram_damage(), 1);
        assert_eq!(BlockedKind::Reef.ram_damage(), 1);
        assert!(BlockedKind::Wall.stops_shot());
        assert!(!BlockedKind::Reef.stops_shot());
        assert_eq!(BlockedKind::parse("lava"), BlockedKind::Rock);
    }

    #[test]
    fn test_checkpoint_uses_euclidean_radius() {
        let cp = Checkpoint {
            id: "cp".into(),
            x: 5,
            y: 5,
            radius: 1.0,
            label: String::new(),
        };
        assert!(cp.contains(Cell::new(5, 6)));
        assert!(!cp.contains(Cell::new(6, 6)));
    }
}
