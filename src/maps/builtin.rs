//! Built-in map catalogue

use crate::game::direction::Direction;
use crate::game::world::{AnchorMode, Checkpoint, Hazard, World};

use super::{AnchorDef, BlockedDef, BlockedGroupDef, FootprintDef, GridSize, MapDef, SpawnDef};

fn spawn(x: i32, y: i32, dir: Direction, hp: u32, ammo: u32) -> SpawnDef {
    SpawnDef {
        x,
        y,
        dir,
        hp,
        max_hp: None,
        ammo,
    }
}

fn rock(x: i32, y: i32, kind: &str) -> BlockedDef {
    BlockedDef {
        x,
        y,
        kind: Some(kind.to_string()),
    }
}

/// The three 7x7 arenas share one layout
fn arena(id: &str, name: &str, seed: u64) -> MapDef {
    MapDef {
        id: id.to_string(),
        name: name.to_string(),
        seed,
        grid: Some(GridSize { rows: 7, cols: 7 }),
        world: None,
        viewport: None,
        spawn: spawn(3, 3, Direction::N, 3, 15),
        enemy_spawn: spawn(3, 0, Direction::S, 3, 15),
        blocked: vec![
            rock(1, 1, "rock"),
            rock(2, 1, "rock"),
            rock(5, 2, "reef"),
            rock(3, 4, "wall"),
            rock(4, 4, "wall"),
        ],
        blocked_groups: Vec::new(),
        hazards: vec![
            Hazard {
                x: 1,
                y: 3,
                damage: 1,
            },
            Hazard {
                x: 5,
                y: 3,
                damage: 1,
            },
        ],
        checkpoints: Vec::new(),
    }
}

fn grand_world() -> MapDef {
    let group = |id: &str, kind: &str, x: i32, y: i32, w: i32, h: i32| BlockedGroupDef {
        id: id.to_string(),
        kind: Some(kind.to_string()),
        anchor: AnchorDef {
            x,
            y,
            anchor_mode: AnchorMode::Bottom,
        },
        footprint: FootprintDef { w, h },
    };
    let checkpoint = |id: &str, x: i32, y: i32, label: &str| Checkpoint {
        id: id.to_string(),
        x,
        y,
        radius: 1.0,
        label: label.to_string(),
    };

    MapDef {
        id: "grand-world".to_string(),
        name: "Grand World".to_string(),
        seed: 5150,
        grid: None,
        world: Some(World::new(0, 0, 24, 24)),
        viewport: Some(GridSize { rows: 13, cols: 13 }),
        spawn: spawn(12, 12, Direction::N, 6, 15),
        enemy_spawn: spawn(4, 20, Direction::S, 6, 15),
        blocked: vec![
            rock(8, 9, "reef"),
            rock(9, 9, "reef"),
            rock(15, 15, "rock"),
            rock(3, 18, "wall"),
        ],
        blocked_groups: vec![
            group("northern-wall", "wall", 10, 7, 4, 2),
            group("eastern-reef", "reef", 18, 14, 3, 3),
        ],
        hazards: vec![
            Hazard {
                x: 7,
                y: 12,
                damage: 1,
            },
            Hazard {
                x: 20,
                y: 10,
                damage: 2,
            },
        ],
        checkpoints: vec![
            checkpoint("cp-north", 12, 5, "North Beacon"),
            checkpoint("cp-center", 12, 12, "Center Dock"),
            checkpoint("cp-south", 12, 20, "South Haven"),
        ],
    }
}

pub fn builtin_maps() -> Vec<MapDef> {
    vec![
        arena("islands", "Islands", 1337),
        arena("ice", "Ice", 2024),
        arena("desert", "Desert", 909),
        grand_world(),
    ]
}
