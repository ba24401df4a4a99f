//! Broadside gunnery - shot paths, ammo, and hit resolution

use serde::Serialize;

use super::state::{GameState, Projectile, Ship, ShipId, ShotTile};
use super::world::Terrain;

/// Tiles a broadside reaches on each side
pub const SHOT_RANGE: u8 = 3;

/// Cannonball flight time (display only)
pub const PROJECTILE_DURATION_MS: u64 = 450;

/// Damage dealt by a hit, whatever the severity tier of the tile
pub const SHOT_DAMAGE: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShotReason {
    Ok,
    NoAmmo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShotOutcome {
    pub shot: bool,
    pub reason: ShotReason,
    pub paths: Vec<Vec<ShotTile>>,
    /// Whether the broadside struck the other ship
    pub hit: bool,
}

/// Port and starboard paths, each up to `SHOT_RANGE` tiles. A path ends at the
/// world edge or just before a wall; rocks and reefs let shots through.
pub fn compute_shot_paths(terrain: &Terrain, ship: &Ship) -> [Vec<ShotTile>; 2] {
    [ship.dir.left(), ship.dir.right()].map(|side| {
        let mut path = Vec::with_capacity(SHOT_RANGE as usize);
        let mut cell = ship.cell();
        for distance in 1..=SHOT_RANGE {
            cell = cell.step(side);
            if !terrain.world.contains(cell) {
                break;
            }
            if terrain.blocked_kind(cell).is_some_and(|kind| kind.stops_shot()) {
                break;
            }
            path.push(ShotTile {
                x: cell.x,
                y: cell.y,
                severity: SHOT_RANGE + 1 - distance,
            });
        }
        path
    })
}

/// Fire both broadsides. Spends one ammo and spawns display projectiles;
/// damage is applied separately by [`resolve_hits`].
pub fn resolve_shoot(state: &GameState, shooter: ShipId, now_ms: u64) -> (GameState, ShotOutcome) {
    let ship = state.ship(shooter);
    if ship.ammo == 0 {
        return (
            state.clone(),
            ShotOutcome {
                shot: false,
                reason: ShotReason::NoAmmo,
                paths: Vec::new(),
                hit: false,
            },
        );
    }

    let mut next = state.clone();
    let origin = ship.cell();
    let paths: Vec<Vec<ShotTile>> = compute_shot_paths(&state.terrain, ship).into_iter().collect();

    for path in paths.iter().filter(|p| !p.is_empty()) {
        let cells: Vec<_> = path.iter().map(|t| t.cell()).collect();
        let last = cells[cells.len() - 1];
        next.projectiles.push(Projectile {
            owner: shooter,
            from_x: origin.x,
            from_y: origin.y,
            to_x: last.x,
            to_y: last.y,
            spawn_time: now_ms,
            duration_ms: PROJECTILE_DURATION_MS,
            path: cells,
        });
    }

    next.shot_tiles.set(shooter, paths.iter().flatten().copied().collect());
    next.ship_mut(shooter).ammo -= 1;

    (
        next,
        ShotOutcome {
            shot: true,
            reason: ShotReason::Ok,
            paths,
            hit: false,
        },
    )
}

/// Apply flat damage to the shooter's target if any path covers its cell
pub fn resolve_hits(state: &GameState, shooter: ShipId, now_ms: u64) -> (GameState, bool) {
    let target_id = shooter.other();
    let target = state.ship(target_id).cell();
    let hit = compute_shot_paths(&state.terrain, state.ship(shooter))
        .iter()
        .any(|path| path.iter().any(|tile| tile.cell() == target));

    if !hit {
        return (state.clone(), false);
    }

    let mut next = state.clone();
    next.ship_mut(target_id).take_damage(SHOT_DAMAGE, now_ms);
    (next, true)
}
