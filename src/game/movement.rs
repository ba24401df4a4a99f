//! Grid movement: step computation and collision resolution

use serde::Serialize;

use super::direction::{Cell, Direction};
use super::state::{GameState, Move, ShipId};

/// How long a bounced or stopped ship pauses in the animation
pub const BUMP_HOLD_MS: u64 = 180;

/// Damage taken when ramming the other ship or a solid tile on the second step
pub const RAM_DAMAGE: u32 = 1;

/// Steps of a maneuver and the facing it commits to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveSteps {
    pub new_dir: Direction,
    pub steps: Vec<Cell>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveReason {
    Ok,
    Oob,
    CornerOobSlide,
    CornerOob,
    Blocked,
    Collision,
    Noop,
}

/// Pause at a waypoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationHold {
    pub index: usize,
    pub duration_ms: u64,
}

/// Presentation-only description of a move; `facings[i]` applies to the
/// segment from `waypoints[i]` to `waypoints[i + 1]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveAnimation {
    pub waypoints: Vec<Cell>,
    pub facings: Vec<Direction>,
    pub hold: Option<AnimationHold>,
}

impl MoveAnimation {
    fn still(at: Cell) -> Self {
        Self {
            waypoints: vec![at],
            facings: Vec::new(),
            hold: None,
        }
    }

    fn bounce(start: Cell, dir: Direction) -> Self {
        Self {
            waypoints: vec![start, start],
            facings: vec![dir],
            hold: Some(AnimationHold {
                index: 0,
                duration_ms: BUMP_HOLD_MS,
            }),
        }
    }

    fn path(waypoints: Vec<Cell>, facings: Vec<Direction>) -> Self {
        Self {
            waypoints,
            facings,
            hold: None,
        }
    }

    fn stopped(start: Cell, corner: Cell, dir: Direction) -> Self {
        Self {
            waypoints: vec![start, corner],
            facings: vec![dir],
            hold: Some(AnimationHold {
                index: 1,
                duration_ms: BUMP_HOLD_MS,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveOutcome {
    pub reason: MoveReason,
    pub moved: bool,
    pub damage: u32,
    pub steps: Vec<Cell>,
    pub new_dir: Direction,
    pub animation: MoveAnimation,
}

impl MoveOutcome {
    pub fn damaged(&self) -> bool {
        self.damage > 0
    }
}

/// Cells visited by `mv`. F is one step forward; L/R step forward then sideways.
pub fn compute_move_steps(from: Cell, dir: Direction, mv: Move) -> MoveSteps {
    let corner = from.step(dir);
    match mv {
        Move::F => MoveSteps {
            new_dir: dir,
            steps: vec![corner],
        },
        Move::L => MoveSteps {
            new_dir: dir.left(),
            steps: vec![corner, corner.step(dir.left())],
        },
        Move::R => MoveSteps {
            new_dir: dir.right(),
            steps: vec![corner, corner.step(dir.right())],
        },
    }
}

/// Resolve one maneuver for `actor`. Facing is committed even when the move fails.
pub fn resolve_move(
    state: &GameState,
    actor: ShipId,
    mv: Move,
    now_ms: u64,
) -> (GameState, MoveOutcome) {
    let mut next = state.clone();
    let terrain = state.terrain.clone();
    let world = terrain.world;
    let start = state.ship(actor).cell();
    let old_dir = state.ship(actor).dir;
    let other = state.ship(actor.other()).cell();

    if actor == ShipId::Player {
        next.prev = start;
    }

    let MoveSteps { new_dir, steps } = compute_move_steps(start, old_dir, mv);
    next.ship_mut(actor).dir = new_dir;

    let (reason, landing, damage, animation) = match steps.as_slice() {
        [] => (MoveReason::Noop, start, 0, MoveAnimation::still(start)),
        [corner, rest @ ..] => {
            let corner = *corner;
            let second = rest.first().copied();
            if !world.contains(corner) {
                match second {
                    None => (MoveReason::Oob, start, 0, MoveAnimation::bounce(start, old_dir)),
                    Some(second) => {
                        let slid = world.clamp(second);
                        (
                            MoveReason::CornerOobSlide,
                            slid,
                            0,
                            MoveAnimation::path(vec![start, slid], vec![new_dir]),
                        )
                    }
                }
            } else if corner == other {
                (MoveReason::Collision, start, RAM_DAMAGE, MoveAnimation::bounce(start, old_dir))
            } else if let Some(kind) = terrain.blocked_kind(corner) {
                (MoveReason::Blocked, start, kind.ram_damage(), MoveAnimation::bounce(start, old_dir))
            } else {
                match second {
                    None => (
                        MoveReason::Ok,
                        corner,
                        0,
                        MoveAnimation::path(vec![start, corner], vec![old_dir]),
                    ),
                    Some(second) if !world.contains(second) => (
                        MoveReason::CornerOob,
                        corner,
                        0,
                        MoveAnimation::stopped(start, corner, old_dir),
                    ),
                    Some(second) if second == other => (
                        MoveReason::Collision,
                        corner,
                        RAM_DAMAGE,
                        MoveAnimation::stopped(start, corner, old_dir),
                    ),
                    Some(second) if terrain.blocked_kind(second).is_some() => (
                        MoveReason::Blocked,
                        corner,
                        RAM_DAMAGE,
                        MoveAnimation::stopped(start, corner, old_dir),
                    ),
                    Some(second) => (
                        MoveReason::Ok,
                        second,
                        0,
                        MoveAnimation::path(vec![start, corner, second], vec![old_dir, new_dir]),
                    ),
                }
            }
        }
    };

    let ship = next.ship_mut(actor);
    ship.place(landing);
    let damage = ship.take_damage(damage, now_ms);

    let outcome = MoveOutcome {
        reason,
        moved: landing != start || reason == MoveReason::CornerOobSlide,
        damage,
        steps,
        new_dir,
        animation,
    };

    (next, outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::fixtures::*;
    use crate::game::world::BlockedKind;

    #[test]
    fn test_facing_committed_on_intent() {
        for dir in Direction::ALL {
            let from = Cell::new(3, 3);
            assert_eq!(compute_move_steps(from, dir, Move::F).new_dir, dir);
            assert_eq!(compute_move_steps(from, dir, Move::L).new_dir, dir.left());
            assert_eq!(compute_move_steps(from, dir, Move::R).new_dir, dir.right());
        }

        // a failed move still rotates
        let mut state = state_with(vec![blocked(3, 2, BlockedKind::Wall)], Vec::new());
        state.ship.dir = Direction::N;
        let (next, outcome) = resolve_move(&state, ShipId::Player, Move::R, 0);
        assert!(!outcome.moved);
        assert_eq!(next.ship.dir, Direction::E);
    }

    #[test]
    fn test_two_steps_for_lateral_moves() {
        let steps = compute_move_steps(Cell::new(3, 3), Direction::N, Move::L);
        assert_eq!(steps.steps, vec![Cell::new(3, 2), Cell::new(2, 2)]);
        let steps = compute_move_steps(Cell::new(3, 3), Direction::E, Move::R);
        assert_eq!(steps.steps, vec![Cell::new(4, 3), Cell::new(4, 4)]);
    }

    #[test]
    fn test_forward_into_open_water() {
        let state = open_state();
        let (next, outcome) = resolve_move(&state, ShipId::Player, Move::F, 0);
        assert_eq!(outcome.reason, MoveReason::Ok);
        assert!(outcome.moved);
        assert_eq!(next.ship.cell(), Cell::new(3, 2));
        assert_eq!(next.prev, Cell::new(3, 3));
        assert_eq!(next.ship.hp, 3);
        // input state untouched
        assert_eq!(state.ship.cell(), Cell::new(3, 3));
    }

    #[test]
    fn test_lateral_into_rock_on_corner() {
        let state = state_with(vec![blocked(3, 2, BlockedKind::Rock)], Vec::new());
        for mv in [Move::L, Move::R] {
            let (next, outcome) = resolve_move(&state, ShipId::Player, mv, 123);
            assert_eq!(outcome.reason, MoveReason::Blocked);
            assert!(!outcome.moved);
            assert_eq!(next.ship.cell(), Cell::new(3, 3));
            assert_eq!(next.ship.hp, 2);
            assert_eq!(next.ship.last_damage_at, 123);
        }
    }

    #[test]
    fn test_lateral_into_wall_on_corner() {
        let state = state_with(vec![blocked(3, 2, BlockedKind::Wall)], Vec::new());
        for mv in [Move::L, Move::R] {
            let (next, outcome) = resolve_move(&state, ShipId::Player, mv, 123);
            assert_eq!(outcome.reason, MoveReason::Blocked);
            assert_eq!(next.ship.cell(), Cell::new(3, 3));
            assert_eq!(next.ship.hp, 3);
            assert_eq!(next.ship.last_damage_at, 0);
        }
    }

    #[test]
    fn test_blocked_second_step_stops_at_corner() {
        let state = state_with(vec![blocked(4, 2, BlockedKind::Reef)], Vec::new());
        let (next, outcome) = resolve_move(&state, ShipId::Player, Move::R, 7);
        assert_eq!(outcome.reason, MoveReason::Blocked);
        assert!(outcome.moved);
        assert_eq!(outcome.damage, 1);
        assert_eq!(next.ship.cell(), Cell::new(3, 2));
        assert_eq!(next.ship.hp, 2);
        assert_eq!(outcome.animation.hold.map(|h| h.index), Some(1));
    }

    #[test]
    fn test_forward_off_edge_bounces() {
        let mut state = open_state();
        state.ship.y = 0;
        let (next, outcome) = resolve_move(&state, ShipId::Player, Move::F, 0);
        assert_eq!(outcome.reason, MoveReason::Oob);
        assert!(!outcome.moved);
        assert_eq!(outcome.damage, 0);
        assert_eq!(next.ship.cell(), Cell::new(3, 0));
    }

    #[test]
    fn test_lateral_off_edge_slides() {
        let mut state = open_state();
        state.ship.y = 0;
        let (next, outcome) = resolve_move(&state, ShipId::Player, Move::R, 0);
        assert_eq!(outcome.reason, MoveReason::CornerOobSlide);
        assert!(outcome.moved);
        assert_eq!(outcome.damage, 0);
        assert_eq!(next.ship.cell(), Cell::new(4, 0));
        assert_eq!(next.ship.dir, Direction::E);
    }

    #[test]
    fn test_second_step_off_edge_stops_at_corner() {
        let mut state = open_state();
        state.ship.x = 0;
        let (next, outcome) = resolve_move(&state, ShipId::Player, Move::L, 0);
        assert_eq!(outcome.reason, MoveReason::CornerOob);
        assert!(outcome.moved);
        assert_eq!(next.ship.cell(), Cell::new(0, 2));
        assert_eq!(next.ship.hp, 3);
    }

    #[test]
    fn test_ramming_other_ship_on_corner() {
        let mut state = open_state();
        state.enemy.x = 3;
        state.enemy.y = 2;
        let (next, outcome) = resolve_move(&state, ShipId::Player, Move::F, 50);
        assert_eq!(outcome.reason, MoveReason::Collision);
        assert!(!outcome.moved);
        assert_eq!(next.ship.cell(), Cell::new(3, 3));
        assert_eq!(next.ship.hp, 2);
        assert_eq!(next.enemy.hp, 3);
    }

    #[test]
    fn test_ramming_other_ship_on_second_step() {
        let mut state = open_state();
        state.enemy.x = 2;
        state.enemy.y = 2;
        let (next, outcome) = resolve_move(&state, ShipId::Player, Move::L, 50);
        assert_eq!(outcome.reason, MoveReason::Collision);
        assert!(outcome.moved);
        assert_eq!(next.ship.cell(), Cell::new(3, 2));
        assert_eq!(next.ship.hp, 2);
    }

    #[test]
    fn test_opponent_move_leaves_prev_alone() {
        let state = open_state();
        let (next, outcome) = resolve_move(&state, ShipId::Opponent, Move::F, 0);
        assert_eq!(outcome.reason, MoveReason::Ok);
        assert_eq!(next.enemy.cell(), Cell::new(5, 6));
        assert_eq!(next.prev, state.prev);
    }

    #[test]
    fn test_full_lateral_move_animation() {
        let state = open_state();
        let (next, outcome) = resolve_move(&state, ShipId::Player, Move::L, 0);
        assert_eq!(next.ship.cell(), Cell::new(2, 2));
        assert_eq!(
            outcome.animation.waypoints,
            vec![Cell::new(3, 3), Cell::new(3, 2), Cell::new(2, 2)]
        );
        assert_eq!(outcome.animation.facings, vec![Direction::N, Direction::W]);
        assert!(outcome.animation.hold.is_none());
    }
}
