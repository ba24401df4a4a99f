//! Opponent decision policies

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::VecDeque;

use super::state::{Action, GameState, Move};

/// Picks the opposing ship's action each turn
pub trait OpponentPolicy: Send {
    fn choose(&mut self, state: &GameState) -> Action;

    /// Called on every map load with the map's seed
    fn reseed(&mut self, _seed: u64) {}

    fn name(&self) -> &'static str;
}

const RANDOM_CHOICES: [Action; 4] = [
    Action::Move(Move::F),
    Action::Move(Move::L),
    Action::Move(Move::R),
    Action::Shoot,
];

/// Uniform choice among F, L, R and SHOOT from a seeded stream
pub struct RandomPolicy {
    rng: ChaCha8Rng,
    fixed_seed: Option<u64>,
}

impl RandomPolicy {
    /// `fixed_seed` overrides the map seed on every reseed
    pub fn new(fixed_seed: Option<u64>) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(fixed_seed.unwrap_or(0)),
            fixed_seed,
        }
    }
}

impl OpponentPolicy for RandomPolicy {
    fn choose(&mut self, _state: &GameState) -> Action {
        RANDOM_CHOICES[self.rng.gen_range(0..RANDOM_CHOICES.len())]
    }

    fn reseed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(self.fixed_seed.unwrap_or(seed));
    }

    fn name(&self) -> &'static str {
        "random"
    }
}

/// Never acts
#[derive(Debug, Default)]
pub struct IdlePolicy;

impl OpponentPolicy for IdlePolicy {
    fn choose(&mut self, _state: &GameState) -> Action {
        Action::Noop
    }

    fn name(&self) -> &'static str {
        "idle"
    }
}

/// Plays a fixed script, then idles
#[derive(Debug, Default)]
pub struct ScriptedPolicy {
    script: VecDeque<Action>,
}

impl ScriptedPolicy {
    pub fn new(script: impl IntoIterator<Item = Action>) -> Self {
        Self {
            script: script.into_iter().collect(),
        }
    }
}

impl OpponentPolicy for ScriptedPolicy {
    fn choose(&mut self, _state: &GameState) -> Action {
        self.script.pop_front().unwrap_or(Action::Noop)
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Build a policy from its configured name; unknown names fall back to random
pub fn policy_from_name(name: &str, seed: Option<u64>) -> Box<dyn OpponentPolicy> {
    match name {
        "idle" => Box::new(IdlePolicy),
        _ => Box::new(RandomPolicy::new(seed)),
    }
}
