//! Crowd vote aggregation - many producers, one winner per turn

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use super::state::{Action, Move};

/// A legal vote choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoteChoice {
    Forward,
    Left,
    Right,
    Shoot,
}

/// Default priority order used for tie-breaking
pub const VOTE_CHOICES: [VoteChoice; 4] = [
    VoteChoice::Forward,
    VoteChoice::Left,
    VoteChoice::Right,
    VoteChoice::Shoot,
];

impl VoteChoice {
    /// Wire label (`FORWARD`, `LEFT`, ...)
    pub fn label(self) -> &'static str {
        match self {
            VoteChoice::Forward => "FORWARD",
            VoteChoice::Left => "LEFT",
            VoteChoice::Right => "RIGHT",
            VoteChoice::Shoot => "SHOOT",
        }
    }

    /// Parse a wire label or its short form, case-insensitively
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().as_str() {
            "FORWARD" | "F" => Some(VoteChoice::Forward),
            "LEFT" | "L" => Some(VoteChoice::Left),
            "RIGHT" | "R" => Some(VoteChoice::Right),
            "SHOOT" => Some(VoteChoice::Shoot),
            _ => None,
        }
    }

    pub fn to_action(self) -> Action {
        match self {
            VoteChoice::Forward => Action::Move(Move::F),
            VoteChoice::Left => Action::Move(Move::L),
            VoteChoice::Right => Action::Move(Move::R),
            VoteChoice::Shoot => Action::Shoot,
        }
    }
}

/// Weight sum per legal choice, in priority order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tally {
    entries: Vec<(VoteChoice, u32)>,
}

impl Tally {
    pub fn get(&self, choice: VoteChoice) -> u32 {
        self.entries
            .iter()
            .find(|(c, _)| *c == choice)
            .map(|(_, w)| *w)
            .unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.entries.iter().map(|(_, w)| *w).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (VoteChoice, u32)> + '_ {
        self.entries.iter().copied()
    }

    /// Strictly-greater scan from zero: earliest choice wins ties, all-zero yields none
    pub fn winner(&self) -> Option<VoteChoice> {
        let mut best = None;
        let mut best_score = 0;
        for (choice, score) in self.iter() {
            if score > best_score {
                best = Some(choice);
                best_score = score;
            }
        }
        best
    }
}

#[derive(Debug, Clone, Copy)]
struct Ballot {
    choice: VoteChoice,
    weight: u32,
}

/// Collects the last vote per voter for the current turn.
///
/// Shared between every vote producer and the turn engine; all access goes
/// through one lock so `take_winner` is atomic relative to `add_vote`.
pub struct VoteCollector {
    priority: Vec<VoteChoice>,
    votes: Mutex<HashMap<String, Ballot>>,
}

impl VoteCollector {
    pub fn new() -> Self {
        Self::with_priority(VOTE_CHOICES.to_vec())
    }

    /// Only choices listed in `priority` are legal
    pub fn with_priority(priority: Vec<VoteChoice>) -> Self {
        let mut deduped: Vec<VoteChoice> = Vec::with_capacity(priority.len());
        for choice in priority {
            if !deduped.contains(&choice) {
                deduped.push(choice);
            }
        }
        Self {
            priority: deduped,
            votes: Mutex::new(HashMap::new()),
        }
    }

    pub fn priority(&self) -> &[VoteChoice] {
        &self.priority
    }

    /// Record a vote, replacing any earlier vote by the same voter.
    /// Returns false when the vote was rejected.
    pub fn add_vote(&self, voter_id: &str, choice: VoteChoice, weight: u32) -> bool {
        if voter_id.is_empty() || weight == 0 || !self.priority.contains(&choice) {
            debug!(voter = %voter_id, ?choice, weight, "Rejected vote");
            return false;
        }

        self.votes
            .lock()
            .insert(voter_id.to_string(), Ballot { choice, weight });
        true
    }

    pub fn tally(&self) -> Tally {
        let votes = self.votes.lock();
        Self::tally_locked(&self.priority, &votes)
    }

    pub fn resolve_winner(&self) -> Option<VoteChoice> {
        self.tally().winner()
    }

    pub fn reset(&self) {
        self.votes.lock().clear();
    }

    /// Resolve the winner and clear all votes under a single lock
    pub fn take_winner(&self) -> Option<VoteChoice> {
        self.take_tally().winner()
    }

    /// Snapshot the tally and clear all votes under a single lock
    pub fn take_tally(&self) -> Tally {
        let mut votes = self.votes.lock();
        let tally = Self::tally_locked(&self.priority, &votes);
        votes.clear();
        tally
    }

    pub fn unique_voters(&self) -> usize {
        self.votes.lock().len()
    }

    fn tally_locked(priority: &[VoteChoice], votes: &HashMap<String, Ballot>) -> Tally {
        let mut entries: Vec<(VoteChoice, u32)> = priority.iter().map(|c| (*c, 0)).collect();
        for ballot in votes.values() {
            if let Some(entry) = entries.iter_mut().find(|(c, _)| *c == ballot.choice) {
                entry.1 = entry.1.saturating_add(ballot.weight);
            }
        }
        Tally { entries }
    }
}

impl Default for VoteCollector {
    fn default() -> Self {
        Self::new()
    }
}
