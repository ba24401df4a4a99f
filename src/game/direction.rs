//! Grid facing and rotation algebra

use serde::{Deserialize, Serialize};

/// A grid cell (grid-space, y grows southwards)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Cell one unit step away in `dir`
    pub fn step(self, dir: Direction) -> Self {
        let (dx, dy) = dir.vector();
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Ship facing, in cyclic N/E/S/W order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    #[default]
    N,
    E,
    S,
    W,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::N, Direction::E, Direction::S, Direction::W];

    pub fn index(self) -> u8 {
        match self {
            Direction::N => 0,
            Direction::E => 1,
            Direction::S => 2,
            Direction::W => 3,
        }
    }

    /// Wraps any integer onto the four facings
    pub fn from_index(index: u8) -> Self {
        Self::ALL[(index % 4) as usize]
    }

    /// `(d + 3) mod 4`
    pub fn left(self) -> Self {
        Self::from_index(self.index() + 3)
    }

    /// `(d + 1) mod 4`
    pub fn right(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    /// Unit vector in grid space
    pub fn vector(self) -> (i32, i32) {
        match self {
            Direction::N => (0, -1),
            Direction::E => (1, 0),
            Direction::S => (0, 1),
            Direction::W => (-1, 0),
        }
    }
}

impl Serialize for Direction {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.index())
    }
}

impl<'de> Deserialize<'de> for Direction {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let index = u8::deserialize(deserializer)?;
        Ok(Self::from_index(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_is_cyclic() {
        for dir in Direction::ALL {
            assert_eq!(dir.left().right(), dir);
            assert_eq!(dir.right().right().right().right(), dir);
            assert_eq!(dir.left().index(), (dir.index() + 3) % 4);
            assert_eq!(dir.right().index(), (dir.index() + 1) % 4);
        }
        assert_eq!(Direction::N.left(), Direction::W);
        assert_eq!(Direction::W.right(), Direction::N);
    }

    #[test]
    fn test_vectors_match_facing() {
        let origin = Cell::new(3, 3);
        assert_eq!(origin.step(Direction::N), Cell::new(3, 2));
        assert_eq!(origin.step(Direction::E), Cell::new(4, 3));
        assert_eq!(origin.step(Direction::S), Cell::new(3, 4));
        assert_eq!(origin.step(Direction::W), Cell::new(2, 3));
    }

    #[test]
    fn test_serializes_as_index() {
        let json = serde_json::to_string(&Direction::S).unwrap();
        assert_eq!(json, "2");
        let dir: Direction = serde_json::from_str("3").unwrap();
        assert_eq!(dir, Direction::W);
    }
}
