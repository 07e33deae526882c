//! Grid positions and territories.

use serde::{Deserialize, Serialize};

use super::player::PlayerId;

/// A cell on the board grid. `(0, 0)` is player one's back-left corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    /// Create a position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Grid (Manhattan) distance to another cell.
    #[must_use]
    pub const fn distance(self, other: Position) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Check that the cell lies on a `width` × `height` board.
    #[must_use]
    pub const fn in_bounds(self, width: u32, height: u32) -> bool {
        self.x >= 0 && self.y >= 0 && (self.x as u32) < width && (self.y as u32) < height
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The rows a player controls at match start (half-open `first_row..end_row`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Territory {
    pub owner: PlayerId,
    pub first_row: u32,
    pub end_row: u32,
}

impl Territory {
    /// Check whether a cell is inside this territory.
    #[must_use]
    pub fn contains(&self, position: Position) -> bool {
        position.y >= 0 && (self.first_row..self.end_row).contains(&(position.y as u32))
    }

    /// Number of rows in the territory.
    #[must_use]
    pub fn depth(&self) -> u32 {
        self.end_row.saturating_sub(self.first_row)
    }

    /// Check whether two territories share a row.
    #[must_use]
    pub fn overlaps(&self, other: &Territory) -> bool {
        self.first_row < other.end_row && other.first_row < self.end_row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        assert_eq!(Position::new(0, 0).distance(Position::new(3, 4)), 7);
        assert_eq!(Position::new(2, 2).distance(Position::new(2, 2)), 0);
    }

    #[test]
    fn test_in_bounds() {
        assert!(Position::new(0, 0).in_bounds(12, 12));
        assert!(Position::new(11, 11).in_bounds(12, 12));
        assert!(!Position::new(12, 0).in_bounds(12, 12));
        assert!(!Position::new(-1, 3).in_bounds(12, 12));
    }

    #[test]
    fn test_territory() {
        let t1 = Territory { owner: PlayerId::ONE, first_row: 0, end_row: 3 };
        let t2 = Territory { owner: PlayerId::TWO, first_row: 9, end_row: 12 };

        assert!(t1.contains(Position::new(5, 2)));
        assert!(!t1.contains(Position::new(5, 3)));
        assert_eq!(t2.depth(), 3);
        assert!(!t1.overlaps(&t2));
    }
}
