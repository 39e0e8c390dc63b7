//! Board Primitives
//!
//! The 10x10 shot record kept for each player. A board tracks shots taken
//! *against* that player's fleet, not the fleet itself: the fleet placement
//! stays the ground truth for hit detection, the board only accumulates
//! outcomes.

use serde::{Deserialize, Serialize};

/// Board side length in cells.
pub const BOARD_SIZE: u8 = 10;

/// A single board cell coordinate.
///
/// Valid coordinates satisfy `0 <= x, y < BOARD_SIZE`. The type itself does
/// not enforce the range; [`Coord::in_bounds`] checks it where the protocol
/// requires rejection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Coord {
    /// Column, 0-based from the left.
    pub x: u8,
    /// Row, 0-based from the top.
    pub y: u8,
}

impl Coord {
    /// Create a coordinate.
    pub const fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }

    /// Whether this coordinate lies on the board.
    #[inline]
    pub fn in_bounds(self) -> bool {
        self.x < BOARD_SIZE && self.y < BOARD_SIZE
    }
}

/// Outcome recorded in one board cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cell {
    /// Never shot at.
    #[default]
    Empty,
    /// Shot landed on a ship position.
    Hit,
    /// Shot landed on open water.
    Miss,
}

/// Shot record for one player.
///
/// All cells start [`Cell::Empty`]. Recording overwrites the prior state,
/// so a repeated shot at the same cell simply re-records the same outcome.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    // Indexed [y][x], matching the wire convention.
    cells: [[Cell; BOARD_SIZE as usize]; BOARD_SIZE as usize],
}

impl Board {
    /// Create an empty board.
    pub fn new() -> Self {
        Self {
            cells: [[Cell::Empty; BOARD_SIZE as usize]; BOARD_SIZE as usize],
        }
    }

    /// Cell state at a coordinate. Caller guarantees `at` is in bounds.
    #[inline]
    pub fn get(&self, at: Coord) -> Cell {
        self.cells[at.y as usize][at.x as usize]
    }

    /// Record a shot outcome at a coordinate, overwriting the prior state.
    #[inline]
    pub fn record(&mut self, at: Coord, outcome: Cell) {
        self.cells[at.y as usize][at.x as usize] = outcome;
    }

    /// Whether the cell at `at` shows a recorded hit.
    #[inline]
    pub fn is_hit(&self, at: Coord) -> bool {
        self.get(at) == Cell::Hit
    }

    /// Whether the cell at `at` has any shot recorded.
    #[inline]
    pub fn is_resolved(&self, at: Coord) -> bool {
        self.get(at) != Cell::Empty
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}
