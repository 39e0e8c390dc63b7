//! Fleet Placement
//!
//! A player's submitted set of ship shapes and board positions. The
//! submitted placement is the ground truth for hit detection.
//!
//! The server deliberately does not re-validate placement geometry on the
//! wire path: the client enforces overlap/adjacency rules, and the server's
//! authority covers turn order and shot accounting only. A hostile client
//! can submit an invalid fleet; that is an accepted trust boundary.
//! [`FleetPlacement::validate_geometry`] exists as an opt-in hardening hook
//! and is intentionally not called during normal play.

use serde::{Deserialize, Serialize};

use crate::game::board::{Board, Coord};

/// Shortest allowed ship.
pub const MIN_SHIP_LENGTH: u8 = 2;

/// Longest allowed ship.
pub const MAX_SHIP_LENGTH: u8 = 5;

/// One ship: its length and the ordered cells it occupies.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipPlacement {
    /// Ship length in cells (2-5 under client rules).
    pub length: u8,
    /// Occupied board cells.
    pub positions: Vec<Coord>,
}

/// An ordered list of ship placements for one player.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FleetPlacement {
    /// The ships, in submission order.
    pub ships: Vec<ShipPlacement>,
}

impl FleetPlacement {
    /// Create a fleet from ship placements.
    pub fn new(ships: Vec<ShipPlacement>) -> Self {
        Self { ships }
    }

    /// Whether any ship occupies `at`.
    pub fn contains(&self, at: Coord) -> bool {
        self.ships
            .iter()
            .any(|ship| ship.positions.iter().any(|&pos| pos == at))
    }

    /// Iterate over every occupied cell of every ship.
    pub fn all_positions(&self) -> impl Iterator<Item = Coord> + '_ {
        self.ships.iter().flat_map(|ship| ship.positions.iter().copied())
    }

    /// Whether every position of every ship shows a hit on `board`.
    ///
    /// This is the victory condition: the board records shots received, so
    /// a fully-hit fleet means the defender has lost.
    pub fn is_sunk_on(&self, board: &Board) -> bool {
        self.ships
            .iter()
            .all(|ship| ship.positions.iter().all(|&pos| board.is_hit(pos)))
    }

    /// Optional server-side geometry check (hardening hook, not wired into
    /// the protocol path). Enforces the stricter client-side rule set:
    /// in-bounds cells, declared lengths, no overlap, and no adjacency
    /// including diagonals between different ships.
    pub fn validate_geometry(&self) -> Result<(), PlacementError> {
        if self.ships.is_empty() {
            return Err(PlacementError::EmptyFleet);
        }

        for ship in &self.ships {
            if ship.length < MIN_SHIP_LENGTH || ship.length > MAX_SHIP_LENGTH {
                return Err(PlacementError::BadLength { length: ship.length });
            }
            if ship.positions.len() != ship.length as usize {
                return Err(PlacementError::LengthMismatch {
                    declared: ship.length,
                    actual: ship.positions.len(),
                });
            }
            for &pos in &ship.positions {
                if !pos.in_bounds() {
                    return Err(PlacementError::OutOfBounds { at: pos });
                }
            }
        }

        // Overlap pass first, so a shared cell is never masked by the
        // adjacency of some earlier pair. Within one ship this also catches
        // the same cell listed twice.
        for (i, ship) in self.ships.iter().enumerate() {
            for (pi, &pos) in ship.positions.iter().enumerate() {
                for (j, other) in self.ships.iter().enumerate() {
                    for (pj, &other_pos) in other.positions.iter().enumerate() {
                        if i == j && pi == pj {
                            continue;
                        }
                        if pos == other_pos {
                            return Err(PlacementError::Overlap { at: pos });
                        }
                    }
                }
            }
        }

        for (i, ship) in self.ships.iter().enumerate() {
            for &pos in &ship.positions {
                for (j, other) in self.ships.iter().enumerate() {
                    if i == j {
                        continue;
                    }
                    for &other_pos in &other.positions {
                        if touches(pos, other_pos) {
                            return Err(PlacementError::Adjacent { at: pos });
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

/// Whether two cells are equal or adjacent, diagonals included.
fn touches(a: Coord, b: Coord) -> bool {
    (a.x as i16 - b.x as i16).abs() <= 1 && (a.y as i16 - b.y as i16).abs() <= 1
}

/// Geometry violations detected by [`FleetPlacement::validate_geometry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PlacementError {
    /// Fleet contains no ships.
    #[error("fleet contains no ships")]
    EmptyFleet,

    /// Ship length outside 2-5.
    #[error("ship length {length} outside {MIN_SHIP_LENGTH}-{MAX_SHIP_LENGTH}")]
    BadLength {
        /// The declared length.
        length: u8,
    },

    /// Declared length differs from the number of positions.
    #[error("ship declares length {declared} but occupies {actual} cells")]
    LengthMismatch {
        /// The declared length.
        declared: u8,
        /// Positions actually listed.
        actual: usize,
    },

    /// A position lies off the board.
    #[error("position ({},{}) is off the board", at.x, at.y)]
    OutOfBounds {
        /// The offending cell.
        at: Coord,
    },

    /// Two ships share a cell.
    #[error("ships overlap at ({},{})", at.x, at.y)]
    Overlap {
        /// The shared cell.
        at: Coord,
    },

    /// Two ships touch, diagonals included.
    #[error("ships touch at ({},{})", at.x, at.y)]
    Adjacent {
        /// The touching cell.
        at: Coord,
    },
}
