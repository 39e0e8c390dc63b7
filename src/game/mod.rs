//! Game Logic Module
//!
//! Transport-free match logic. Everything here is synchronous and owns no
//! locks; the network layer serializes access per session.
//!
//! ## Module Structure
//!
//! - `board`: coordinates, cells, per-player shot record
//! - `fleet`: submitted ship placements (hit-detection ground truth)
//! - `state`: match state, player slots, placement and forfeit transitions
//! - `combat`: shot resolution, turn enforcement, win check

pub mod board;
pub mod combat;
pub mod fleet;
pub mod state;

// Re-export key types
pub use board::{Board, Cell, Coord, BOARD_SIZE};
pub use combat::{fire, CombatRules, ShotResolution};
pub use fleet::{FleetPlacement, PlacementError, ShipPlacement};
pub use state::{ConnectionId, GameError, MatchState, MatchStatus, PlayerSlot};
