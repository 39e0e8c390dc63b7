//! # Broadside Game Server
//!
//! Authoritative session manager for two-player naval artillery matches.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     BROADSIDE SERVER                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  game/           - Match state machinery (pure)              │
//! │  ├── board.rs    - 10x10 shot-tracking grid                  │
//! │  ├── fleet.rs    - Client-submitted ship placements          │
//! │  ├── state.rs    - Per-session lifecycle and turn pointer    │
//! │  └── combat.rs   - Shot resolution and victory detection     │
//! │                                                              │
//! │  network/        - Networking (owns all locks)               │
//! │  ├── server.rs   - WebSocket accept loop and matchmaking     │
//! │  ├── protocol.rs - JSON message types                        │
//! │  └── session.rs  - Live sessions and event broadcasting      │
//! │                                                              │
//! │  score/          - Fire-and-forget score reporting           │
//! │  └── http.rs     - HTTP collaborator client                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Authority Model
//!
//! The server is the single source of truth for whose turn it is, what was
//! hit, and who won. Clients submit intents; every state transition is
//! validated in `game/` before any event is broadcast. The one deliberate
//! trust boundary: submitted fleet layouts are accepted as hit-detection
//! ground truth without geometric validation.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod game;
pub mod network;
pub mod score;

// Re-export commonly used types
pub use game::board::{Board, Cell, Coord, BOARD_SIZE};
pub use game::combat::{fire, CombatRules, ShotResolution};
pub use game::fleet::{FleetPlacement, ShipPlacement};
pub use game::state::{ConnectionId, GameError, MatchState, MatchStatus};
pub use network::server::{GameServer, ServerConfig};
pub use score::{HttpScoreReporter, ScoreReporter};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
