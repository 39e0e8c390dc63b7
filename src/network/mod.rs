//! Network Layer
//!
//! WebSocket server for real-time multiplayer communication.
//! This layer owns every lock in the crate; `game/` is pure state machinery.
//!
//! Lock order, outermost first: client registry, matchmaking queue, session
//! directory, individual session. A task never acquires an earlier lock
//! while holding a later one.

pub mod protocol;
pub mod server;
pub mod session;

pub use protocol::{ClientMessage, ErrorCode, ServerError, ServerMessage};
pub use server::{GameServer, GameServerError, ServerConfig};
pub use session::{GameSession, SessionId, SessionManager, SessionPlayer};
