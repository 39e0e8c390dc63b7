//! Protocol Messages
//!
//! Wire format for the per-connection event channel. One closed variant per
//! game event; a payload that does not match its variant's shape fails to
//! decode and is rejected as a protocol violation instead of reaching any
//! handler. All messages are serialized as JSON.

use serde::{Deserialize, Serialize};

use crate::game::fleet::ShipPlacement;
use crate::game::state::{ConnectionId, GameError};

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Enqueue for matchmaking or get paired immediately.
    FindGame {
        /// Display name; blank or absent gets a generated placeholder.
        username: Option<String>,
    },

    /// Submit this player's fleet placement.
    PlaceShips {
        /// The fleet, trusted as hit-detection ground truth.
        ships: Vec<ShipPlacement>,
    },

    /// Fire at the opponent.
    Shoot {
        /// Target column.
        x: u8,
        /// Target row.
        y: u8,
    },

    /// Concede the active game.
    Forfeit {
        /// Session the client believes it is in; used as a fallback when
        /// the server has no session recorded for the connection.
        session_id: Option<[u8; 16]>,
    },

    /// Send a chat line to everyone in the session.
    Chat {
        /// Session to relay into.
        session_id: [u8; 16],
        /// The message text, relayed untouched.
        message: String,
    },
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Queued; no opponent available yet.
    Waiting,

    /// Paired into a new session.
    GameFound {
        /// New session identifier.
        session_id: [u8; 16],
        /// 0 for the pairing requester, 1 for the popped waiter.
        player_index: u8,
        /// The other player's connection id.
        opponent_id: ConnectionId,
        /// The other player's display name.
        opponent_name: String,
    },

    /// The other player has placed their fleet.
    OpponentReady,

    /// Both fleets placed; play begins.
    GameStart {
        /// Connection holding the opening turn.
        current_turn: ConnectionId,
    },

    /// A shot was resolved; broadcast to both players.
    ShotResult {
        /// Who fired.
        shooter_id: ConnectionId,
        /// Target column.
        x: u8,
        /// Target row.
        y: u8,
        /// Whether a ship position was struck.
        hit: bool,
    },

    /// The turn pointer moved; broadcast to both players.
    TurnChange {
        /// Connection now allowed to fire.
        current_turn: ConnectionId,
    },

    /// Terminal: a fleet was fully sunk.
    GameOver {
        /// The winning connection.
        winner: ConnectionId,
    },

    /// The other player conceded.
    OpponentForfeited,

    /// The other player's connection dropped.
    OpponentDisconnected,

    /// Chat line relayed to every player in the session, sender included;
    /// the receiving client suppresses its own echo.
    Chat {
        /// The message text.
        message: String,
        /// Originating connection.
        sender_id: ConnectionId,
        /// Originating display name.
        sender_name: String,
    },

    /// Terse rejection; the connection stays open.
    Error(ServerError),
}

/// Server error event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerError {
    /// Error code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
}

/// Error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Message failed to decode against the closed variant set.
    InvalidMessage,
    /// Shot fired out of turn.
    NotYourTurn,
    /// Shot coordinate off the board.
    OutOfBounds,
    /// Placement submitted after setup ended or after readying up.
    PlacementClosed,
    /// Matchmaking requested while already in a session.
    AlreadyInGame,
}

impl ServerMessage {
    /// Build an error event.
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Error(ServerError {
            code,
            message: message.into(),
        })
    }

    /// Map a game-layer rejection to its wire representation.
    ///
    /// Returns `None` for violations the protocol rejects silently
    /// (shots outside active play, events from non-players): those degrade
    /// to no-ops without surfacing an error.
    pub fn from_violation(err: &GameError) -> Option<Self> {
        match err {
            GameError::NotYourTurn => {
                Some(Self::error(ErrorCode::NotYourTurn, "Not your turn!"))
            }
            GameError::OutOfBounds => {
                Some(Self::error(ErrorCode::OutOfBounds, err.to_string()))
            }
            GameError::PlacementClosed | GameError::AlreadyReady => {
                Some(Self::error(ErrorCode::PlacementClosed, err.to_string()))
            }
            GameError::NotPlaying | GameError::NotAPlayer => None,
        }
    }
}

// =============================================================================
// SERIALIZATION HELPERS
// =============================================================================

impl ClientMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::board::Coord;

    #[test]
    fn find_game_roundtrip() {
        let msg = ClientMessage::FindGame {
            username: Some("alice".into()),
        };
        let json = msg.to_json().unwrap();
        assert!(json.contains("find_game"));
        let parsed = ClientMessage::from_json(&json).unwrap();
        assert!(matches!(
            parsed,
            ClientMessage::FindGame { username: Some(u) } if u == "alice"
        ));
    }

    #[test]
    fn place_ships_roundtrip() {
        let msg = ClientMessage::PlaceShips {
            ships: vec![ShipPlacement {
                length: 2,
                positions: vec![Coord::new(0, 0), Coord::new(1, 0)],
            }],
        };
        let json = msg.to_json().unwrap();
        let parsed = ClientMessage::from_json(&json).unwrap();
        if let ClientMessage::PlaceShips { ships } = parsed {
            assert_eq!(ships.len(), 1);
            assert_eq!(ships[0].positions[1], Coord::new(1, 0));
        } else {
            panic!("wrong variant");
        }
    }

    #[test]
    fn shoot_decodes_from_plain_json() {
        let parsed = ClientMessage::from_json(r#"{"type":"shoot","x":3,"y":7}"#).unwrap();
        assert!(matches!(parsed, ClientMessage::Shoot { x: 3, y: 7 }));
    }

    #[test]
    fn unknown_type_is_rejected() {
        assert!(ClientMessage::from_json(r#"{"type":"teleport","x":1}"#).is_err());
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        // "shoot" with absent coordinates must not decode into partial data.
        assert!(ClientMessage::from_json(r#"{"type":"shoot"}"#).is_err());
        assert!(ClientMessage::from_json(r#"{"type":"shoot","x":"a","y":0}"#).is_err());
    }

    #[test]
    fn server_events_roundtrip() {
        let events = vec![
            ServerMessage::Waiting,
            ServerMessage::GameFound {
                session_id: [7; 16],
                player_index: 0,
                opponent_id: ConnectionId::new([2; 16]),
                opponent_name: "bob".into(),
            },
            ServerMessage::OpponentReady,
            ServerMessage::GameStart {
                current_turn: ConnectionId::new([1; 16]),
            },
            ServerMessage::ShotResult {
                shooter_id: ConnectionId::new([1; 16]),
                x: 4,
                y: 5,
                hit: true,
            },
            ServerMessage::TurnChange {
                current_turn: ConnectionId::new([2; 16]),
            },
            ServerMessage::GameOver {
                winner: ConnectionId::new([1; 16]),
            },
            ServerMessage::OpponentForfeited,
            ServerMessage::OpponentDisconnected,
            ServerMessage::Chat {
                message: "gg".into(),
                sender_id: ConnectionId::new([1; 16]),
                sender_name: "alice".into(),
            },
        ];

        for event in events {
            let json = event.to_json().unwrap();
            let _ = ServerMessage::from_json(&json).unwrap();
        }
    }

    #[test]
    fn out_of_turn_violation_carries_legacy_message() {
        let msg = ServerMessage::from_violation(&GameError::NotYourTurn).unwrap();
        if let ServerMessage::Error(err) = msg {
            assert_eq!(err.code, ErrorCode::NotYourTurn);
            assert_eq!(err.message, "Not your turn!");
        } else {
            panic!("wrong variant");
        }
    }

    #[test]
    fn silent_violations_produce_no_event() {
        assert!(ServerMessage::from_violation(&GameError::NotPlaying).is_none());
        assert!(ServerMessage::from_violation(&GameError::NotAPlayer).is_none());
    }

    #[test]
    fn error_codes_serialize_snake_case() {
        let msg = ServerMessage::error(ErrorCode::NotYourTurn, "Not your turn!");
        let json = msg.to_json().unwrap();
        assert!(json.contains("not_your_turn"));
    }
}
