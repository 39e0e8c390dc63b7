//! Match State Definitions
//!
//! Authoritative state for exactly one 1v1 match: two fixed player slots,
//! a turn pointer, and a monotonic status. All transitions run through the
//! methods here (and through [`crate::game::combat::fire`] for shots), so a
//! session only ever mutates this state under its own serialization
//! primitive.

use serde::{Deserialize, Serialize};

use crate::game::board::Board;
use crate::game::fleet::FleetPlacement;

// =============================================================================
// CONNECTION ID
// =============================================================================

/// Opaque identifier for one live connection (UUID as bytes).
///
/// Implements Ord for deterministic BTreeMap ordering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub [u8; 16]);

impl ConnectionId {
    /// Create from raw bytes.
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Assign a fresh random identifier.
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().into_bytes())
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Short hex form for logs and generated usernames.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..3])
    }
}

// =============================================================================
// MATCH STATUS
// =============================================================================

/// Lifecycle of a match. Transitions are monotonic:
/// `Setup -> Playing -> Finished`, never backward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// Waiting for both fleet placements.
    Setup,
    /// Shots are being exchanged.
    Playing,
    /// Terminal: victory, forfeit, or disconnect.
    Finished,
}

// =============================================================================
// PLAYER SLOT
// =============================================================================

/// One player's slot within a match.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlayerSlot {
    /// Connection identifier, fixed at pairing.
    pub id: ConnectionId,

    /// Display name, fixed at pairing.
    pub username: String,

    /// Set once when the fleet placement is submitted.
    pub ready: bool,

    /// Submitted fleet; `None` until this player places.
    pub fleet: Option<FleetPlacement>,

    /// Shots received by this player.
    pub board: Board,

    /// Successful shots this player has landed on the opponent.
    /// Only ever increases.
    pub hits: u32,
}

impl PlayerSlot {
    fn new(id: ConnectionId, username: String) -> Self {
        Self {
            id,
            username,
            ready: false,
            fleet: None,
            board: Board::new(),
            hits: 0,
        }
    }
}

// =============================================================================
// GAME ERRORS
// =============================================================================

/// Rejections raised by state transitions and shot resolution.
///
/// Every variant is a protocol violation in the session's taxonomy: the
/// attempted operation leaves state untouched and the connection stays open.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    /// The connection is not one of this match's two players.
    #[error("connection is not a player in this match")]
    NotAPlayer,

    /// Placement attempted outside the setup phase.
    #[error("placement phase is over")]
    PlacementClosed,

    /// Placement attempted after this player already readied up.
    #[error("fleet already placed")]
    AlreadyReady,

    /// Shot or forfeit attempted while the match is not in play.
    #[error("match is not in play")]
    NotPlaying,

    /// Shot attempted by the player whose turn it is not.
    #[error("Not your turn!")]
    NotYourTurn,

    /// Shot coordinate off the 10x10 board.
    #[error("shot coordinate is off the board")]
    OutOfBounds,
}

// =============================================================================
// TRANSITION OUTCOMES
// =============================================================================

/// Result of a successful placement submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlacementOutcome {
    /// The non-submitting player, to receive the "opponent ready" notice.
    pub opponent: ConnectionId,
    /// True when this submission completed setup and play began.
    pub started: bool,
}

/// Result of a successful forfeit (or disconnect treated as forfeit).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForfeitOutcome {
    /// The surviving player.
    pub winner: ConnectionId,
    /// Surviving player's username, for score reporting.
    pub winner_username: String,
    /// Surviving player's hit count at the time of forfeit.
    pub winner_hits: u32,
    /// Leaving player's username, for the penalty report.
    pub leaver_username: String,
}

// =============================================================================
// MATCH STATE
// =============================================================================

/// Authoritative state for one match.
///
/// Player slots are fixed at creation; there are no late joins. The turn
/// pointer always names one of the two players while status is `Playing`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchState {
    players: [PlayerSlot; 2],
    current_turn: ConnectionId,
    status: MatchStatus,
}

impl MatchState {
    /// Create a match in setup. The first mover is the pairing requester:
    /// `requester` gets the opening turn, not the player popped from the
    /// waiting queue.
    pub fn new(
        requester: (ConnectionId, String),
        waiting: (ConnectionId, String),
    ) -> Self {
        let turn = requester.0;
        Self {
            players: [
                PlayerSlot::new(requester.0, requester.1),
                PlayerSlot::new(waiting.0, waiting.1),
            ],
            current_turn: turn,
            status: MatchStatus::Setup,
        }
    }

    /// Current lifecycle status.
    pub fn status(&self) -> MatchStatus {
        self.status
    }

    /// Connection whose turn it is.
    pub fn current_turn(&self) -> ConnectionId {
        self.current_turn
    }

    /// Slot index (0 or 1) for a connection, if it plays here.
    pub fn player_index(&self, id: ConnectionId) -> Option<usize> {
        self.players.iter().position(|p| p.id == id)
    }

    /// Whether the connection is one of this match's players.
    pub fn is_player(&self, id: ConnectionId) -> bool {
        self.player_index(id).is_some()
    }

    /// Player slot by index.
    pub fn player(&self, index: usize) -> &PlayerSlot {
        &self.players[index]
    }

    /// Both player connection ids, requester first.
    pub fn player_ids(&self) -> [ConnectionId; 2] {
        [self.players[0].id, self.players[1].id]
    }

    /// Record a fleet placement and mark the player ready.
    ///
    /// Valid only while status is `Setup` and the connection is a player
    /// here. Either player may place first; when the second placement lands
    /// the match transitions to `Playing`.
    pub fn submit_placement(
        &mut self,
        conn: ConnectionId,
        fleet: FleetPlacement,
    ) -> Result<PlacementOutcome, GameError> {
        if self.status != MatchStatus::Setup {
            return Err(GameError::PlacementClosed);
        }
        let index = self.player_index(conn).ok_or(GameError::NotAPlayer)?;
        if self.players[index].ready {
            return Err(GameError::AlreadyReady);
        }

        self.players[index].fleet = Some(fleet);
        self.players[index].ready = true;

        let started = self.players.iter().all(|p| p.ready);
        if started {
            self.status = MatchStatus::Playing;
        }

        Ok(PlacementOutcome {
            opponent: self.players[index ^ 1].id,
            started,
        })
    }

    /// Concede the match. Valid only while status is `Playing`.
    ///
    /// Also used for disconnects during active play, which score
    /// identically.
    pub fn forfeit(&mut self, conn: ConnectionId) -> Result<ForfeitOutcome, GameError> {
        if self.status != MatchStatus::Playing {
            return Err(GameError::NotPlaying);
        }
        let index = self.player_index(conn).ok_or(GameError::NotAPlayer)?;
        let winner = &self.players[index ^ 1];
        let outcome = ForfeitOutcome {
            winner: winner.id,
            winner_username: winner.username.clone(),
            winner_hits: winner.hits,
            leaver_username: self.players[index].username.clone(),
        };
        self.status = MatchStatus::Finished;
        Ok(outcome)
    }

    // Crate-internal mutators used by the combat engine.

    pub(crate) fn slot_mut(&mut self, index: usize) -> &mut PlayerSlot {
        &mut self.players[index]
    }

    pub(crate) fn set_turn(&mut self, id: ConnectionId) {
        self.current_turn = id;
    }

    pub(crate) fn finish(&mut self) {
        self.status = MatchStatus::Finished;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::board::Coord;
    use crate::game::fleet::ShipPlacement;

    fn test_fleet() -> FleetPlacement {
        FleetPlacement::new(vec![ShipPlacement {
            length: 2,
            positions: vec![Coord::new(0, 0), Coord::new(1, 0)],
        }])
    }

    fn test_match() -> (MatchState, ConnectionId, ConnectionId) {
        let a = ConnectionId::new([1; 16]);
        let b = ConnectionId::new([2; 16]);
        let state = MatchState::new((a, "alice".into()), (b, "bob".into()));
        (state, a, b)
    }

    #[test]
    fn requester_gets_opening_turn() {
        let (state, a, _) = test_match();
        assert_eq!(state.current_turn(), a);
        assert_eq!(state.status(), MatchStatus::Setup);
        assert_eq!(state.player_index(a), Some(0));
    }

    #[test]
    fn placement_in_either_order_starts_play() {
        let (mut state, a, b) = test_match();

        let first = state.submit_placement(b, test_fleet()).unwrap();
        assert_eq!(first.opponent, a);
        assert!(!first.started);
        assert_eq!(state.status(), MatchStatus::Setup);

        let second = state.submit_placement(a, test_fleet()).unwrap();
        assert_eq!(second.opponent, b);
        assert!(second.started);
        assert_eq!(state.status(), MatchStatus::Playing);
        // Turn pointer unchanged by placement order.
        assert_eq!(state.current_turn(), a);
    }

    #[test]
    fn placement_rejected_after_ready() {
        let (mut state, a, _) = test_match();
        state.submit_placement(a, test_fleet()).unwrap();
        assert_eq!(
            state.submit_placement(a, test_fleet()),
            Err(GameError::AlreadyReady)
        );
    }

    #[test]
    fn placement_rejected_for_outsider() {
        let (mut state, _, _) = test_match();
        let stranger = ConnectionId::new([9; 16]);
        assert_eq!(
            state.submit_placement(stranger, test_fleet()),
            Err(GameError::NotAPlayer)
        );
    }

    #[test]
    fn placement_rejected_once_playing() {
        let (mut state, a, b) = test_match();
        state.submit_placement(a, test_fleet()).unwrap();
        state.submit_placement(b, test_fleet()).unwrap();
        // Status is checked before the per-player ready flag.
        assert_eq!(
            state.submit_placement(a, test_fleet()),
            Err(GameError::PlacementClosed)
        );
    }

    #[test]
    fn forfeit_requires_active_play() {
        let (mut state, a, _) = test_match();
        assert_eq!(state.forfeit(a), Err(GameError::NotPlaying));
    }

    #[test]
    fn forfeit_finishes_and_names_survivor() {
        let (mut state, a, b) = test_match();
        state.submit_placement(a, test_fleet()).unwrap();
        state.submit_placement(b, test_fleet()).unwrap();

        let outcome = state.forfeit(a).unwrap();
        assert_eq!(outcome.winner, b);
        assert_eq!(outcome.winner_username, "bob");
        assert_eq!(outcome.winner_hits, 0);
        assert_eq!(outcome.leaver_username, "alice");
        assert_eq!(state.status(), MatchStatus::Finished);

        // Status is monotonic: a second forfeit is rejected.
        assert_eq!(state.forfeit(b), Err(GameError::NotPlaying));
    }
}
