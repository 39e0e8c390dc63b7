//! Game Session Management
//!
//! One [`GameSession`] owns the authoritative state for one 1v1 match plus
//! the outbound channels to its two players. Every mutating operation on a
//! session (placement, shot, forfeit, disconnect) runs under the session's
//! `RwLock` write guard, so a shot and a concurrent forfeit from the other
//! player can never interleave.
//!
//! The [`SessionManager`] is the global session directory: session id to
//! session, plus connection id to session id. Its locks are independent of
//! any individual session's lock; see the module docs in
//! [`crate::network`] for the ordering discipline.

use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::info;

use crate::game::combat::{self, CombatRules};
use crate::game::fleet::FleetPlacement;
use crate::game::state::{ConnectionId, GameError, MatchState, MatchStatus};
use crate::network::protocol::ServerMessage;
use crate::score::{self, ScoreReporter, LEAVER_PENALTY};

/// Unique session identifier.
pub type SessionId = [u8; 16];

/// Generate a fresh session identifier.
pub fn new_session_id() -> SessionId {
    uuid::Uuid::new_v4().into_bytes()
}

/// Short hex form of a session id for log lines.
pub(crate) fn short_id(id: &SessionId) -> String {
    hex::encode(&id[..4])
}

/// One player's endpoint within a session: identity plus outbound channel.
#[derive(Clone)]
pub struct SessionPlayer {
    /// Connection identifier.
    pub id: ConnectionId,
    /// Validated display name.
    pub username: String,
    /// Message channel to this player.
    pub sender: mpsc::Sender<ServerMessage>,
}

/// A live match: authoritative state plus both players' channels.
pub struct GameSession {
    /// Unique session identifier.
    pub id: SessionId,
    state: MatchState,
    rules: CombatRules,
    // Parallel to the match state's slots: [0] requester, [1] popped waiter.
    senders: [mpsc::Sender<ServerMessage>; 2],
    reporter: Arc<dyn ScoreReporter>,
}

impl GameSession {
    /// Create a session from a pairing. `requester` triggered the match and
    /// holds the opening turn; `waiting` was popped from the queue.
    pub fn new(
        id: SessionId,
        requester: SessionPlayer,
        waiting: SessionPlayer,
        rules: CombatRules,
        reporter: Arc<dyn ScoreReporter>,
    ) -> Self {
        let state = MatchState::new(
            (requester.id, requester.username),
            (waiting.id, waiting.username),
        );
        Self {
            id,
            state,
            rules,
            senders: [requester.sender, waiting.sender],
            reporter,
        }
    }

    /// Read access to the match state.
    pub fn state(&self) -> &MatchState {
        &self.state
    }

    /// Current lifecycle status.
    pub fn status(&self) -> MatchStatus {
        self.state.status()
    }

    /// Both player connection ids, requester first.
    pub fn player_ids(&self) -> [ConnectionId; 2] {
        self.state.player_ids()
    }

    /// Whether `conn` plays in this session.
    pub fn is_player(&self, conn: ConnectionId) -> bool {
        self.state.is_player(conn)
    }

    /// Send the pairing result to both players, with each side's index and
    /// opponent identity.
    pub async fn announce_paired(&self) {
        for index in 0..2 {
            let opponent = self.state.player(index ^ 1);
            let msg = ServerMessage::GameFound {
                session_id: self.id,
                player_index: index as u8,
                opponent_id: opponent.id,
                opponent_name: opponent.username.clone(),
            };
            let _ = self.senders[index].send(msg).await;
        }
    }

    /// Record a fleet placement. On success the non-submitting player gets
    /// an "opponent ready" notice; when both are ready, both get
    /// "game start" with the turn pointer.
    pub async fn handle_place_ships(
        &mut self,
        conn: ConnectionId,
        ships: Vec<crate::game::fleet::ShipPlacement>,
    ) -> Result<(), GameError> {
        let outcome = self
            .state
            .submit_placement(conn, FleetPlacement::new(ships))?;

        info!(
            session = %short_id(&self.id),
            player = %conn.short(),
            "fleet placed"
        );

        self.send_to(outcome.opponent, ServerMessage::OpponentReady)
            .await;

        if outcome.started {
            let current_turn = self.state.current_turn();
            info!(session = %short_id(&self.id), "both fleets placed, game starting");
            self.broadcast(ServerMessage::GameStart { current_turn }).await;
        }
        Ok(())
    }

    /// Resolve one shot. Broadcasts the result to both players, then either
    /// flips the turn or ends the game and reports both scores.
    ///
    /// Returns true when the session reached its terminal state and is
    /// eligible for disposal.
    pub async fn handle_shot(
        &mut self,
        conn: ConnectionId,
        target: crate::game::board::Coord,
    ) -> Result<bool, GameError> {
        let shot = combat::fire(&mut self.state, &self.rules, conn, target)?;

        self.broadcast(ServerMessage::ShotResult {
            shooter_id: shot.shooter,
            x: shot.target.x,
            y: shot.target.y,
            hit: shot.hit,
        })
        .await;

        if shot.victory {
            self.broadcast(ServerMessage::GameOver { winner: shot.shooter })
                .await;

            let winner_index = self
                .state
                .player_index(shot.shooter)
                .ok_or(GameError::NotAPlayer)?;
            let winner = self.state.player(winner_index);
            let loser = self.state.player(winner_index ^ 1);

            info!(
                session = %short_id(&self.id),
                winner = %winner.username,
                winner_hits = winner.hits,
                loser = %loser.username,
                loser_hits = loser.hits,
                "fleet sunk, game over"
            );

            score::dispatch(
                &self.reporter,
                &winner.username,
                score::winner_delta(winner.hits),
            );
            score::dispatch(
                &self.reporter,
                &loser.username,
                score::loser_delta(loser.hits),
            );
            return Ok(true);
        }

        if let Some(current_turn) = shot.next_turn {
            self.broadcast(ServerMessage::TurnChange { current_turn })
                .await;
        }
        Ok(false)
    }

    /// Concede the match: the opponent is notified directly, the forfeiter
    /// takes the flat penalty, the survivor gets the win award.
    ///
    /// Returns true when the session finished and is eligible for disposal.
    pub async fn handle_forfeit(&mut self, conn: ConnectionId) -> Result<bool, GameError> {
        let outcome = self.state.forfeit(conn)?;

        info!(
            session = %short_id(&self.id),
            forfeiter = %outcome.leaver_username,
            winner = %outcome.winner_username,
            "player forfeited"
        );

        self.send_to(outcome.winner, ServerMessage::OpponentForfeited)
            .await;

        score::dispatch(&self.reporter, &outcome.leaver_username, LEAVER_PENALTY);
        score::dispatch(
            &self.reporter,
            &outcome.winner_username,
            score::winner_delta(outcome.winner_hits),
        );
        Ok(true)
    }

    /// Handle a player's connection dropping.
    ///
    /// Mid-game this scores exactly like a forfeit; in setup or after the
    /// game finished, the opponent is notified without score adjustment.
    /// The session is disposed by the caller in every case.
    pub async fn handle_disconnect(&mut self, conn: ConnectionId) {
        let Some(index) = self.state.player_index(conn) else {
            return;
        };

        if self.state.status() == MatchStatus::Playing {
            // forfeit() cannot fail here: status is Playing and conn is a
            // player, so a rejection would be a state-machine bug.
            if let Ok(outcome) = self.state.forfeit(conn) {
                info!(
                    session = %short_id(&self.id),
                    leaver = %outcome.leaver_username,
                    winner = %outcome.winner_username,
                    "player disconnected mid-game"
                );
                score::dispatch(&self.reporter, &outcome.leaver_username, LEAVER_PENALTY);
                score::dispatch(
                    &self.reporter,
                    &outcome.winner_username,
                    score::winner_delta(outcome.winner_hits),
                );
            }
        } else {
            info!(
                session = %short_id(&self.id),
                player = %conn.short(),
                "player disconnected outside active play"
            );
        }

        let opponent = self.state.player(index ^ 1).id;
        self.send_to(opponent, ServerMessage::OpponentDisconnected)
            .await;
    }

    /// Relay a chat line to every player in the session, sender included.
    pub async fn relay_chat(
        &self,
        sender_id: ConnectionId,
        sender_name: String,
        message: String,
    ) {
        self.broadcast(ServerMessage::Chat {
            message,
            sender_id,
            sender_name,
        })
        .await;
    }

    /// Send a message to one player by connection id.
    async fn send_to(&self, conn: ConnectionId, message: ServerMessage) {
        if let Some(index) = self.state.player_index(conn) {
            let _ = self.senders[index].send(message).await;
        }
    }

    /// Send a message to both players.
    async fn broadcast(&self, message: ServerMessage) {
        for sender in &self.senders {
            let _ = sender.send(message.clone()).await;
        }
    }
}

// =============================================================================
// SESSION MANAGER
// =============================================================================

/// Directory of all active sessions.
pub struct SessionManager {
    /// Active sessions.
    sessions: RwLock<BTreeMap<SessionId, Arc<RwLock<GameSession>>>>,
    /// Connection to session mapping.
    connection_sessions: RwLock<BTreeMap<ConnectionId, SessionId>>,
}

impl SessionManager {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(BTreeMap::new()),
            connection_sessions: RwLock::new(BTreeMap::new()),
        }
    }

    /// Insert a session and register both players.
    pub async fn insert(&self, session: GameSession) -> Arc<RwLock<GameSession>> {
        let id = session.id;
        let players = session.player_ids();
        let session = Arc::new(RwLock::new(session));

        self.sessions.write().await.insert(id, session.clone());
        let mut map = self.connection_sessions.write().await;
        for conn in players {
            map.insert(conn, id);
        }
        session
    }

    /// Look up a session by id.
    pub async fn get(&self, id: &SessionId) -> Option<Arc<RwLock<GameSession>>> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Look up the session a connection plays in.
    pub async fn session_for(&self, conn: ConnectionId) -> Option<Arc<RwLock<GameSession>>> {
        let id = *self.connection_sessions.read().await.get(&conn)?;
        self.get(&id).await
    }

    /// Remove a session and clear both connections' session identifiers.
    pub async fn remove(&self, id: &SessionId) {
        let session = self.sessions.write().await.remove(id);
        if let Some(session) = session {
            let players = session.read().await.player_ids();
            let mut map = self.connection_sessions.write().await;
            for conn in players {
                if map.get(&conn) == Some(id) {
                    map.remove(&conn);
                }
            }
        }
    }

    /// Active session count.
    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}
