//! WebSocket Game Server
//!
//! Accepts connections, assigns each an opaque [`ConnectionId`], and routes
//! decoded protocol events to the matchmaker and to sessions. Pairing is
//! synchronous: a `find_game` either pops the oldest waiting connection and
//! creates a session on the spot, or joins the FIFO queue.
//!
//! Every malformed or out-of-context event degrades to a no-op or a terse
//! error event; nothing at this layer terminates a connection except the
//! peer closing it.

use std::collections::{BTreeMap, VecDeque};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, error, info, warn};

use crate::game::board::Coord;
use crate::game::combat::CombatRules;
use crate::game::state::ConnectionId;
use crate::network::protocol::{ClientMessage, ErrorCode, ServerMessage};
use crate::network::session::{
    new_session_id, short_id, GameSession, SessionId, SessionManager, SessionPlayer,
};
use crate::score::ScoreReporter;

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Base URL of the score collaborator.
    pub score_api_url: String,
    /// Maximum concurrent connections.
    pub max_connections: usize,
    /// Combat rule toggles.
    pub rules: CombatRules,
    /// Server version string.
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".parse().expect("static bind addr"),
            score_api_url: "http://127.0.0.1:5000".to_string(),
            max_connections: 1000,
            rules: CombatRules::default(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl ServerConfig {
    /// Build from the environment: `PORT` for the listen port,
    /// `SCORE_API_URL` for the collaborator base URL.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(port) = std::env::var("PORT") {
            if let Ok(port) = port.parse::<u16>() {
                config.bind_addr.set_port(port);
            } else {
                warn!(port = %port, "ignoring unparseable PORT");
            }
        }
        if let Ok(url) = std::env::var("SCORE_API_URL") {
            config.score_api_url = url;
        }
        config
    }
}

/// Game server errors.
#[derive(Debug, thiserror::Error)]
pub enum GameServerError {
    /// Failed to bind to address.
    #[error("failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),
}

// =============================================================================
// SHARED STATE
// =============================================================================

/// Registry entry for one live connection.
struct ConnectedClient {
    /// Display name; set by the first `find_game`.
    username: Option<String>,
    /// Message channel to this client.
    sender: mpsc::Sender<ServerMessage>,
}

/// Matchmaking queue entry.
struct WaitingPlayer {
    id: ConnectionId,
    username: String,
    sender: mpsc::Sender<ServerMessage>,
}

/// State shared by every connection task.
///
/// Lock order (see the module docs in [`crate::network`]): clients, then
/// queue, then session directory, then an individual session. Nothing here
/// acquires an earlier lock while holding a later one.
#[derive(Clone)]
struct ServerState {
    clients: Arc<RwLock<BTreeMap<ConnectionId, ConnectedClient>>>,
    queue: Arc<RwLock<VecDeque<WaitingPlayer>>>,
    sessions: Arc<SessionManager>,
    reporter: Arc<dyn ScoreReporter>,
    rules: CombatRules,
}

impl ServerState {
    fn new(rules: CombatRules, reporter: Arc<dyn ScoreReporter>) -> Self {
        Self {
            clients: Arc::new(RwLock::new(BTreeMap::new())),
            queue: Arc::new(RwLock::new(VecDeque::new())),
            sessions: Arc::new(SessionManager::new()),
            reporter,
            rules,
        }
    }

    /// Register a new connection in the registry.
    async fn register(&self, conn: ConnectionId, sender: mpsc::Sender<ServerMessage>) {
        self.clients.write().await.insert(
            conn,
            ConnectedClient {
                username: None,
                sender,
            },
        );
    }

    /// Send a message to one connection, if it is still registered.
    async fn send(&self, conn: ConnectionId, message: ServerMessage) {
        let sender = {
            self.clients
                .read()
                .await
                .get(&conn)
                .map(|c| c.sender.clone())
        };
        if let Some(sender) = sender {
            let _ = sender.send(message).await;
        }
    }

    /// Route one decoded client event.
    async fn handle_message(&self, conn: ConnectionId, msg: ClientMessage) {
        match msg {
            ClientMessage::FindGame { username } => self.find_game(conn, username).await,
            ClientMessage::PlaceShips { ships } => self.place_ships(conn, ships).await,
            ClientMessage::Shoot { x, y } => self.shoot(conn, x, y).await,
            ClientMessage::Forfeit { session_id } => self.forfeit(conn, session_id).await,
            ClientMessage::Chat {
                session_id,
                message,
            } => self.chat(conn, session_id, message).await,
        }
    }

    /// Enqueue for matchmaking, or pair with the oldest waiting connection.
    async fn find_game(&self, conn: ConnectionId, username: Option<String>) {
        let username = validated_username(username, conn);
        {
            let mut clients = self.clients.write().await;
            if let Some(client) = clients.get_mut(&conn) {
                client.username = Some(username.clone());
            }
        }

        if self.sessions.session_for(conn).await.is_some() {
            self.send(
                conn,
                ServerMessage::error(ErrorCode::AlreadyInGame, "already in a game"),
            )
            .await;
            return;
        }

        let requester_sender = {
            self.clients
                .read()
                .await
                .get(&conn)
                .map(|c| c.sender.clone())
        };
        let Some(requester_sender) = requester_sender else {
            return;
        };

        let opponent = {
            let mut queue = self.queue.write().await;
            if queue.iter().any(|w| w.id == conn) {
                // Re-request while queued is idempotent.
                None
            } else if let Some(waiting) = queue.pop_front() {
                Some(waiting)
            } else {
                queue.push_back(WaitingPlayer {
                    id: conn,
                    username: username.clone(),
                    sender: requester_sender.clone(),
                });
                None
            }
        };

        let Some(waiting) = opponent else {
            info!(player = %conn.short(), username = %username, "waiting for opponent");
            self.send(conn, ServerMessage::Waiting).await;
            return;
        };

        let session = GameSession::new(
            new_session_id(),
            SessionPlayer {
                id: conn,
                username: username.clone(),
                sender: requester_sender,
            },
            SessionPlayer {
                id: waiting.id,
                username: waiting.username.clone(),
                sender: waiting.sender,
            },
            self.rules,
            Arc::clone(&self.reporter),
        );
        let session_id = session.id;

        info!(
            session = %short_id(&session_id),
            requester = %username,
            opponent = %waiting.username,
            "game created"
        );

        let session = self.sessions.insert(session).await;
        session.read().await.announce_paired().await;
    }

    /// Submit a fleet placement into the connection's session.
    async fn place_ships(&self, conn: ConnectionId, ships: Vec<crate::game::fleet::ShipPlacement>) {
        let Some(session) = self.sessions.session_for(conn).await else {
            debug!(player = %conn.short(), "placement for untracked session ignored");
            return;
        };

        let result = {
            let mut session = session.write().await;
            session.handle_place_ships(conn, ships).await
        };

        if let Err(violation) = result {
            if let Some(msg) = ServerMessage::from_violation(&violation) {
                self.send(conn, msg).await;
            }
        }
    }

    /// Fire at the opponent in the connection's session.
    async fn shoot(&self, conn: ConnectionId, x: u8, y: u8) {
        let Some(session) = self.sessions.session_for(conn).await else {
            debug!(player = %conn.short(), "shot for untracked session ignored");
            return;
        };

        let result = {
            let mut session = session.write().await;
            session.handle_shot(conn, Coord::new(x, y)).await
        };

        match result {
            Ok(true) => {
                let id = session.read().await.id;
                self.sessions.remove(&id).await;
            }
            Ok(false) => {}
            Err(violation) => {
                if let Some(msg) = ServerMessage::from_violation(&violation) {
                    self.send(conn, msg).await;
                }
            }
        }
    }

    /// Concede the connection's session. The payload session id is a
    /// fallback for clients whose registry mapping is already gone.
    async fn forfeit(&self, conn: ConnectionId, session_id: Option<SessionId>) {
        let session = match self.sessions.session_for(conn).await {
            Some(session) => Some(session),
            None => match session_id {
                Some(id) => self.sessions.get(&id).await,
                None => None,
            },
        };
        let Some(session) = session else {
            debug!(player = %conn.short(), "forfeit for untracked session ignored");
            return;
        };

        let result = {
            let mut session = session.write().await;
            session.handle_forfeit(conn).await
        };

        match result {
            Ok(true) => {
                let id = session.read().await.id;
                self.sessions.remove(&id).await;
            }
            Ok(false) => {}
            // Forfeiting a non-active session degrades to a no-op.
            Err(_) => {}
        }
    }

    /// Relay a chat line into a session, echoing to the sender as well.
    async fn chat(&self, conn: ConnectionId, session_id: SessionId, message: String) {
        let Some(session) = self.sessions.get(&session_id).await else {
            return;
        };

        let sender_name = {
            self.clients
                .read()
                .await
                .get(&conn)
                .and_then(|c| c.username.clone())
                .unwrap_or_else(|| "Player".to_string())
        };

        session
            .read()
            .await
            .relay_chat(conn, sender_name, message)
            .await;
    }

    /// Tear down a closed connection: leave the queue, settle the session,
    /// drop the registry entry.
    async fn disconnect(&self, conn: ConnectionId) {
        self.queue.write().await.retain(|w| w.id != conn);

        if let Some(session) = self.sessions.session_for(conn).await {
            let id = {
                let mut session = session.write().await;
                session.handle_disconnect(conn).await;
                session.id
            };
            self.sessions.remove(&id).await;
        }

        self.clients.write().await.remove(&conn);
        info!(player = %conn.short(), "connection cleaned up");
    }
}

/// Trim the requested username; blank or absent gets a generated
/// placeholder derived from the connection id.
fn validated_username(username: Option<String>, conn: ConnectionId) -> String {
    match username.map(|u| u.trim().to_owned()) {
        Some(u) if !u.is_empty() => u,
        _ => format!("Player_{}", conn.short()),
    }
}

// =============================================================================
// SERVER
// =============================================================================

/// The game server.
pub struct GameServer {
    config: ServerConfig,
    state: ServerState,
    shutdown_tx: broadcast::Sender<()>,
}

impl GameServer {
    /// Create a server with the given score collaborator.
    pub fn new(config: ServerConfig, reporter: Arc<dyn ScoreReporter>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        let state = ServerState::new(config.rules, reporter);
        Self {
            config,
            state,
            shutdown_tx,
        }
    }

    /// Run the accept loop until shutdown.
    pub async fn run(&self) -> Result<(), GameServerError> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        info!(addr = %self.config.bind_addr, version = %self.config.version, "game server listening");

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            if self.state.clients.read().await.len() >= self.config.max_connections {
                                warn!(%addr, "connection limit reached, rejecting");
                                continue;
                            }
                            self.spawn_connection(stream, addr);
                        }
                        Err(e) => error!(error = %e, "accept error"),
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("shutdown signal received");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Drive one WebSocket connection to completion.
    fn spawn_connection(&self, stream: TcpStream, addr: SocketAddr) {
        let state = self.state.clone();

        tokio::spawn(async move {
            let ws_stream = match accept_async(stream).await {
                Ok(ws) => ws,
                Err(e) => {
                    error!(%addr, error = %e, "websocket handshake failed");
                    return;
                }
            };

            let conn = ConnectionId::random();
            info!(%addr, player = %conn.short(), "player connected");

            let (mut ws_sender, mut ws_receiver) = ws_stream.split();
            let (msg_tx, mut msg_rx) = mpsc::channel::<ServerMessage>(64);
            state.register(conn, msg_tx.clone()).await;

            // Outbound pump: serialize and forward until the channel or the
            // socket closes.
            let pump = tokio::spawn(async move {
                while let Some(msg) = msg_rx.recv().await {
                    let text = match msg.to_json() {
                        Ok(t) => t,
                        Err(e) => {
                            error!(error = %e, "failed to serialize message");
                            continue;
                        }
                    };
                    if ws_sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
            });

            while let Some(frame) = ws_receiver.next().await {
                match frame {
                    Ok(Message::Text(text)) => match ClientMessage::from_json(&text) {
                        Ok(msg) => state.handle_message(conn, msg).await,
                        Err(e) => {
                            debug!(player = %conn.short(), error = %e, "undecodable message");
                            let _ = msg_tx
                                .send(ServerMessage::error(
                                    ErrorCode::InvalidMessage,
                                    "invalid message format",
                                ))
                                .await;
                        }
                    },
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {} // ping/pong/binary frames carry no game events
                    Err(e) => {
                        debug!(player = %conn.short(), error = %e, "websocket error");
                        break;
                    }
                }
            }

            pump.abort();
            state.disconnect(conn).await;
        });
    }

    /// Signal the accept loop to stop.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Live connection count.
    pub async fn connection_count(&self) -> usize {
        self.state.clients.read().await.len()
    }

    /// Waiting-queue length.
    pub async fn queue_len(&self) -> usize {
        self.state.queue.read().await.len()
    }

    /// Active session count.
    pub async fn session_count(&self) -> usize {
        self.state.sessions.count().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::fleet::ShipPlacement;
    use crate::score::testing::RecordingReporter;

    fn ships() -> Vec<ShipPlacement> {
        vec![ShipPlacement {
            length: 2,
            positions: vec![Coord::new(0, 0), Coord::new(1, 0)],
        }]
    }

    struct Client {
        id: ConnectionId,
        rx: mpsc::Receiver<ServerMessage>,
    }

    async fn connect(state: &ServerState, byte: u8) -> Client {
        let id = ConnectionId::new([byte; 16]);
        let (tx, rx) = mpsc::channel(64);
        state.register(id, tx).await;
        Client { id, rx }
    }

    fn drain(client: &mut Client) -> Vec<ServerMessage> {
        let mut out = Vec::new();
        while let Ok(msg) = client.rx.try_recv() {
            out.push(msg);
        }
        out
    }

    fn test_state() -> (ServerState, Arc<RecordingReporter>) {
        let reporter = RecordingReporter::new();
        (
            ServerState::new(CombatRules::default(), reporter.clone()),
            reporter,
        )
    }

    #[tokio::test]
    async fn first_seeker_waits_second_pairs() {
        let (state, _) = test_state();
        let mut a = connect(&state, 1).await;
        let mut b = connect(&state, 2).await;

        state.find_game(a.id, Some("alice".into())).await;
        assert!(matches!(drain(&mut a).as_slice(), [ServerMessage::Waiting]));

        state.find_game(b.id, Some("bob".into())).await;
        // Requester (b) is index 0 and holds the opening turn.
        let to_b = drain(&mut b);
        assert!(matches!(
            &to_b[0],
            ServerMessage::GameFound { player_index: 0, opponent_name, .. }
                if opponent_name == "alice"
        ));
        let to_a = drain(&mut a);
        assert!(matches!(
            &to_a[0],
            ServerMessage::GameFound { player_index: 1, opponent_name, .. }
                if opponent_name == "bob"
        ));
        assert_eq!(state.sessions.count().await, 1);
        assert!(state.queue.read().await.is_empty());
    }

    #[tokio::test]
    async fn queue_is_strict_fifo() {
        let (state, _) = test_state();
        let mut a = connect(&state, 1).await;
        let mut b = connect(&state, 2).await;
        let mut c = connect(&state, 3).await;

        state.find_game(a.id, Some("alice".into())).await;
        state.find_game(b.id, Some("bob".into())).await;
        // a+b paired; c waits alone.
        state.find_game(c.id, Some("carol".into())).await;

        drain(&mut a);
        drain(&mut b);
        assert!(matches!(drain(&mut c).as_slice(), [ServerMessage::Waiting]));
        assert_eq!(state.queue.read().await.len(), 1);
    }

    #[tokio::test]
    async fn repeat_find_game_while_queued_is_idempotent() {
        let (state, _) = test_state();
        let mut a = connect(&state, 1).await;

        state.find_game(a.id, Some("alice".into())).await;
        state.find_game(a.id, Some("alice".into())).await;

        // A connection never plays itself.
        assert_eq!(state.sessions.count().await, 0);
        assert_eq!(state.queue.read().await.len(), 1);
        let msgs = drain(&mut a);
        assert!(msgs
            .iter()
            .all(|m| matches!(m, ServerMessage::Waiting)));
    }

    #[tokio::test]
    async fn find_game_while_in_session_is_rejected() {
        let (state, _) = test_state();
        let mut a = connect(&state, 1).await;
        let mut b = connect(&state, 2).await;
        state.find_game(a.id, Some("alice".into())).await;
        state.find_game(b.id, Some("bob".into())).await;
        drain(&mut a);
        drain(&mut b);

        state.find_game(a.id, Some("alice".into())).await;
        let msgs = drain(&mut a);
        assert!(matches!(
            &msgs[0],
            ServerMessage::Error(err) if err.code == ErrorCode::AlreadyInGame
        ));
        assert_eq!(state.sessions.count().await, 1);
    }

    #[tokio::test]
    async fn blank_username_gets_generated_placeholder() {
        let (state, _) = test_state();
        let mut a = connect(&state, 1).await;
        let mut b = connect(&state, 2).await;

        state.find_game(a.id, Some("   ".into())).await;
        state.find_game(b.id, None).await;
        drain(&mut b);

        let to_a = drain(&mut a);
        let expected = format!("Player_{}", b.id.short());
        assert!(to_a.iter().any(|m| matches!(
            m,
            ServerMessage::GameFound { opponent_name, .. } if *opponent_name == expected
        )));
    }

    #[tokio::test]
    async fn out_of_turn_shot_gets_error_event() {
        let (state, _) = test_state();
        let mut a = connect(&state, 1).await;
        let mut b = connect(&state, 2).await;
        state.find_game(a.id, Some("alice".into())).await;
        state.find_game(b.id, Some("bob".into())).await;
        state.place_ships(a.id, ships()).await;
        state.place_ships(b.id, ships()).await;
        drain(&mut a);
        drain(&mut b);

        // b requested second, so b holds the opening turn; a is out of turn.
        state.shoot(a.id, 5, 5).await;
        let msgs = drain(&mut a);
        assert!(matches!(
            &msgs[0],
            ServerMessage::Error(err)
                if err.code == ErrorCode::NotYourTurn && err.message == "Not your turn!"
        ));
        assert!(drain(&mut b).is_empty());
    }

    #[tokio::test]
    async fn victory_disposes_the_session() {
        let (state, reporter) = test_state();
        let mut a = connect(&state, 1).await;
        let mut b = connect(&state, 2).await;
        state.find_game(a.id, Some("alice".into())).await;
        state.find_game(b.id, Some("bob".into())).await;
        state.place_ships(a.id, ships()).await;
        state.place_ships(b.id, ships()).await;

        // b opens; sinks a's two-cell ship with a miss from a in between.
        state.shoot(b.id, 0, 0).await;
        state.shoot(a.id, 9, 9).await;
        state.shoot(b.id, 1, 0).await;

        let to_a = drain(&mut a);
        assert!(to_a
            .iter()
            .any(|m| matches!(m, ServerMessage::GameOver { winner } if *winner == b.id)));

        assert_eq!(state.sessions.count().await, 0);
        assert!(state.sessions.session_for(a.id).await.is_none());

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        let mut reports = reporter.reports();
        reports.sort();
        assert_eq!(
            reports,
            vec![("alice".to_owned(), 0), ("bob".to_owned(), 180)]
        );
        let _ = drain(&mut b);
    }

    #[tokio::test]
    async fn disconnect_while_waiting_leaves_the_queue() {
        let (state, _) = test_state();
        let a = connect(&state, 1).await;
        state.find_game(a.id, Some("alice".into())).await;
        assert_eq!(state.queue.read().await.len(), 1);

        state.disconnect(a.id).await;
        assert!(state.queue.read().await.is_empty());
        assert!(state.clients.read().await.is_empty());
    }

    #[tokio::test]
    async fn disconnect_mid_game_settles_and_disposes() {
        let (state, reporter) = test_state();
        let mut a = connect(&state, 1).await;
        let mut b = connect(&state, 2).await;
        state.find_game(a.id, Some("alice".into())).await;
        state.find_game(b.id, Some("bob".into())).await;
        state.place_ships(a.id, ships()).await;
        state.place_ships(b.id, ships()).await;
        drain(&mut a);
        drain(&mut b);

        state.disconnect(a.id).await;

        assert!(matches!(
            drain(&mut b).as_slice(),
            [ServerMessage::OpponentDisconnected]
        ));
        assert_eq!(state.sessions.count().await, 0);
        assert!(state.sessions.session_for(b.id).await.is_none());

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        let mut reports = reporter.reports();
        reports.sort();
        assert_eq!(
            reports,
            vec![("alice".to_owned(), -50), ("bob".to_owned(), 150)]
        );
    }

    #[tokio::test]
    async fn forfeit_settles_and_disposes() {
        let (state, reporter) = test_state();
        let mut a = connect(&state, 1).await;
        let mut b = connect(&state, 2).await;
        state.find_game(a.id, Some("alice".into())).await;
        state.find_game(b.id, Some("bob".into())).await;
        state.place_ships(a.id, ships()).await;
        state.place_ships(b.id, ships()).await;

        let session_id = {
            let session = state.sessions.session_for(a.id).await.unwrap();
            let id = session.read().await.id;
            id
        };
        drain(&mut a);
        drain(&mut b);

        state.forfeit(a.id, Some(session_id)).await;

        assert!(matches!(
            drain(&mut b).as_slice(),
            [ServerMessage::OpponentForfeited]
        ));
        assert_eq!(state.sessions.count().await, 0);

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(reporter.reports().len(), 2);
    }

    #[tokio::test]
    async fn outsider_forfeit_via_payload_session_id_is_a_no_op() {
        let (state, _) = test_state();
        let mut a = connect(&state, 1).await;
        let mut b = connect(&state, 2).await;
        state.find_game(a.id, Some("alice".into())).await;
        state.find_game(b.id, Some("bob".into())).await;
        state.place_ships(a.id, ships()).await;
        state.place_ships(b.id, ships()).await;

        let session_id = {
            let session = state.sessions.session_for(a.id).await.unwrap();
            let id = session.read().await.id;
            id
        };
        drain(&mut a);
        drain(&mut b);

        // The payload id resolves the session, but a non-player's forfeit
        // is rejected silently and settles nothing.
        let mut c = connect(&state, 3).await;
        state.forfeit(c.id, Some(session_id)).await;

        assert_eq!(state.sessions.count().await, 1);
        assert!(drain(&mut a).is_empty());
        assert!(drain(&mut b).is_empty());
        assert!(drain(&mut c).is_empty());
    }

    #[tokio::test]
    async fn events_for_unknown_sessions_are_no_ops() {
        let (state, _) = test_state();
        let mut a = connect(&state, 1).await;

        state.shoot(a.id, 0, 0).await;
        state.place_ships(a.id, ships()).await;
        state.forfeit(a.id, Some([99; 16])).await;
        state.chat(a.id, [99; 16], "anyone there?".into()).await;

        assert!(drain(&mut a).is_empty());
    }

    #[tokio::test]
    async fn chat_relays_with_sender_identity() {
        let (state, _) = test_state();
        let mut a = connect(&state, 1).await;
        let mut b = connect(&state, 2).await;
        state.find_game(a.id, Some("alice".into())).await;
        state.find_game(b.id, Some("bob".into())).await;

        let session_id = {
            let session = state.sessions.session_for(a.id).await.unwrap();
            let id = session.read().await.id;
            id
        };
        drain(&mut a);
        drain(&mut b);

        let a_id = a.id;
        state.chat(a_id, session_id, "gl hf".into()).await;

        for client in [&mut a, &mut b] {
            let msgs = drain(client);
            assert!(matches!(
                &msgs[0],
                ServerMessage::Chat { message, sender_name, sender_id }
                    if message == "gl hf" && sender_name == "alice" && *sender_id == a_id
            ));
        }
    }

    #[test]
    fn config_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.score_api_url, "http://127.0.0.1:5000");
        assert!(config.rules.check_bounds);
        assert!(config.rules.count_repeat_hits);
    }

    #[tokio::test]
    async fn server_counters_start_empty() {
        let reporter = RecordingReporter::new();
        let server = GameServer::new(ServerConfig::default(), reporter);
        assert_eq!(server.connection_count().await, 0);
        assert_eq!(server.queue_len().await, 0);
        assert_eq!(server.session_count().await, 0);
        server.shutdown();
    }
}
