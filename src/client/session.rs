//! Reconnecting client session.
//!
//! A background task owns the websocket. On every (re)connect it re-runs the
//! full handshake: open the socket, send `join_room` with the durable player
//! id, then rehydrate the local room view from the snapshots the server
//! pushes back. Unexpected closes schedule another attempt after a fixed
//! delay until the attempt budget runs out.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::client::storage::{KeyValueStorage, HOST_FLAG_KEY, PLAYER_ID_KEY};
use crate::config;
use crate::protocol::{ClientMessage, RoundContent, ScoreContent, ServerMessage, TurnContent};
use crate::room::Room;
use crate::util::id::new_player_id;

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Rounds played before the host's progression wraps into a game reset.
const DEFAULT_TOTAL_ROUNDS: u32 = 5;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// WebSocket endpoint, e.g. `ws://localhost:3001/ws`.
    pub url: String,
    /// Room to join. `None` means this client creates a room (and records
    /// itself as host) or gets auto-assigned a seat.
    pub room_id: Option<String>,
    /// Fixed delay between reconnect attempts.
    pub reconnect_delay: Duration,
    /// Attempts before the session gives up and goes terminal.
    pub max_reconnect_attempts: u32,
    /// Rounds per game, used by the host-side progression helpers.
    pub total_rounds: u32,
}

impl SessionConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            room_id: None,
            reconnect_delay: config::RECONNECT_DELAY,
            max_reconnect_attempts: config::MAX_RECONNECT_ATTEMPTS,
            total_rounds: DEFAULT_TOTAL_ROUNDS,
        }
    }

    #[must_use]
    pub fn with_room(mut self, room_id: impl Into<String>) -> Self {
        self.room_id = Some(room_id.into());
        self
    }

    #[must_use]
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    #[must_use]
    pub fn with_max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = attempts;
        self
    }

    #[must_use]
    pub fn with_total_rounds(mut self, rounds: u32) -> Self {
        self.total_rounds = rounds;
        self
    }
}

/// What the session surfaces to the embedding app.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The transport is up; the join handshake is in flight.
    Connected,
    RoomJoined { player_id: String, room: Room },
    RoomUpdated { room: Room },
    GameStarted,
    BoardUpdated { board: crate::game::Board },
    TurnUpdated { turn_index: usize },
    RoundUpdated { round_number: u32 },
    ScoreUpdated { player_id: String, points: u32 },
    Chat { player_id: String, content: String, timestamp: String },
    /// The server reported a protocol error; informational only.
    ServerError { message: String },
    /// The transport dropped; another attempt starts after the fixed delay.
    Reconnecting { attempt: u32 },
    /// No more attempts will be made. The embedder decides what to do next.
    Disconnected,
}

#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("not joined to a room")]
    NotJoined,
    #[error("session is shut down")]
    Closed,
}

struct Shared {
    player_id: String,
    created_room: bool,
    total_rounds: u32,
    storage: Arc<dyn KeyValueStorage>,
    /// Local room view, replaced wholesale by server snapshots.
    room: Mutex<Option<Room>>,
    /// Room to present on re-join. Survives transport drops, unlike `room`.
    last_room_id: Mutex<Option<String>>,
}

/// Spawner for the session task.
pub struct ClientSession;

impl ClientSession {
    /// Start a session. Returns a handle for driving it and the stream of
    /// events it emits. The session keeps reconnecting until the attempt
    /// budget is exhausted or [`SessionHandle::shutdown`] is called.
    pub fn spawn(
        config: SessionConfig,
        storage: Arc<dyn KeyValueStorage>,
    ) -> (SessionHandle, mpsc::UnboundedReceiver<SessionEvent>) {
        let player_id = ensure_player_id(&*storage);
        let created_room = config.room_id.is_none();
        if created_room {
            storage.set(HOST_FLAG_KEY, "true");
        }

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let shared = Arc::new(Shared {
            player_id,
            created_room,
            total_rounds: config.total_rounds,
            storage,
            room: Mutex::new(None),
            last_room_id: Mutex::new(config.room_id.clone()),
        });

        let handle = SessionHandle {
            outbound: out_tx,
            cancel: cancel.clone(),
            shared: shared.clone(),
        };
        tokio::spawn(run(config, shared, out_rx, event_tx, cancel));
        (handle, event_rx)
    }
}

/// Handle for sending into a running session.
#[derive(Clone)]
pub struct SessionHandle {
    outbound: mpsc::UnboundedSender<ClientMessage>,
    cancel: CancellationToken,
    shared: Arc<Shared>,
}

impl SessionHandle {
    pub fn player_id(&self) -> &str {
        &self.shared.player_id
    }

    /// Snapshot of the current room view, if joined.
    pub fn room(&self) -> Option<Room> {
        self.shared.room.lock().clone()
    }

    /// Whether this client is the room's host. Answered from the latest
    /// snapshot; before the first one arrives, from whether this session
    /// created the room.
    pub fn is_host(&self) -> bool {
        let room = self.shared.room.lock();
        match room.as_ref().and_then(|r| r.player(&self.shared.player_id)) {
            Some(player) => player.is_host,
            None => self.shared.created_room,
        }
    }

    fn joined_room_id(&self) -> Result<String, SessionError> {
        self.shared
            .room
            .lock()
            .as_ref()
            .map(|r| r.id.clone())
            .ok_or(SessionError::NotJoined)
    }

    fn send(&self, msg: ClientMessage) -> Result<(), SessionError> {
        self.outbound.send(msg).map_err(|_| SessionError::Closed)
    }

    pub fn start_game(&self) -> Result<(), SessionError> {
        let room_id = self.joined_room_id()?;
        self.send(ClientMessage::GameStart { room_id })
    }

    pub fn set_turn(&self, turn_index: usize) -> Result<(), SessionError> {
        let room_id = self.joined_room_id()?;
        self.send(ClientMessage::TurnUpdate {
            room_id,
            content: TurnContent { turn_index },
        })
    }

    pub fn set_round(&self, round_number: u32) -> Result<(), SessionError> {
        let room_id = self.joined_room_id()?;
        self.send(ClientMessage::RoundUpdate {
            room_id,
            content: RoundContent { round_number },
        })
    }

    pub fn set_score(&self, player_id: &str, points: u32) -> Result<(), SessionError> {
        let room_id = self.joined_room_id()?;
        self.send(ClientMessage::PlayerScoreUpdate {
            room_id,
            content: ScoreContent {
                player_id: player_id.to_owned(),
                points,
            },
        })
    }

    /// Host helper: pass the turn to the next player in join order, rolling
    /// into the next round when the order wraps.
    pub fn advance_turn(&self) -> Result<(), SessionError> {
        let room = self.room().ok_or(SessionError::NotJoined)?;
        if room.players.is_empty() {
            return Err(SessionError::NotJoined);
        }
        let next = (room.turn_index + 1) % room.players.len();
        if next == 0 {
            self.advance_round()
        } else {
            self.set_turn(next)
        }
    }

    /// Host helper: advance to the next round, or reset the game once the
    /// final round has been played.
    pub fn advance_round(&self) -> Result<(), SessionError> {
        let room = self.room().ok_or(SessionError::NotJoined)?;
        if room.round_number < self.shared.total_rounds {
            self.set_round(room.round_number + 1)
        } else {
            self.send(ClientMessage::GameReset { room_id: room.id })
        }
    }

    pub fn send_chat(&self, text: &str) -> Result<(), SessionError> {
        let room_id = self.joined_room_id()?;
        self.send(ClientMessage::GameMessage {
            room_id,
            player_id: self.shared.player_id.clone(),
            content: text.to_owned(),
            timestamp: None,
        })
    }

    /// Leave the current room deliberately. Host status does not carry over
    /// to the next room this client joins.
    pub fn leave_room(&self) -> Result<(), SessionError> {
        let room_id = self.joined_room_id()?;
        self.send(ClientMessage::LeaveRoom {
            room_id,
            player_id: self.shared.player_id.clone(),
        })?;
        self.shared.room.lock().take();
        self.shared.last_room_id.lock().take();
        self.shared.storage.remove(HOST_FLAG_KEY);
        Ok(())
    }

    /// Tear the session down: cancels any pending reconnect timer and closes
    /// the live connection.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

fn ensure_player_id(storage: &dyn KeyValueStorage) -> String {
    if let Some(id) = storage.get(PLAYER_ID_KEY) {
        return id;
    }
    let id = new_player_id();
    storage.set(PLAYER_ID_KEY, &id);
    id
}

async fn run(
    config: SessionConfig,
    shared: Arc<Shared>,
    mut out_rx: mpsc::UnboundedReceiver<ClientMessage>,
    events: mpsc::UnboundedSender<SessionEvent>,
    cancel: CancellationToken,
) {
    let mut attempts: u32 = 0;
    'session: loop {
        let stream = tokio::select! {
            _ = cancel.cancelled() => break 'session,
            res = connect_async(config.url.as_str()) => match res {
                Ok((stream, _)) => stream,
                Err(err) => {
                    warn!(%err, "websocket connect failed");
                    if !retry_after_delay(&config, &mut attempts, &events, &cancel).await {
                        break 'session;
                    }
                    continue 'session;
                }
            },
        };

        attempts = 0;
        let _ = events.send(SessionEvent::Connected);
        let (mut ws_tx, mut ws_rx) = stream.split();

        // re-run the join handshake with the durable identity
        let target = shared.last_room_id.lock().clone();
        let is_host = shared.storage.get(HOST_FLAG_KEY).as_deref() == Some("true");
        let join = ClientMessage::JoinRoom {
            room_id: target,
            player_id: shared.player_id.clone(),
            is_host,
        };
        if send_frame(&mut ws_tx, &join).await.is_err() {
            shared.room.lock().take();
            if !retry_after_delay(&config, &mut attempts, &events, &cancel).await {
                break 'session;
            }
            continue 'session;
        }

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    let _ = ws_tx.send(Message::Close(None)).await;
                    break 'session;
                }
                Some(msg) = out_rx.recv() => {
                    if send_frame(&mut ws_tx, &msg).await.is_err() {
                        break;
                    }
                }
                frame = ws_rx.next() => match frame {
                    Some(Ok(Message::Text(text))) => apply_frame(&shared, &events, text.as_str()),
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        warn!(%err, "websocket read failed");
                        break;
                    }
                },
            }
        }

        // unexpected close: drop the stale view but keep the room id so the
        // next attempt re-joins the same room
        shared.room.lock().take();
        if !retry_after_delay(&config, &mut attempts, &events, &cancel).await {
            break 'session;
        }
    }

    shared.room.lock().take();
    let _ = events.send(SessionEvent::Disconnected);
}

/// Wait out the fixed reconnect delay. Returns false when the attempt budget
/// is spent or the session was cancelled while waiting.
async fn retry_after_delay(
    config: &SessionConfig,
    attempts: &mut u32,
    events: &mpsc::UnboundedSender<SessionEvent>,
    cancel: &CancellationToken,
) -> bool {
    *attempts += 1;
    if *attempts > config.max_reconnect_attempts {
        return false;
    }
    let _ = events.send(SessionEvent::Reconnecting { attempt: *attempts });
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(config.reconnect_delay) => true,
    }
}

async fn send_frame(
    sink: &mut WsSink,
    msg: &ClientMessage,
) -> Result<(), tokio_tungstenite::tungstenite::Error> {
    let text = serde_json::to_string(msg).unwrap();
    sink.send(Message::text(text)).await
}

fn apply_frame(shared: &Shared, events: &mpsc::UnboundedSender<SessionEvent>, text: &str) {
    let msg = match serde_json::from_str::<ServerMessage>(text) {
        Ok(msg) => msg,
        Err(err) => {
            debug!(%err, "ignoring undecodable server frame");
            return;
        }
    };
    apply_server_message(shared, events, msg);
}

/// Fold one server message into the local view and surface it as an event.
/// Snapshots replace the view wholesale; targeted updates patch it.
fn apply_server_message(
    shared: &Shared,
    events: &mpsc::UnboundedSender<SessionEvent>,
    msg: ServerMessage,
) {
    match msg {
        ServerMessage::Connected { .. } => {}
        ServerMessage::RoomJoined { player_id, room } => {
            *shared.last_room_id.lock() = Some(room.id.clone());
            *shared.room.lock() = Some(room.clone());
            let _ = events.send(SessionEvent::RoomJoined { player_id, room });
        }
        ServerMessage::RoomUpdated { room } => {
            *shared.last_room_id.lock() = Some(room.id.clone());
            *shared.room.lock() = Some(room.clone());
            let _ = events.send(SessionEvent::RoomUpdated { room });
        }
        ServerMessage::GameStart => {
            if let Some(room) = shared.room.lock().as_mut() {
                room.status = crate::room::RoomStatus::Playing;
            }
            let _ = events.send(SessionEvent::GameStarted);
        }
        ServerMessage::GameboardUpdate { content } => {
            if let Some(room) = shared.room.lock().as_mut() {
                room.board = Some(content.board);
            }
            let _ = events.send(SessionEvent::BoardUpdated {
                board: content.board,
            });
        }
        ServerMessage::TurnUpdate { content } => {
            if let Some(room) = shared.room.lock().as_mut() {
                room.turn_index = content.turn_index;
            }
            let _ = events.send(SessionEvent::TurnUpdated {
                turn_index: content.turn_index,
            });
        }
        ServerMessage::RoundUpdate { content } => {
            if let Some(room) = shared.room.lock().as_mut() {
                room.round_number = content.round_number;
                // a new round rewinds the turn cursor
                room.turn_index = 0;
            }
            let _ = events.send(SessionEvent::RoundUpdated {
                round_number: content.round_number,
            });
        }
        ServerMessage::PlayerScoreUpdate { content } => {
            if let Some(room) = shared.room.lock().as_mut() {
                if let Some(player) = room.players.iter_mut().find(|p| p.id == content.player_id) {
                    player.points = content.points;
                }
            }
            let _ = events.send(SessionEvent::ScoreUpdated {
                player_id: content.player_id,
                points: content.points,
            });
        }
        ServerMessage::GameMessage {
            player_id,
            content,
            timestamp,
            ..
        } => {
            let _ = events.send(SessionEvent::Chat {
                player_id,
                content,
                timestamp,
            });
        }
        ServerMessage::Error { message } => {
            warn!(%message, "server reported an error");
            let _ = events.send(SessionEvent::ServerError { message });
        }
    }
}
