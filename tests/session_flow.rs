//! End-to-end scenarios over real listeners: session clients and raw
//! websocket clients against the realtime server.

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use wordwave::client::{ClientSession, MemoryStorage, SessionConfig, SessionEvent};
use wordwave::http::routes::{realtime_router, AppState};
use wordwave::protocol::{ClientMessage, ServerMessage, TurnContent};
use wordwave::room::RoomStatus;

const WAIT: Duration = Duration::from_secs(5);

async fn start_server() -> String {
    let state = AppState::new();
    let router = realtime_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("ws://{addr}/ws")
}

async fn wait_for<F, T>(rx: &mut UnboundedReceiver<SessionEvent>, mut pred: F) -> T
where
    F: FnMut(&SessionEvent) -> Option<T>,
{
    loop {
        let event = timeout(WAIT, rx.recv())
            .await
            .expect("timed out waiting for session event")
            .expect("session event channel closed");
        if let Some(out) = pred(&event) {
            return out;
        }
    }
}

struct RawClient {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl RawClient {
    async fn connect(url: &str) -> Self {
        let (ws, _) = connect_async(url).await.unwrap();
        Self { ws }
    }

    async fn send_msg(&mut self, msg: &ClientMessage) {
        let text = serde_json::to_string(msg).unwrap();
        self.ws.send(Message::text(text)).await.unwrap();
    }

    async fn send_raw(&mut self, text: &str) {
        self.ws.send(Message::text(text.to_owned())).await.unwrap();
    }

    async fn recv_until<F, T>(&mut self, mut pred: F) -> T
    where
        F: FnMut(&ServerMessage) -> Option<T>,
    {
        loop {
            let frame = timeout(WAIT, self.ws.next())
                .await
                .expect("timed out waiting for server frame")
                .expect("connection closed")
                .unwrap();
            if let Message::Text(text) = frame {
                let msg: ServerMessage = serde_json::from_str(text.as_str()).unwrap();
                if let Some(out) = pred(&msg) {
                    return out;
                }
            }
        }
    }

    async fn expect_silence(&mut self, window: Duration) {
        if let Ok(frame) = timeout(window, self.ws.next()).await {
            panic!("expected no frame, got {frame:?}");
        }
    }

    fn join(room_id: &str, player_id: &str) -> ClientMessage {
        ClientMessage::JoinRoom {
            room_id: Some(room_id.to_owned()),
            player_id: player_id.to_owned(),
            is_host: false,
        }
    }
}

#[tokio::test]
async fn two_sessions_share_a_room_and_start_the_game() {
    let url = start_server().await;

    let (host, mut host_events) =
        ClientSession::spawn(SessionConfig::new(&url), Arc::new(MemoryStorage::new()));
    let room_id = wait_for(&mut host_events, |e| match e {
        SessionEvent::RoomJoined { room, .. } => Some(room.id.clone()),
        _ => None,
    })
    .await;
    assert!(host.is_host());

    // second client gives no room id and lands in the first open room
    let (guest, mut guest_events) =
        ClientSession::spawn(SessionConfig::new(&url), Arc::new(MemoryStorage::new()));
    let guest_room = wait_for(&mut guest_events, |e| match e {
        SessionEvent::RoomJoined { room, .. } => Some(room.clone()),
        _ => None,
    })
    .await;
    assert_eq!(guest_room.id, room_id);
    assert_eq!(guest_room.players.len(), 2);
    assert!(!guest.is_host(), "second joiner never becomes host");

    wait_for(&mut host_events, |e| match e {
        SessionEvent::RoomUpdated { room } if room.players.len() == 2 => Some(()),
        _ => None,
    })
    .await;

    host.start_game().unwrap();
    for events in [&mut host_events, &mut guest_events] {
        wait_for(events, |e| matches!(e, SessionEvent::GameStarted).then_some(())).await;
        wait_for(events, |e| match e {
            SessionEvent::RoundUpdated { round_number: 1 } => Some(()),
            _ => None,
        })
        .await;
    }

    let host_view = host.room().unwrap();
    let guest_view = guest.room().unwrap();
    assert_eq!(host_view.status, RoomStatus::Playing);
    assert_eq!(host_view.round_number, 1);
    assert_eq!(host_view.turn_index, 0);
    assert!(host_view.board.is_some());
    assert_eq!(host_view.board, guest_view.board, "both clients see one board");

    host.shutdown();
    guest.shutdown();
}

#[tokio::test]
async fn dropped_player_rejoins_with_its_durable_id() {
    let url = start_server().await;

    let (host, mut host_events) =
        ClientSession::spawn(SessionConfig::new(&url), Arc::new(MemoryStorage::new()));
    let room_id = wait_for(&mut host_events, |e| match e {
        SessionEvent::RoomJoined { room, .. } => Some(room.id.clone()),
        _ => None,
    })
    .await;

    let mut flaky = RawClient::connect(&url).await;
    flaky.send_msg(&RawClient::join(&room_id, "p-flaky")).await;
    flaky
        .recv_until(|msg| match msg {
            ServerMessage::RoomJoined { room, .. } if room.players.len() == 2 => Some(()),
            _ => None,
        })
        .await;
    wait_for(&mut host_events, |e| match e {
        SessionEvent::RoomUpdated { room } if room.players.len() == 2 => Some(()),
        _ => None,
    })
    .await;

    // the transport dies without a goodbye
    drop(flaky);
    wait_for(&mut host_events, |e| match e {
        SessionEvent::RoomUpdated { room }
            if room.players.len() == 1 && !room.has_player("p-flaky") =>
        {
            Some(())
        }
        _ => None,
    })
    .await;

    // a fresh connection presents the same durable id and gets a full
    // snapshot back, not a diff
    let mut returned = RawClient::connect(&url).await;
    returned.send_msg(&RawClient::join(&room_id, "p-flaky")).await;
    let room = returned
        .recv_until(|msg| match msg {
            ServerMessage::RoomJoined { player_id, room } if player_id == "p-flaky" => {
                Some(room.clone())
            }
            _ => None,
        })
        .await;
    assert_eq!(room.id, room_id);
    assert_eq!(room.players.len(), 2);
    assert!(room.has_player("p-flaky"));
    assert!(room.board.is_some(), "snapshot carries the full state");

    wait_for(&mut host_events, |e| match e {
        SessionEvent::RoomUpdated { room } if room.players.len() == 2 => Some(()),
        _ => None,
    })
    .await;

    host.shutdown();
}

#[tokio::test]
async fn session_gives_up_after_the_attempt_budget() {
    // grab a port with nothing listening on it
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = SessionConfig::new(format!("ws://{addr}/ws"))
        .with_reconnect_delay(Duration::from_millis(50))
        .with_max_reconnect_attempts(2);
    let (_handle, mut events) = ClientSession::spawn(config, Arc::new(MemoryStorage::new()));

    for attempt in 1..=2 {
        wait_for(&mut events, |e| match e {
            SessionEvent::Reconnecting { attempt: a } if *a == attempt => Some(()),
            _ => None,
        })
        .await;
    }
    wait_for(&mut events, |e| matches!(e, SessionEvent::Disconnected).then_some(())).await;
}

#[tokio::test]
async fn broadcasts_never_cross_rooms_and_bad_frames_are_survivable() {
    let url = start_server().await;

    let mut alpha = RawClient::connect(&url).await;
    alpha.send_msg(&RawClient::join("alpha", "p-alpha")).await;
    alpha
        .recv_until(|msg| matches!(msg, ServerMessage::GameboardUpdate { .. }).then_some(()))
        .await;

    let mut beta = RawClient::connect(&url).await;
    beta.send_msg(&RawClient::join("beta", "p-beta")).await;
    beta.recv_until(|msg| matches!(msg, ServerMessage::GameboardUpdate { .. }).then_some(()))
        .await;

    alpha
        .send_msg(&ClientMessage::TurnUpdate {
            room_id: "alpha".to_owned(),
            content: TurnContent { turn_index: 2 },
        })
        .await;
    alpha
        .recv_until(|msg| match msg {
            ServerMessage::TurnUpdate { content } if content.turn_index == 2 => Some(()),
            _ => None,
        })
        .await;
    beta.expect_silence(Duration::from_millis(300)).await;

    // malformed and unknown frames bounce an error back without killing
    // the connection
    beta.send_raw("{oops").await;
    beta.recv_until(|msg| matches!(msg, ServerMessage::Error { .. }).then_some(()))
        .await;
    beta.send_raw(r#"{"type":"mystery_move","roomId":"beta"}"#).await;
    beta.recv_until(|msg| matches!(msg, ServerMessage::Error { .. }).then_some(()))
        .await;

    beta.send_msg(&ClientMessage::TurnUpdate {
        room_id: "beta".to_owned(),
        content: TurnContent { turn_index: 1 },
    })
    .await;
    beta.recv_until(|msg| match msg {
        ServerMessage::TurnUpdate { content } if content.turn_index == 1 => Some(()),
        _ => None,
    })
    .await;
}
