//! Inbound message routing.
//!
//! Connections forward raw frames into a single queue; one dispatcher task
//! consumes it, so every room mutation and its broadcast fan-out complete
//! before the next inbound message is looked at. That single-consumer
//! property is what guarantees per-room delivery ordering without any
//! per-room locks here.
//!
//! No check is made that `game_start`/`turn_update`/`round_update` come
//! from the room's host: progression commands are trusted from any member,
//! a known trust boundary of the protocol.

use std::sync::Arc;

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::protocol::{BoardContent, ClientMessage, RoundContent, ServerMessage, TurnContent};
use crate::room::{RoomChange, RoomManager};
use crate::ws::broadcast::Broadcaster;
use crate::ws::registry::{ConnId, ConnectionRegistry};

/// One unit of inbound work from a connection task.
#[derive(Debug)]
pub enum Inbound {
    /// A text frame as received off the wire, not yet decoded.
    Frame { conn: ConnId, text: String },
    /// The connection closed (cleanly or not).
    Closed { conn: ConnId },
}

pub struct Dispatcher {
    rooms: Arc<RoomManager>,
    registry: Arc<ConnectionRegistry>,
    broadcaster: Broadcaster,
}

impl Dispatcher {
    pub fn new(rooms: Arc<RoomManager>, registry: Arc<ConnectionRegistry>) -> Self {
        let broadcaster = Broadcaster::new(registry.clone());
        Self {
            rooms,
            registry,
            broadcaster,
        }
    }

    /// Start the single consumer task and return the queue feeding it.
    pub fn spawn(self) -> mpsc::UnboundedSender<Inbound> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                self.handle(event);
            }
        });
        tx
    }

    pub fn handle(&self, event: Inbound) {
        match event {
            Inbound::Frame { conn, text } => self.on_frame(conn, &text),
            Inbound::Closed { conn } => self.on_closed(conn),
        }
    }

    fn on_frame(&self, conn: ConnId, text: &str) {
        let msg = match serde_json::from_str::<ClientMessage>(text) {
            Ok(msg) => msg,
            Err(err) => {
                // malformed or unrecognized frame: drop it, keep the
                // connection open
                debug!(conn, %err, "dropping undecodable frame");
                self.registry.send_to(
                    conn,
                    &ServerMessage::Error {
                        message: format!("bad message: {err}"),
                    },
                );
                return;
            }
        };
        self.on_message(conn, msg);
    }

    fn on_message(&self, conn: ConnId, msg: ClientMessage) {
        match msg {
            ClientMessage::JoinRoom {
                room_id,
                player_id,
                is_host,
            } => {
                self.registry.bind(conn, &player_id);
                let (room_id, room) = self.rooms.join(room_id.as_deref(), &player_id, is_host);
                info!(%room_id, %player_id, "player joined");
                self.registry.send_to(
                    conn,
                    &ServerMessage::RoomJoined {
                        player_id,
                        room: room.clone(),
                    },
                );
                self.broadcaster.send(&room, &ServerMessage::RoomUpdated { room: room.clone() });
                if let Some(board) = room.board {
                    self.broadcaster.send(
                        &room,
                        &ServerMessage::GameboardUpdate {
                            content: BoardContent { board },
                        },
                    );
                }
            }
            ClientMessage::LeaveRoom { room_id, player_id } => {
                match self.rooms.leave(&room_id, &player_id) {
                    Some(RoomChange::Updated(room)) => {
                        info!(%room_id, %player_id, "player left");
                        self.broadcaster.send(&room, &ServerMessage::RoomUpdated { room: room.clone() });
                    }
                    Some(RoomChange::Destroyed) => {
                        info!(%room_id, "room destroyed");
                    }
                    None => {}
                }
            }
            ClientMessage::GameStart { room_id } => {
                let Some(room) = self.rooms.start_game(&room_id) else {
                    return;
                };
                info!(%room_id, "game started");
                self.broadcaster.send(&room, &ServerMessage::GameStart);
                if let Some(board) = room.board {
                    self.broadcaster.send(
                        &room,
                        &ServerMessage::GameboardUpdate {
                            content: BoardContent { board },
                        },
                    );
                }
                self.broadcaster.send(
                    &room,
                    &ServerMessage::RoundUpdate {
                        content: RoundContent {
                            round_number: room.round_number,
                        },
                    },
                );
            }
            ClientMessage::GameReset { room_id } => {
                let Some(room) = self.rooms.reset_game(&room_id) else {
                    return;
                };
                info!(%room_id, "game reset");
                if let Some(board) = room.board {
                    self.broadcaster.send(
                        &room,
                        &ServerMessage::GameboardUpdate {
                            content: BoardContent { board },
                        },
                    );
                }
                self.broadcaster.send(
                    &room,
                    &ServerMessage::RoundUpdate {
                        content: RoundContent {
                            round_number: room.round_number,
                        },
                    },
                );
                self.broadcaster.send(
                    &room,
                    &ServerMessage::TurnUpdate {
                        content: TurnContent {
                            turn_index: room.turn_index,
                        },
                    },
                );
            }
            ClientMessage::TurnUpdate { room_id, content } => {
                let Some(room) = self.rooms.set_turn(&room_id, content.turn_index) else {
                    return;
                };
                self.broadcaster.send(
                    &room,
                    &ServerMessage::TurnUpdate {
                        content: TurnContent {
                            turn_index: room.turn_index,
                        },
                    },
                );
            }
            ClientMessage::RoundUpdate { room_id, content } => {
                let Some(room) = self.rooms.set_round(&room_id, content.round_number) else {
                    return;
                };
                self.broadcaster.send(
                    &room,
                    &ServerMessage::RoundUpdate {
                        content: RoundContent {
                            round_number: room.round_number,
                        },
                    },
                );
            }
            ClientMessage::PlayerScoreUpdate { room_id, content } => {
                let Some(room) = self
                    .rooms
                    .set_score(&room_id, &content.player_id, content.points)
                else {
                    return;
                };
                self.broadcaster.send(
                    &room,
                    &ServerMessage::PlayerScoreUpdate { content },
                );
            }
            ClientMessage::GameMessage {
                room_id,
                player_id,
                content,
                timestamp,
            } => {
                let Some(room) = self.rooms.get(&room_id) else {
                    return;
                };
                let timestamp = timestamp.unwrap_or_else(now_rfc3339);
                self.broadcaster.send(
                    &room,
                    &ServerMessage::GameMessage {
                        room_id,
                        player_id,
                        content,
                        timestamp,
                    },
                );
            }
        }
    }

    fn on_closed(&self, conn: ConnId) {
        let Some(player_id) = self.registry.unregister(conn) else {
            return;
        };
        info!(conn, %player_id, "player disconnected");
        for (room_id, change) in self.rooms.disconnect(&player_id) {
            match change {
                RoomChange::Updated(room) => {
                    self.broadcaster.send(&room, &ServerMessage::RoomUpdated { room: room.clone() });
                }
                RoomChange::Destroyed => {
                    info!(%room_id, "room destroyed");
                }
            }
        }
    }
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|err| {
            warn!(%err, "failed to format timestamp");
            String::new()
        })
}
