//! JSON wire protocol: one tagged object per text frame.
//!
//! The `type` field selects the variant; payload fields are camelCase. The
//! unions are closed: a frame whose `type` is unrecognized fails to decode
//! and is dropped by the dispatcher rather than being duck-typed.

use serde::{Deserialize, Serialize};

use crate::game::Board;
use crate::room::Room;

/// Messages clients send to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    #[serde(rename_all = "camelCase")]
    JoinRoom {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room_id: Option<String>,
        player_id: String,
        #[serde(default)]
        is_host: bool,
    },
    #[serde(rename_all = "camelCase")]
    LeaveRoom { room_id: String, player_id: String },
    #[serde(rename_all = "camelCase")]
    GameStart { room_id: String },
    #[serde(rename_all = "camelCase")]
    GameReset { room_id: String },
    #[serde(rename_all = "camelCase")]
    TurnUpdate { room_id: String, content: TurnContent },
    #[serde(rename_all = "camelCase")]
    RoundUpdate { room_id: String, content: RoundContent },
    #[serde(rename_all = "camelCase")]
    PlayerScoreUpdate { room_id: String, content: ScoreContent },
    #[serde(rename_all = "camelCase")]
    GameMessage {
        room_id: String,
        player_id: String,
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<String>,
    },
}

/// Messages the server sends to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Connected { content: String },
    /// Sent to the joining connection only; everyone else gets `room_updated`.
    #[serde(rename_all = "camelCase")]
    RoomJoined { player_id: String, room: Room },
    RoomUpdated { room: Room },
    GameStart,
    GameboardUpdate { content: BoardContent },
    TurnUpdate { content: TurnContent },
    RoundUpdate { content: RoundContent },
    PlayerScoreUpdate { content: ScoreContent },
    #[serde(rename_all = "camelCase")]
    GameMessage {
        room_id: String,
        player_id: String,
        content: String,
        timestamp: String,
    },
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardContent {
    pub board: Board,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnContent {
    pub turn_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundContent {
    pub round_number: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreContent {
    pub player_id: String,
    pub points: u32,
}
