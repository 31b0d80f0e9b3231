//! Room state: players, board, turn order, scores.

pub mod manager;

use serde::{Deserialize, Serialize};

use crate::game::Board;

pub use manager::{RoomChange, RoomManager};

/// Player cap enforced when auto-assigning joiners to open rooms.
pub const ROOM_CAPACITY: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Waiting,
    Playing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: String,
    pub display_name: String,
    pub points: u32,
    pub is_host: bool,
}

/// Authoritative state of one room.
///
/// `players` is in join order, which is also turn order: `turn_index` points
/// into it. The engine stores `turn_index` verbatim from the host client and
/// does not bounds-check it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: String,
    pub players: Vec<Player>,
    pub board: Option<Board>,
    pub round_number: u32,
    pub turn_index: usize,
    pub status: RoomStatus,
}

impl Room {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            players: Vec::new(),
            board: None,
            round_number: 1,
            turn_index: 0,
            status: RoomStatus::Waiting,
        }
    }

    pub fn has_player(&self, player_id: &str) -> bool {
        self.players.iter().any(|p| p.id == player_id)
    }

    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= ROOM_CAPACITY
    }

    /// Add a player if not already present. Idempotent on player id.
    ///
    /// The first player is always the host; later joiners never gain host
    /// status from the wire flag, which keeps a single host per room even
    /// when a client re-joins still claiming it created the room.
    pub(crate) fn add_player(&mut self, player_id: &str) {
        if self.has_player(player_id) {
            return;
        }
        let is_host = self.players.is_empty();
        self.players.push(Player {
            id: player_id.to_owned(),
            display_name: format!("Player {}", self.players.len() + 1),
            points: 0,
            is_host,
        });
        if self.board.is_none() {
            self.board = Some(Board::shuffled(&mut rand::thread_rng()));
        }
    }

    /// Remove a player, promoting the earliest remaining joiner when the
    /// host leaves so the room never goes hostless.
    pub(crate) fn remove_player(&mut self, player_id: &str) {
        self.players.retain(|p| p.id != player_id);
        if !self.players.is_empty() && !self.players.iter().any(|p| p.is_host) {
            self.players[0].is_host = true;
        }
    }
}
