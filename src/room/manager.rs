//! Registry of rooms and the per-room mutation rules.
//!
//! Rooms are created lazily by `join` and destroyed the moment their player
//! list empties. Every other operation is a silent no-op when the room does
//! not exist. The manager stores and relays state; it does not validate word
//! legality, scoring arithmetic, or whose turn it is. Those are computed by
//! the host client and pushed here as absolute overwrites, a deliberate
//! trust boundary.

use dashmap::DashMap;

use crate::game::Board;
use crate::room::{Room, RoomStatus, ROOM_CAPACITY};
use crate::util::id::new_room_id;

/// Outcome of removing a player from a room.
#[derive(Debug, Clone, PartialEq)]
pub enum RoomChange {
    Updated(Room),
    /// The room emptied and was dropped from the store; there is nothing
    /// left to broadcast to.
    Destroyed,
}

#[derive(Debug, Default)]
pub struct RoomManager {
    rooms: DashMap<String, Room>,
}

impl RoomManager {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
        }
    }

    /// Snapshot of a room, if it exists.
    pub fn get(&self, room_id: &str) -> Option<Room> {
        self.rooms.get(room_id).map(|r| r.clone())
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Add a player to a room, creating the room if needed.
    ///
    /// Without a room id the player lands in the first room with a free
    /// seat, or a brand new one when every room is full. With an explicit
    /// room id the join always succeeds; capacity only gates auto-assign.
    ///
    /// `requested_host` is advisory: the first joiner is host no matter what
    /// it says, and later joiners never gain host status from it, so a room
    /// keeps exactly one host even when a returning client still claims it
    /// created the room. Returns the room id and the updated snapshot.
    pub fn join(&self, room_id: Option<&str>, player_id: &str, requested_host: bool) -> (String, Room) {
        loop {
            let (id, auto_assigned) = match room_id {
                Some(id) => (id.to_owned(), false),
                None => match self.first_open_room() {
                    Some(id) => (id, true),
                    None => (new_room_id(), false),
                },
            };

            let mut room = self
                .rooms
                .entry(id.clone())
                .or_insert_with(|| Room::new(&id));
            if auto_assigned && room.is_full() {
                // the open seat was taken between the scan and the lock
                drop(room);
                continue;
            }
            room.add_player(player_id);
            if requested_host && room.player(player_id).is_some_and(|p| !p.is_host) {
                tracing::debug!(player_id, room_id = %id, "ignoring host claim from non-first joiner");
            }
            return (id, room.clone());
        }
    }

    fn first_open_room(&self) -> Option<String> {
        self.rooms
            .iter()
            .find(|room| room.players.len() < ROOM_CAPACITY)
            .map(|room| room.id.clone())
    }

    /// Remove a player from a room.
    pub fn leave(&self, room_id: &str, player_id: &str) -> Option<RoomChange> {
        let mut room = self.rooms.get_mut(room_id)?;
        room.remove_player(player_id);
        if room.players.is_empty() {
            drop(room);
            self.rooms.remove_if(room_id, |_, r| r.players.is_empty());
            return Some(RoomChange::Destroyed);
        }
        Some(RoomChange::Updated(room.clone()))
    }

    /// Start the game: fresh board, round 1, turn 0, status `playing`.
    pub fn start_game(&self, room_id: &str) -> Option<Room> {
        let mut room = self.rooms.get_mut(room_id)?;
        room.status = RoomStatus::Playing;
        room.board = Some(Board::shuffled(&mut rand::thread_rng()));
        room.round_number = 1;
        room.turn_index = 0;
        Some(room.clone())
    }

    /// Reset after the final round overflows: fresh board, round 1, turn 0.
    /// Status is left as-is.
    pub fn reset_game(&self, room_id: &str) -> Option<Room> {
        let mut room = self.rooms.get_mut(room_id)?;
        room.board = Some(Board::shuffled(&mut rand::thread_rng()));
        room.round_number = 1;
        room.turn_index = 0;
        Some(room.clone())
    }

    /// Overwrite the turn cursor verbatim. The host client computes
    /// `(current + 1) % player_count`; no bounds check happens here.
    pub fn set_turn(&self, room_id: &str, turn_index: usize) -> Option<Room> {
        let mut room = self.rooms.get_mut(room_id)?;
        room.turn_index = turn_index;
        Some(room.clone())
    }

    /// Overwrite the round number and rewind the turn cursor to the first
    /// player.
    pub fn set_round(&self, room_id: &str, round_number: u32) -> Option<Room> {
        let mut room = self.rooms.get_mut(room_id)?;
        room.round_number = round_number;
        room.turn_index = 0;
        Some(room.clone())
    }

    /// Overwrite (not increment) a player's points. Unknown players leave
    /// the room untouched.
    pub fn set_score(&self, room_id: &str, player_id: &str, points: u32) -> Option<Room> {
        let mut room = self.rooms.get_mut(room_id)?;
        if let Some(player) = room.players.iter_mut().find(|p| p.id == player_id) {
            player.points = points;
        }
        Some(room.clone())
    }

    /// Remove a player from every room it belongs to, applied on connection
    /// loss. Normally that is exactly one room.
    pub fn disconnect(&self, player_id: &str) -> Vec<(String, RoomChange)> {
        let room_ids: Vec<String> = self.rooms.iter().map(|r| r.id.clone()).collect();
        let mut changes = Vec::new();
        for room_id in room_ids {
            let Some(mut room) = self.rooms.get_mut(&room_id) else {
                continue;
            };
            if !room.has_player(player_id) {
                continue;
            }
            room.remove_player(player_id);
            let change = if room.players.is_empty() {
                drop(room);
                self.rooms.remove_if(&room_id, |_, r| r.players.is_empty());
                RoomChange::Destroyed
            } else {
                RoomChange::Updated(room.clone())
            };
            changes.push((room_id, change));
        }
        changes
    }
}
