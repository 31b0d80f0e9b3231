//! Room-scoped event fan-out.

use std::sync::Arc;

use crate::protocol::ServerMessage;
use crate::room::Room;
use crate::ws::registry::ConnectionRegistry;

/// Delivers an event to exactly the connections bound to members of a room.
#[derive(Clone)]
pub struct Broadcaster {
    registry: Arc<ConnectionRegistry>,
}

impl Broadcaster {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Queue `msg` on every open connection whose bound player is in
    /// `room`'s player list, and on no others. A connection that is already
    /// closing is skipped without failing the rest of the fan-out.
    pub fn send(&self, room: &Room, msg: &ServerMessage) {
        self.registry.for_each_bound(|player_id, tx| {
            if room.has_player(player_id) {
                let _ = tx.send(msg.clone());
            }
        });
    }
}
