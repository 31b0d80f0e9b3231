//! Live connections and their player bindings.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::mpsc;

use crate::protocol::ServerMessage;

/// Opaque id for one live transport connection.
pub type ConnId = u64;

#[derive(Debug)]
struct Connection {
    /// Bound on the first `join_room`; a connection carries at most one
    /// player id for its lifetime.
    player_id: Option<String>,
    tx: mpsc::UnboundedSender<ServerMessage>,
}

/// Maps each live connection to its outbound queue and, once identified,
/// to a player id. A player id may be temporarily unbound while its client
/// reconnects; presenting the same durable id on re-join binds it to the
/// new connection.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: DashMap<ConnId, Connection>,
    next_id: AtomicU64,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a freshly opened connection and hand back its id.
    pub fn register(&self, tx: mpsc::UnboundedSender<ServerMessage>) -> ConnId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.connections.insert(id, Connection { player_id: None, tx });
        id
    }

    /// Bind a connection to the player id it presented.
    pub fn bind(&self, conn: ConnId, player_id: &str) {
        if let Some(mut connection) = self.connections.get_mut(&conn) {
            connection.player_id = Some(player_id.to_owned());
        }
    }

    pub fn player_of(&self, conn: ConnId) -> Option<String> {
        self.connections.get(&conn).and_then(|c| c.player_id.clone())
    }

    /// Drop a closed connection, returning the player id it was bound to.
    pub fn unregister(&self, conn: ConnId) -> Option<String> {
        self.connections.remove(&conn).and_then(|(_, c)| c.player_id)
    }

    /// Queue a message for a single connection. Stale connections are
    /// skipped silently.
    pub fn send_to(&self, conn: ConnId, msg: &ServerMessage) {
        if let Some(connection) = self.connections.get(&conn) {
            let _ = connection.tx.send(msg.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Visit every identified connection.
    pub(crate) fn for_each_bound<F>(&self, mut f: F)
    where
        F: FnMut(&str, &mpsc::UnboundedSender<ServerMessage>),
    {
        for connection in self.connections.iter() {
            if let Some(player_id) = &connection.player_id {
                f(player_id, &connection.tx);
            }
        }
    }
}
