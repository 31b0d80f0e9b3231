//! Durable client-side key-value storage.
//!
//! The session keeps its player id and host flag here so reconnects present
//! the same identity. The trait stands in for whatever the embedding app
//! has (browser local storage, a config file, ...); the session never
//! assumes a particular medium.

use std::collections::HashMap;

use parking_lot::Mutex;

/// Storage key for the durable player id.
pub const PLAYER_ID_KEY: &str = "playerId";
/// Storage key for the "this client created the room" flag.
pub const HOST_FLAG_KEY: &str = "isHost";

pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// In-memory storage, durable for the life of the process. Useful for tests
/// and for embedders without a persistence medium.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.values.lock().insert(key.to_owned(), value.to_owned());
    }

    fn remove(&self, key: &str) {
        self.values.lock().remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_remove() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("k"), None);
        storage.set("k", "v");
        assert_eq!(storage.get("k"), Some("v".to_owned()));
        storage.remove("k");
        assert_eq!(storage.get("k"), None);
    }
}
