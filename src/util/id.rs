//! ID utilities (room ids, player ids).

use rand::{distributions::Alphanumeric, Rng};
use ulid::Ulid;

/// Generate a short room ID using ULID, truncated for readability.
pub fn new_room_id() -> String {
    let ulid = Ulid::new().to_string();
    // 26-char ULID, take first 10 for brevity. Collisions are extremely unlikely.
    ulid.chars().take(10).collect()
}

/// Generate an opaque player ID (URL-safe alphanumeric).
///
/// Clients generate this once and persist it so reconnects can present the
/// same identity.
pub fn new_player_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(7)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_ids_are_short_and_unique() {
        let a = new_room_id();
        let b = new_room_id();
        assert_eq!(a.len(), 10);
        assert_ne!(a, b);
    }

    #[test]
    fn player_ids_are_alphanumeric() {
        let id = new_player_id();
        assert_eq!(id.len(), 7);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
