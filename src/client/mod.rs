//! Client-side session: connection lifecycle, durable identity, and local
//! state rehydration from server snapshots.

pub mod session;
pub mod storage;

pub use session::{ClientSession, SessionConfig, SessionError, SessionEvent, SessionHandle};
pub use storage::{KeyValueStorage, MemoryStorage};
