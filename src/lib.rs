//! WordWave: a real-time multiplayer word-game session manager.
//!
//! The server side keeps authoritative room state (players, board, turn
//! order, scores) and fans every mutation out to the connections joined to
//! that room. The client side ([`client`]) is a reconnecting session that
//! rehydrates its local view from server snapshots.

pub mod client;
pub mod config;
pub mod game;
pub mod http;
pub mod protocol;
pub mod room;
pub mod telemetry;
pub mod util;
pub mod ws;
