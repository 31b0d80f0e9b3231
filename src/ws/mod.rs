//! Realtime transport: connection registry, message dispatch, and
//! room-scoped broadcast.

pub mod broadcast;
pub mod connection;
pub mod dispatch;
pub mod registry;
