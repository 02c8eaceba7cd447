//! WebSocket transport: wire types and per-connection sessions

pub mod handler;
pub mod protocol;
