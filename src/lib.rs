//! Relay server and headless client for a single-room 2D multiplayer shooter.
//!
//! The server owns the room state in one task ([`game::GameRoom`]) and fans
//! addressed messages out to every WebSocket session. The client side
//! ([`client`]) keeps a mirror of that state and drives a frame loop.

pub mod app;
pub mod client;
pub mod config;
pub mod game;
pub mod http;
pub mod util;
pub mod ws;
