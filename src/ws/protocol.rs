//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-connection identity token
pub type PlayerId = Uuid;

/// Which way a player (or a projectile) is pointing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    Left,
    Right,
}

/// Movement command payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
    Jump,
}

/// Player as seen on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    /// Left edge
    pub x: f32,
    /// Feet (bottom edge)
    pub y: f32,
    pub facing: Facing,
    pub alive: bool,
}

/// Projectile as seen on the wire. `(x, y)` is the top-left corner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub owner: PlayerId,
    pub x: f32,
    pub y: f32,
    pub direction: Facing,
}

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMsg {
    /// Step left/right or jump
    Move { direction: Direction },

    /// Client-built projectile, relayed verbatim
    BulletFired { bullet: Projectile },

    /// Ask the server to run a collision scan
    CheckCollision,

    /// Revive the sender at the spawn point
    #[serde(alias = "playAgain")]
    ResetPlayer,
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMsg {
    /// First message on a connection: the identity assigned to it
    Welcome { id: PlayerId },

    /// Full player mapping at connect time
    CurrentPlayers { players: HashMap<PlayerId, Player> },

    /// Live projectiles at connect time
    CurrentBullets { bullets: Vec<Projectile> },

    /// Another player joined or reappeared
    NewPlayer { player: Player },

    PlayerMoved {
        id: PlayerId,
        x: f32,
        y: f32,
        facing: Facing,
    },

    BulletFired { bullet: Projectile },

    PlayerDied { id: PlayerId },

    PlayerDisconnected { id: PlayerId },

    /// Sent to the revived player only
    ResetPlayer { player: Player },
}
