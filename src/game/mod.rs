//! Game simulation modules

pub mod combat;
pub mod physics;
pub mod registry;
pub mod room;
pub mod snapshot;

pub use registry::{HitResolution, PlayerState, SessionRegistry};
pub use room::{GameRoom, RoomHandle};

use crate::ws::protocol::{ClientMsg, PlayerId, ServerMsg};

/// Who an outbound message is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// Every connected client, including the originator
    All,
    /// Only this connection
    Only(PlayerId),
    /// Everyone but this connection
    AllExcept(PlayerId),
}

impl Audience {
    pub fn includes(&self, id: PlayerId) -> bool {
        match *self {
            Audience::All => true,
            Audience::Only(target) => target == id,
            Audience::AllExcept(excluded) => excluded != id,
        }
    }
}

/// A server message addressed to an audience
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub audience: Audience,
    pub msg: ServerMsg,
}

impl Outbound {
    pub fn all(msg: ServerMsg) -> Self {
        Self {
            audience: Audience::All,
            msg,
        }
    }

    pub fn only(id: PlayerId, msg: ServerMsg) -> Self {
        Self {
            audience: Audience::Only(id),
            msg,
        }
    }

    pub fn all_except(id: PlayerId, msg: ServerMsg) -> Self {
        Self {
            audience: Audience::AllExcept(id),
            msg,
        }
    }
}

/// What a connection asks the room to do
#[derive(Debug, Clone)]
pub enum RoomCommand {
    Connect,
    Client(ClientMsg),
    Disconnect,
}

/// Command received from a WebSocket session
#[derive(Debug, Clone)]
pub struct PlayerCommand {
    pub player_id: PlayerId,
    pub command: RoomCommand,
    pub received_at: u64,
}
