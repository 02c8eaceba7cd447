//! Client-side copy of the room, updated only from server broadcasts

use std::collections::HashMap;

use crate::ws::protocol::{Player, PlayerId, Projectile, ServerMsg};

/// What a broadcast meant for the locally controlled player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorEvent {
    Nothing,
    LocalDied,
    LocalRevived,
}

#[derive(Debug, Clone, Default)]
pub struct RoomMirror {
    local_id: Option<PlayerId>,
    pub players: HashMap<PlayerId, Player>,
    pub projectiles: Vec<Projectile>,
}

impl RoomMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn local_id(&self) -> Option<PlayerId> {
        self.local_id
    }

    pub fn local_player(&self) -> Option<&Player> {
        self.local_id.and_then(|id| self.players.get(&id))
    }

    pub fn local_player_mut(&mut self) -> Option<&mut Player> {
        let id = self.local_id?;
        self.players.get_mut(&id)
    }

    fn is_local(&self, id: PlayerId) -> bool {
        self.local_id == Some(id)
    }

    /// Fold one server message into the mirror
    pub fn apply(&mut self, msg: ServerMsg) -> MirrorEvent {
        match msg {
            ServerMsg::Welcome { id } => {
                self.local_id = Some(id);
            }
            ServerMsg::CurrentPlayers { players } => {
                self.players = players;
            }
            ServerMsg::CurrentBullets { bullets } => {
                self.projectiles = bullets;
            }
            ServerMsg::NewPlayer { player } => {
                self.players.insert(player.id, player);
            }
            ServerMsg::PlayerMoved { id, x, y, facing } => {
                if let Some(player) = self.players.get_mut(&id) {
                    player.x = x;
                    player.y = y;
                    player.facing = facing;
                }
            }
            ServerMsg::BulletFired { bullet } => {
                self.projectiles.push(bullet);
            }
            ServerMsg::PlayerDied { id } => {
                if let Some(player) = self.players.get_mut(&id) {
                    player.alive = false;
                }
                if self.is_local(id) {
                    return MirrorEvent::LocalDied;
                }
            }
            ServerMsg::PlayerDisconnected { id } => {
                self.players.remove(&id);
            }
            ServerMsg::ResetPlayer { player } => {
                let id = player.id;
                self.players.insert(id, player);
                if self.is_local(id) {
                    return MirrorEvent::LocalRevived;
                }
            }
        }
        MirrorEvent::Nothing
    }
}
