//! Session registry - the authoritative room state and its commands
//!
//! Every operation returns the messages it produced, each addressed to an
//! [`Audience`]. Unknown identities and dead players are guarded no-ops that
//! produce nothing.

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::ws::protocol::{Direction, Player, PlayerId, Projectile, ServerMsg};

use super::combat::{self, HitResult};
use super::physics::{self, Arena, PendingLanding, Step, JUMP_HEIGHT};
use super::snapshot;
use super::Outbound;

/// How many kills a single collision scan may resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HitResolution {
    /// Every projectile is scanned; each one kills at most one player
    #[default]
    PerProjectile,
    /// The scan stops after the first kill
    FirstOnly,
}

impl FromStr for HitResolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "per_projectile" => Ok(Self::PerProjectile),
            "first_only" => Ok(Self::FirstOnly),
            other => Err(format!("unknown hit resolution '{}'", other)),
        }
    }
}

/// Player state in the room (authoritative)
#[derive(Debug, Clone)]
pub struct PlayerState {
    pub player: Player,
    /// Bumped on every death and reset; landings from an older life are void
    pub generation: u64,
}

impl PlayerState {
    pub fn spawn(id: PlayerId) -> Self {
        Self {
            player: physics::spawn_player(id),
            generation: 0,
        }
    }

    fn moved_msg(&self) -> ServerMsg {
        ServerMsg::PlayerMoved {
            id: self.player.id,
            x: self.player.x,
            y: self.player.y,
            facing: self.player.facing,
        }
    }
}

/// Owned room state: players, live projectiles and scheduled landings
#[derive(Debug)]
pub struct SessionRegistry {
    players: HashMap<PlayerId, PlayerState>,
    /// Connection order; collision scans visit players in this order
    join_order: Vec<PlayerId>,
    projectiles: Vec<Projectile>,
    landings: Vec<PendingLanding>,
    arena: Arena,
    hit_resolution: HitResolution,
}

impl SessionRegistry {
    pub fn new(arena: Arena, hit_resolution: HitResolution) -> Self {
        Self {
            players: HashMap::new(),
            join_order: Vec::new(),
            projectiles: Vec::new(),
            landings: Vec::new(),
            arena,
            hit_resolution,
        }
    }

    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.get(id).map(|s| &s.player)
    }

    pub fn players(&self) -> &HashMap<PlayerId, PlayerState> {
        &self.players
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn projectile_count(&self) -> usize {
        self.projectiles.len()
    }

    pub fn pending_landings(&self) -> usize {
        self.landings.len()
    }

    /// Add a player at the spawn point, seed its mirror and announce it
    pub fn connect(&mut self, id: PlayerId) -> Vec<Outbound> {
        if self.players.contains_key(&id) {
            warn!(player_id = %id, "Player already connected");
            return Vec::new();
        }

        let state = PlayerState::spawn(id);
        let announce = ServerMsg::NewPlayer {
            player: state.player.clone(),
        };
        self.players.insert(id, state);
        self.join_order.push(id);

        let mut out = snapshot::seed_for(id, &self.players, &self.projectiles);
        out.push(Outbound::all_except(id, announce));

        info!(player_id = %id, player_count = self.players.len(), "Player connected");
        out
    }

    /// Step or jump. Dead and unknown players are ignored.
    pub fn move_player(&mut self, id: PlayerId, direction: Direction, now: Instant) -> Vec<Outbound> {
        let Some(state) = self.players.get_mut(&id) else {
            debug!(player_id = %id, "Move from unknown player");
            return Vec::new();
        };
        if !state.player.alive {
            debug!(player_id = %id, "Move from dead player ignored");
            return Vec::new();
        }

        if physics::apply_step(&mut state.player, direction) == Step::Jumped {
            self.landings
                .push(PendingLanding::new(id, state.generation, now));
        }

        vec![Outbound::all(state.moved_msg())]
    }

    /// Relay a client-built projectile. Position, direction and owner are trusted.
    pub fn fire(&mut self, id: PlayerId, bullet: Projectile) -> Vec<Outbound> {
        debug!(
            player_id = %id,
            owner = %bullet.owner,
            x = bullet.x,
            y = bullet.y,
            "Bullet fired"
        );
        self.projectiles.push(bullet.clone());
        vec![Outbound::all(ServerMsg::BulletFired { bullet })]
    }

    /// Scan projectiles against alive non-owner players, kill on overlap and
    /// consume the projectile.
    pub fn check_collisions(&mut self) -> Vec<Outbound> {
        let hits = self.find_hits();
        if hits.is_empty() {
            return Vec::new();
        }

        let mut out = Vec::with_capacity(hits.len());
        for hit in &hits {
            if let Some(target) = self.players.get_mut(&hit.target_id) {
                target.player.alive = false;
                target.generation += 1;
            }
            info!(
                target_id = %hit.target_id,
                shooter_id = %hit.shooter_id,
                "Player was killed"
            );
            out.push(Outbound::all(ServerMsg::PlayerDied { id: hit.target_id }));
        }

        // indices are ascending; remove back to front
        for hit in hits.iter().rev() {
            self.projectiles.remove(hit.projectile_index);
        }

        out
    }

    fn find_hits(&self) -> Vec<HitResult> {
        let mut hits: Vec<HitResult> = Vec::new();

        for (idx, bullet) in self.projectiles.iter().enumerate() {
            let target = self
                .join_order
                .iter()
                .filter_map(|id| self.players.get(id))
                .find(|s| {
                    combat::can_hit(bullet, &s.player)
                        && !hits.iter().any(|h| h.target_id == s.player.id)
                });

            if let Some(target) = target {
                hits.push(HitResult {
                    projectile_index: idx,
                    shooter_id: bullet.owner,
                    target_id: target.player.id,
                });
                if self.hit_resolution == HitResolution::FirstOnly {
                    break;
                }
            }
        }

        hits
    }

    /// Put a player back at the spawn point, alive
    pub fn reset(&mut self, id: PlayerId) -> Vec<Outbound> {
        let Some(state) = self.players.get_mut(&id) else {
            debug!(player_id = %id, "Reset from unknown player");
            return Vec::new();
        };

        let generation = state.generation + 1;
        *state = PlayerState::spawn(id);
        state.generation = generation;
        let player = state.player.clone();

        info!(player_id = %id, "Player reset");
        vec![
            Outbound::only(
                id,
                ServerMsg::ResetPlayer {
                    player: player.clone(),
                },
            ),
            Outbound::all_except(id, ServerMsg::NewPlayer { player }),
        ]
    }

    /// Remove a player and cancel its landings
    pub fn disconnect(&mut self, id: PlayerId) -> Vec<Outbound> {
        if self.players.remove(&id).is_none() {
            return Vec::new();
        }
        self.join_order.retain(|joined| *joined != id);
        self.landings.retain(|l| l.player_id != id);

        info!(player_id = %id, player_count = self.players.len(), "Player disconnected");
        vec![Outbound::all(ServerMsg::PlayerDisconnected { id })]
    }

    /// Apply every landing that is due and still belongs to a live player's
    /// current life
    pub fn land_due(&mut self, now: Instant) -> Vec<Outbound> {
        if !self.landings.iter().any(|l| l.is_due(now)) {
            return Vec::new();
        }

        let (due, pending): (Vec<_>, Vec<_>) =
            self.landings.drain(..).partition(|l| l.is_due(now));
        self.landings = pending;

        let mut out = Vec::new();
        for landing in due {
            match self.players.get_mut(&landing.player_id) {
                Some(state) if state.player.alive && state.generation == landing.generation => {
                    state.player.y += JUMP_HEIGHT;
                    out.push(Outbound::all(state.moved_msg()));
                }
                _ => {
                    debug!(player_id = %landing.player_id, "Discarding stale landing");
                }
            }
        }
        out
    }

    /// Move projectiles along their direction and drop those outside the arena
    pub fn advance_projectiles(&mut self, dt: f32) -> usize {
        combat::advance_and_cull(&mut self.projectiles, &self.arena, dt)
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(Arena::default(), HitResolution::default())
    }
}
