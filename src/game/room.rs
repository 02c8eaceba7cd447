//! The single shared room and its authoritative tick loop

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{broadcast, mpsc};
use tokio::time::interval;
use tracing::{debug, info, trace};

use crate::util::time::{tick_delta, tick_interval, unix_millis};
use crate::ws::protocol::{ClientMsg, PlayerId};

use super::physics::Arena;
use super::registry::{HitResolution, SessionRegistry};
use super::{Outbound, PlayerCommand, RoomCommand};

/// Room tuning, taken from [`crate::config::Config`]
#[derive(Debug, Clone)]
pub struct RoomSettings {
    /// Ticks per second
    pub tick_rate: u32,
    /// Run a collision scan on every tick, not only on client request
    pub server_collisions: bool,
    pub hit_resolution: HitResolution,
    pub arena: Arena,
    pub broadcast_capacity: usize,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            tick_rate: 60,
            server_collisions: true,
            hit_resolution: HitResolution::default(),
            arena: Arena::default(),
            broadcast_capacity: 256,
        }
    }
}

/// Handle to the running room
#[derive(Clone)]
pub struct RoomHandle {
    pub command_tx: mpsc::Sender<PlayerCommand>,
    pub outbound_tx: broadcast::Sender<Outbound>,
    player_count: Arc<AtomicUsize>,
    projectile_count: Arc<AtomicUsize>,
}

impl RoomHandle {
    /// Receive every outbound message; callers filter by audience
    pub fn subscribe(&self) -> broadcast::Receiver<Outbound> {
        self.outbound_tx.subscribe()
    }

    /// Queue a command. Returns false if the room has stopped.
    pub async fn send(&self, player_id: PlayerId, command: RoomCommand) -> bool {
        self.command_tx
            .send(PlayerCommand {
                player_id,
                command,
                received_at: unix_millis(),
            })
            .await
            .is_ok()
    }

    pub fn player_count(&self) -> usize {
        self.player_count.load(Ordering::Relaxed)
    }

    pub fn projectile_count(&self) -> usize {
        self.projectile_count.load(Ordering::Relaxed)
    }
}

/// The room task. Owns the registry; all mutation happens here.
pub struct GameRoom {
    registry: SessionRegistry,
    settings: RoomSettings,
    command_rx: mpsc::Receiver<PlayerCommand>,
    outbound_tx: broadcast::Sender<Outbound>,
    player_count: Arc<AtomicUsize>,
    projectile_count: Arc<AtomicUsize>,
}

impl GameRoom {
    pub fn new(settings: RoomSettings) -> (Self, RoomHandle) {
        let (command_tx, command_rx) = mpsc::channel(1024);
        let (outbound_tx, _) = broadcast::channel(settings.broadcast_capacity.max(1));
        let player_count = Arc::new(AtomicUsize::new(0));
        let projectile_count = Arc::new(AtomicUsize::new(0));

        let handle = RoomHandle {
            command_tx,
            outbound_tx: outbound_tx.clone(),
            player_count: player_count.clone(),
            projectile_count: projectile_count.clone(),
        };

        let room = Self {
            registry: SessionRegistry::new(settings.arena, settings.hit_resolution),
            settings,
            command_rx,
            outbound_tx,
            player_count,
            projectile_count,
        };

        (room, handle)
    }

    /// Run the tick loop until every handle is dropped
    pub async fn run(mut self) {
        info!(
            tick_rate = self.settings.tick_rate,
            server_collisions = self.settings.server_collisions,
            hit_resolution = ?self.settings.hit_resolution,
            "Room started"
        );

        let mut ticker = interval(tick_interval(self.settings.tick_rate));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            let now = Instant::now();

            // Drain command queue
            let open = self.process_commands(now);

            // Run simulation tick
            let out = self.run_tick(now);
            self.publish(out);
            self.update_counts();

            if !open {
                info!("All room handles dropped, stopping room");
                break;
            }
        }
    }

    /// Apply every queued command. Returns false once the channel is closed.
    fn process_commands(&mut self, now: Instant) -> bool {
        loop {
            match self.command_rx.try_recv() {
                Ok(cmd) => {
                    trace!(
                        player_id = %cmd.player_id,
                        queued_ms = unix_millis().saturating_sub(cmd.received_at),
                        "Processing command"
                    );
                    let out = self.handle(cmd, now);
                    self.publish(out);
                }
                Err(TryRecvError::Empty) => return true,
                Err(TryRecvError::Disconnected) => return false,
            }
        }
    }

    /// Route one command into the registry
    pub fn handle(&mut self, cmd: PlayerCommand, now: Instant) -> Vec<Outbound> {
        let id = cmd.player_id;
        match cmd.command {
            RoomCommand::Connect => self.registry.connect(id),
            RoomCommand::Disconnect => self.registry.disconnect(id),
            RoomCommand::Client(ClientMsg::Move { direction }) => {
                self.registry.move_player(id, direction, now)
            }
            RoomCommand::Client(ClientMsg::BulletFired { bullet }) => self.registry.fire(id, bullet),
            RoomCommand::Client(ClientMsg::CheckCollision) => self.registry.check_collisions(),
            RoomCommand::Client(ClientMsg::ResetPlayer) => self.registry.reset(id),
        }
    }

    /// Landings, projectile travel and (optionally) the collision scan
    pub fn run_tick(&mut self, now: Instant) -> Vec<Outbound> {
        let mut out = self.registry.land_due(now);

        let culled = self.registry.advance_projectiles(tick_delta(self.settings.tick_rate));
        if culled > 0 {
            trace!(culled, "Projectiles left the arena");
        }

        if self.settings.server_collisions {
            out.extend(self.registry.check_collisions());
        }
        out
    }

    fn publish(&self, out: Vec<Outbound>) {
        for outbound in out {
            // No subscribers is fine; nobody is connected
            if self.outbound_tx.send(outbound).is_err() {
                debug!("Dropped outbound message with no subscribers");
            }
        }
    }

    fn update_counts(&self) {
        self.player_count
            .store(self.registry.player_count(), Ordering::Relaxed);
        self.projectile_count
            .store(self.registry.projectile_count(), Ordering::Relaxed);
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }
}
