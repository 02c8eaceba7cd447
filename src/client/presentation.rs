//! The presentation loop: input translation, per-frame step, game-over state

use std::str::FromStr;

use tracing::debug;

use crate::config::{ClientConfig, ReplayMode};
use crate::game::combat::{self, PLAYER_HEIGHT, PLAYER_WIDTH, PROJECTILE_HEIGHT, PROJECTILE_WIDTH};
use crate::game::physics::{self, Arena};
use crate::ws::protocol::{ClientMsg, Direction, ServerMsg};

use super::mirror::{MirrorEvent, RoomMirror};
use super::surface::{Fill, Sprite, Surface};

/// Discrete player inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    Left,
    Right,
    Jump,
    Shoot,
    Reset,
}

impl FromStr for InputAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a" | "left" => Ok(Self::Left),
            "d" | "right" => Ok(Self::Right),
            "w" | "jump" => Ok(Self::Jump),
            "f" | "shoot" => Ok(Self::Shoot),
            "r" | "reset" | "play again" => Ok(Self::Reset),
            other => Err(format!("unknown input '{}'", other)),
        }
    }
}

/// What the connection should do in response to an input
#[derive(Debug, Clone, PartialEq)]
pub enum ClientAction {
    Send(ClientMsg),
    /// Drop the session and join again
    Reconnect,
}

/// Game-over overlay changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affordance {
    ShowGameOver,
    HideGameOver,
}

pub struct PresentationLoop {
    arena: Arena,
    game_over_once: bool,
    replay: ReplayMode,
    poll_collisions: bool,
    mirror: RoomMirror,
    running: bool,
    game_over_displayed: bool,
}

impl PresentationLoop {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            arena: config.arena(),
            game_over_once: config.game_over_once,
            replay: config.replay,
            poll_collisions: config.poll_collisions,
            mirror: RoomMirror::new(),
            running: true,
            game_over_displayed: false,
        }
    }

    pub fn mirror(&self) -> &RoomMirror {
        &self.mirror
    }

    /// False while the local player is dead and waiting for a reset
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn game_over_displayed(&self) -> bool {
        self.game_over_displayed
    }

    /// Apply a broadcast; reports overlay changes for the local player
    pub fn on_server_msg(&mut self, msg: ServerMsg) -> Option<Affordance> {
        match self.mirror.apply(msg) {
            MirrorEvent::Nothing => None,
            MirrorEvent::LocalDied => {
                self.running = false;
                if self.game_over_once && self.game_over_displayed {
                    return None;
                }
                self.game_over_displayed = true;
                Some(Affordance::ShowGameOver)
            }
            MirrorEvent::LocalRevived => {
                self.running = true;
                self.game_over_displayed = false;
                Some(Affordance::HideGameOver)
            }
        }
    }

    /// Translate an input into an outbound command. The mirror is never
    /// touched here; the server's broadcast is what updates it.
    pub fn handle_input(&self, input: InputAction) -> Option<ClientAction> {
        let action = match input {
            InputAction::Left => ClientAction::Send(ClientMsg::Move {
                direction: Direction::Left,
            }),
            InputAction::Right => ClientAction::Send(ClientMsg::Move {
                direction: Direction::Right,
            }),
            InputAction::Jump => ClientAction::Send(ClientMsg::Move {
                direction: Direction::Jump,
            }),
            InputAction::Shoot => {
                let shooter = self.mirror.local_player().filter(|p| p.alive)?;
                ClientAction::Send(ClientMsg::BulletFired {
                    bullet: combat::shot_from(shooter),
                })
            }
            InputAction::Reset => match self.replay {
                ReplayMode::Reset => ClientAction::Send(ClientMsg::ResetPlayer),
                ReplayMode::Reload => ClientAction::Reconnect,
            },
        };
        Some(action)
    }

    /// One animation frame: draw, move projectiles locally, cull, fall,
    /// and poll the server for collisions. Does nothing while suspended.
    pub fn frame(&mut self, dt: f32, surface: &mut impl Surface) -> Vec<ClientMsg> {
        if !self.running {
            return Vec::new();
        }

        let width = self.arena.width;
        let height = self.arena.height;
        let ground_y = self.arena.ground_y();

        surface.clear(width, height);
        surface.fill_rect(Fill::Ground, 0.0, ground_y, width, height - ground_y);

        for player in self.mirror.players.values() {
            let top = player.y - PLAYER_HEIGHT;
            if player.alive {
                surface.draw_sprite(Sprite::Player, player.x, top, PLAYER_WIDTH, PLAYER_HEIGHT);
            } else {
                surface.fill_rect(Fill::DeadPlayer, player.x, top, PLAYER_WIDTH, PLAYER_HEIGHT);
            }
        }

        let arena = self.arena;
        self.mirror.projectiles.retain_mut(|bullet| {
            if !arena.contains_x(bullet.x) {
                return false;
            }
            surface.draw_sprite(
                Sprite::Bullet,
                bullet.x,
                bullet.y,
                PROJECTILE_WIDTH,
                PROJECTILE_HEIGHT,
            );
            combat::advance(bullet, dt);
            true
        });

        if let Some(local) = self.mirror.local_player_mut() {
            if physics::apply_gravity(local, ground_y, dt) {
                debug!(y = local.y, "Local fall");
            }
        }

        if self.poll_collisions {
            vec![ClientMsg::CheckCollision]
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::physics::spawn_player;
    use crate::ws::protocol::{Facing, Projectile};
    use uuid::Uuid;

    #[derive(Default)]
    struct RecordingSurface {
        clears: usize,
        fills: Vec<Fill>,
        sprites: Vec<(Sprite, f32, f32)>,
    }

    impl Surface for RecordingSurface {
        fn clear(&mut self, _width: f32, _height: f32) {
            self.clears += 1;
        }

        fn fill_rect(&mut self, fill: Fill, _x: f32, _y: f32, _w: f32, _h: f32) {
            self.fills.push(fill);
        }

        fn draw_sprite(&mut self, sprite: Sprite, x: f32, y: f32, _w: f32, _h: f32) {
            self.sprites.push((sprite, x, y));
        }
    }

    fn joined(config: &ClientConfig) -> (PresentationLoop, Uuid) {
        let id = Uuid::new_v4();
        let mut view = PresentationLoop::new(config);
        view.on_server_msg(ServerMsg::Welcome { id });
        view.on_server_msg(ServerMsg::NewPlayer {
            player: spawn_player(id),
        });
        (view, id)
    }

    #[test]
    fn inputs_parse_from_keys_and_words() {
        assert_eq!("a".parse::<InputAction>(), Ok(InputAction::Left));
        assert_eq!(" Jump ".parse::<InputAction>(), Ok(InputAction::Jump));
        assert_eq!("play again".parse::<InputAction>(), Ok(InputAction::Reset));
        assert!("dance".parse::<InputAction>().is_err());
    }

    #[test]
    fn movement_inputs_become_move_commands() {
        let (view, _) = joined(&ClientConfig::default());
        assert_eq!(
            view.handle_input(InputAction::Jump),
            Some(ClientAction::Send(ClientMsg::Move {
                direction: Direction::Jump
            }))
        );
    }

    #[test]
    fn shoot_builds_bullet_without_echoing_locally() {
        let (view, id) = joined(&ClientConfig::default());

        let action = view.handle_input(InputAction::Shoot);
        assert_eq!(
            action,
            Some(ClientAction::Send(ClientMsg::BulletFired {
                bullet: Projectile {
                    owner: id,
                    x: 150.0,
                    y: 475.0,
                    direction: Facing::Right,
                }
            }))
        );
        assert!(view.mirror().projectiles.is_empty());
    }

    #[test]
    fn shoot_before_welcome_does_nothing() {
        let view = PresentationLoop::new(&ClientConfig::default());
        assert_eq!(view.handle_input(InputAction::Shoot), None);
    }

    #[test]
    fn dead_player_cannot_shoot_until_reset() {
        let (mut view, id) = joined(&ClientConfig::default());
        view.on_server_msg(ServerMsg::PlayerDied { id });
        assert_eq!(view.handle_input(InputAction::Shoot), None);

        view.on_server_msg(ServerMsg::ResetPlayer {
            player: spawn_player(id),
        });
        assert!(matches!(
            view.handle_input(InputAction::Shoot),
            Some(ClientAction::Send(ClientMsg::BulletFired { .. }))
        ));
    }

    #[test]
    fn frame_draws_scene_and_polls_collisions() {
        let (mut view, id) = joined(&ClientConfig::default());
        let other = Uuid::new_v4();
        let mut dead = spawn_player(other);
        dead.alive = false;
        view.on_server_msg(ServerMsg::NewPlayer { player: dead });
        view.on_server_msg(ServerMsg::BulletFired {
            bullet: Projectile {
                owner: id,
                x: 300.0,
                y: 475.0,
                direction: Facing::Right,
            },
        });

        let mut surface = RecordingSurface::default();
        let out = view.frame(1.0 / 60.0, &mut surface);

        assert_eq!(out, vec![ClientMsg::CheckCollision]);
        assert_eq!(surface.clears, 1);
        assert_eq!(surface.fills, vec![Fill::Ground, Fill::DeadPlayer]);
        assert!(surface.sprites.contains(&(Sprite::Player, 100.0, 450.0)));
        assert!(surface.sprites.contains(&(Sprite::Bullet, 300.0, 475.0)));
        assert!((view.mirror().projectiles[0].x - 310.0).abs() < 1e-3);
    }

    #[test]
    fn offscreen_projectiles_are_dropped() {
        let (mut view, id) = joined(&ClientConfig::default());
        view.on_server_msg(ServerMsg::BulletFired {
            bullet: Projectile {
                owner: id,
                x: -5.0,
                y: 475.0,
                direction: Facing::Left,
            },
        });

        let mut surface = RecordingSurface::default();
        view.frame(1.0 / 60.0, &mut surface);

        assert!(view.mirror().projectiles.is_empty());
        assert!(!surface.sprites.iter().any(|(s, _, _)| *s == Sprite::Bullet));
    }

    #[test]
    fn local_player_falls_to_ground_line() {
        let (mut view, id) = joined(&ClientConfig::default());
        view.on_server_msg(ServerMsg::PlayerMoved {
            id,
            x: 100.0,
            y: 350.0,
            facing: Facing::Right,
        });

        let mut surface = RecordingSurface::default();
        view.frame(0.5, &mut surface);
        assert_eq!(view.mirror().local_player().unwrap().y, 400.0);

        for _ in 0..10 {
            view.frame(0.5, &mut surface);
        }
        assert_eq!(view.mirror().local_player().unwrap().y, 500.0);
    }

    #[test]
    fn death_suspends_loop_until_reset() {
        let (mut view, id) = joined(&ClientConfig::default());

        assert_eq!(
            view.on_server_msg(ServerMsg::PlayerDied { id }),
            Some(Affordance::ShowGameOver)
        );
        assert!(!view.is_running());

        let mut surface = RecordingSurface::default();
        assert!(view.frame(1.0 / 60.0, &mut surface).is_empty());
        assert_eq!(surface.clears, 0);

        assert_eq!(
            view.handle_input(InputAction::Reset),
            Some(ClientAction::Send(ClientMsg::ResetPlayer))
        );
        assert_eq!(
            view.on_server_msg(ServerMsg::ResetPlayer {
                player: spawn_player(id)
            }),
            Some(Affordance::HideGameOver)
        );
        assert!(view.is_running());
        assert_eq!(view.frame(1.0 / 60.0, &mut surface).len(), 1);
    }

    #[test]
    fn game_over_shown_once_per_death_when_configured() {
        let (mut once, id) = joined(&ClientConfig::default());
        once.on_server_msg(ServerMsg::PlayerDied { id });
        assert_eq!(once.on_server_msg(ServerMsg::PlayerDied { id }), None);

        let config = ClientConfig {
            game_over_once: false,
            ..ClientConfig::default()
        };
        let (mut repeat, id) = joined(&config);
        repeat.on_server_msg(ServerMsg::PlayerDied { id });
        assert_eq!(
            repeat.on_server_msg(ServerMsg::PlayerDied { id }),
            Some(Affordance::ShowGameOver)
        );
    }

    #[test]
    fn reload_mode_reconnects_instead_of_resetting() {
        let config = ClientConfig {
            replay: ReplayMode::Reload,
            ..ClientConfig::default()
        };
        let (view, _) = joined(&config);
        assert_eq!(view.handle_input(InputAction::Reset), Some(ClientAction::Reconnect));
    }

    #[test]
    fn polling_can_be_disabled() {
        let config = ClientConfig {
            poll_collisions: false,
            ..ClientConfig::default()
        };
        let (mut view, _) = joined(&config);
        let mut surface = RecordingSurface::default();
        assert!(view.frame(1.0 / 60.0, &mut surface).is_empty());
        assert_eq!(surface.clears, 1);
    }
}
