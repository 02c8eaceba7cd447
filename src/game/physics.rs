//! Arena geometry, movement steps and the scheduled jump landing

use std::time::{Duration, Instant};

use crate::ws::protocol::{Direction, Facing, Player, PlayerId};

/// Spawn point (feet on the ground line)
pub const SPAWN_X: f32 = 100.0;
pub const SPAWN_Y: f32 = 500.0;

/// Horizontal distance covered by one move command
pub const MOVE_STEP: f32 = 10.0;

/// Upward displacement of a jump
pub const JUMP_HEIGHT: f32 = 150.0;

/// Delay before a jump's displacement is reversed
pub const JUMP_AIRTIME: Duration = Duration::from_millis(500);

/// Client-side fall speed in pixels per second (5px every 50ms)
pub const GRAVITY_SPEED: f32 = 100.0;

/// Play area dimensions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
}

impl Default for Arena {
    fn default() -> Self {
        Self {
            width: 900.0,
            height: 600.0,
        }
    }
}

impl Arena {
    /// The ground strip is the bottom 100px
    pub fn ground_y(&self) -> f32 {
        self.height - 100.0
    }

    /// Horizontal bounds check used for projectile culling
    pub fn contains_x(&self, x: f32) -> bool {
        x >= 0.0 && x <= self.width
    }
}

/// A fresh player at the spawn point
pub fn spawn_player(id: PlayerId) -> Player {
    Player {
        id,
        x: SPAWN_X,
        y: SPAWN_Y,
        facing: Facing::Right,
        alive: true,
    }
}

/// Outcome of applying a movement command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Walked,
    /// Player is airborne and must be given a landing
    Jumped,
}

/// Apply a movement command to a player's position
pub fn apply_step(player: &mut Player, direction: Direction) -> Step {
    match direction {
        Direction::Left => {
            player.x -= MOVE_STEP;
            player.facing = Facing::Left;
            Step::Walked
        }
        Direction::Right => {
            player.x += MOVE_STEP;
            player.facing = Facing::Right;
            Step::Walked
        }
        Direction::Jump => {
            player.y -= JUMP_HEIGHT;
            Step::Jumped
        }
    }
}

/// Reversal of one jump, tied to the life it was issued in
#[derive(Debug, Clone, PartialEq)]
pub struct PendingLanding {
    pub player_id: PlayerId,
    pub generation: u64,
    pub due: Instant,
}

impl PendingLanding {
    pub fn new(player_id: PlayerId, generation: u64, jumped_at: Instant) -> Self {
        Self {
            player_id,
            generation,
            due: jumped_at + JUMP_AIRTIME,
        }
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.due
    }
}

/// Advance a locally simulated fall towards the ground line.
/// Returns true if the player moved.
pub fn apply_gravity(player: &mut Player, ground_y: f32, dt: f32) -> bool {
    if !player.alive || player.y >= ground_y {
        return false;
    }
    player.y = (player.y + GRAVITY_SPEED * dt).min(ground_y);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn horizontal_steps_update_facing() {
        let mut player = spawn_player(Uuid::new_v4());

        assert_eq!(apply_step(&mut player, Direction::Left), Step::Walked);
        assert_eq!(player.x, SPAWN_X - MOVE_STEP);
        assert_eq!(player.facing, Facing::Left);

        apply_step(&mut player, Direction::Right);
        apply_step(&mut player, Direction::Right);
        assert_eq!(player.x, SPAWN_X + MOVE_STEP);
        assert_eq!(player.facing, Facing::Right);
    }

    #[test]
    fn jump_keeps_facing_and_lifts_player() {
        let mut player = spawn_player(Uuid::new_v4());
        player.facing = Facing::Left;

        assert_eq!(apply_step(&mut player, Direction::Jump), Step::Jumped);
        assert_eq!(player.y, SPAWN_Y - JUMP_HEIGHT);
        assert_eq!(player.facing, Facing::Left);
    }

    #[test]
    fn landing_is_due_after_airtime() {
        let start = Instant::now();
        let landing = PendingLanding::new(Uuid::new_v4(), 0, start);

        assert!(!landing.is_due(start + Duration::from_millis(499)));
        assert!(landing.is_due(start + JUMP_AIRTIME));
    }

    #[test]
    fn gravity_stops_at_ground_line() {
        let arena = Arena::default();
        let mut player = spawn_player(Uuid::new_v4());
        player.y = arena.ground_y() - 3.0;

        assert!(apply_gravity(&mut player, arena.ground_y(), 0.05));
        assert_eq!(player.y, arena.ground_y());
        assert!(!apply_gravity(&mut player, arena.ground_y(), 0.05));
    }

    #[test]
    fn dead_players_do_not_fall() {
        let mut player = spawn_player(Uuid::new_v4());
        player.y = 200.0;
        player.alive = false;

        assert!(!apply_gravity(&mut player, 500.0, 1.0));
        assert_eq!(player.y, 200.0);
    }
}
