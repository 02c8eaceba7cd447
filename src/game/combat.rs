//! Combat system - hit-boxes, shot origin, projectile travel

use crate::ws::protocol::{Facing, Player, PlayerId, Projectile};

use super::physics::Arena;

/// Player hit-box, extending up from the feet
pub const PLAYER_WIDTH: f32 = 50.0;
pub const PLAYER_HEIGHT: f32 = 50.0;

/// Projectile hit-box, extending down from the top-left corner
pub const PROJECTILE_WIDTH: f32 = 20.0;
pub const PROJECTILE_HEIGHT: f32 = 10.0;

/// Projectile speed in pixels per second (10px per 60Hz frame)
pub const PROJECTILE_SPEED: f32 = 600.0;

/// Axis-aligned overlap between a projectile and a player
pub fn overlaps(bullet: &Projectile, player: &Player) -> bool {
    bullet.x < player.x + PLAYER_WIDTH
        && bullet.x + PROJECTILE_WIDTH > player.x
        && bullet.y < player.y
        && bullet.y + PROJECTILE_HEIGHT > player.y - PLAYER_HEIGHT
}

/// Whether `bullet` can kill `player`: alive, not its owner, overlapping
pub fn can_hit(bullet: &Projectile, player: &Player) -> bool {
    player.alive && player.id != bullet.owner && overlaps(bullet, player)
}

/// Projectile leaving the muzzle of `shooter`
pub fn shot_from(shooter: &Player) -> Projectile {
    let x = match shooter.facing {
        Facing::Right => shooter.x + PLAYER_WIDTH,
        Facing::Left => shooter.x - PROJECTILE_WIDTH,
    };
    Projectile {
        owner: shooter.id,
        x,
        y: shooter.y - PLAYER_HEIGHT / 2.0,
        direction: shooter.facing,
    }
}

/// Move a projectile along its direction
pub fn advance(bullet: &mut Projectile, dt: f32) {
    let dx = PROJECTILE_SPEED * dt;
    match bullet.direction {
        Facing::Right => bullet.x += dx,
        Facing::Left => bullet.x -= dx,
    }
}

/// Advance every projectile and drop the ones that left the arena.
/// Returns how many were dropped.
pub fn advance_and_cull(bullets: &mut Vec<Projectile>, arena: &Arena, dt: f32) -> usize {
    let before = bullets.len();
    bullets.retain_mut(|bullet| {
        if !arena.contains_x(bullet.x) {
            return false;
        }
        advance(bullet, dt);
        true
    });
    before - bullets.len()
}

/// Hit result from combat resolution
#[derive(Debug, Clone, PartialEq)]
pub struct HitResult {
    pub projectile_index: usize,
    pub shooter_id: PlayerId,
    pub target_id: PlayerId,
}
