//! Drawing target for the presentation loop

use tracing::trace;

/// Flat fills
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    /// Brown ground strip
    Ground,
    /// Gray box standing in for a dead player
    DeadPlayer,
}

/// Image assets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sprite {
    Player,
    Bullet,
}

/// Something the frame loop can draw on
pub trait Surface {
    fn clear(&mut self, width: f32, height: f32);
    fn fill_rect(&mut self, fill: Fill, x: f32, y: f32, w: f32, h: f32);
    fn draw_sprite(&mut self, sprite: Sprite, x: f32, y: f32, w: f32, h: f32);
}

/// Headless surface that emits draw calls as trace events
#[derive(Debug, Default)]
pub struct TraceSurface {
    frames: u64,
}

impl TraceSurface {
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Surface for TraceSurface {
    fn clear(&mut self, width: f32, height: f32) {
        self.frames += 1;
        trace!(frame = self.frames, width, height, "clear");
    }

    fn fill_rect(&mut self, fill: Fill, x: f32, y: f32, w: f32, h: f32) {
        trace!(?fill, x, y, w, h, "fill_rect");
    }

    fn draw_sprite(&mut self, sprite: Sprite, x: f32, y: f32, w: f32, h: f32) {
        trace!(?sprite, x, y, w, h, "draw_sprite");
    }
}
