use glam::Vec2;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::simulator::InputSource;

/// Cursor state fed by window events. Reports a pointer only while the
/// button is held.
#[derive(Debug, Clone, Default)]
pub struct CursorTracker {
    cursor_px: Option<Vec2>,
    pressed: bool,
    window_size: Vec2,
    grid_size: Vec2,
}

impl CursorTracker {
    pub fn new(window_width: u32, window_height: u32, grid_width: usize, grid_height: usize) -> Self {
        Self {
            cursor_px: None,
            pressed: false,
            window_size: Vec2::new(window_width.max(1) as f32, window_height.max(1) as f32),
            grid_size: Vec2::new(grid_width as f32, grid_height as f32),
        }
    }

    pub fn set_cursor(&mut self, x: f64, y: f64) {
        self.cursor_px = Some(Vec2::new(x as f32, y as f32));
    }

    pub fn cursor_left(&mut self) {
        self.cursor_px = None;
    }

    pub fn set_pressed(&mut self, pressed: bool) {
        self.pressed = pressed;
    }

    pub fn set_window_size(&mut self, width: u32, height: u32) {
        self.window_size = Vec2::new(width.max(1) as f32, height.max(1) as f32);
    }

    pub fn set_grid_size(&mut self, width: usize, height: usize) {
        self.grid_size = Vec2::new(width as f32, height as f32);
    }

    /// Window pixels (origin top-left) to grid cells (row 0 at the top).
    pub fn to_grid(&self, px: Vec2) -> Vec2 {
        px / self.window_size * self.grid_size
    }
}

impl InputSource for CursorTracker {
    fn pointer(&mut self) -> Option<Vec2> {
        if !self.pressed {
            return None;
        }
        self.cursor_px.map(|px| self.to_grid(px))
    }
}

/// Scripted pointer for unattended runs: a seeded random walk with momentum
/// that bounces off an inset rectangle.
pub struct WanderingPointer {
    rng: StdRng,
    position: Vec2,
    heading: Vec2,
    min: Vec2,
    max: Vec2,
    speed: f32,
}

impl WanderingPointer {
    pub fn new(seed: u64, grid_width: usize, grid_height: usize, margin: f32, speed: f32) -> Self {
        let size = Vec2::new(grid_width as f32 - 1.0, grid_height as f32 - 1.0);
        let min = Vec2::splat(margin + 1.0).min(size * 0.5);
        let max = (size - Vec2::splat(margin + 1.0)).max(size * 0.5);
        Self {
            rng: StdRng::seed_from_u64(seed),
            position: size * 0.5,
            heading: Vec2::X,
            min,
            max,
            speed,
        }
    }
}

impl InputSource for WanderingPointer {
    fn pointer(&mut self) -> Option<Vec2> {
        let turn = self.rng.gen_range(-0.6f32..0.6);
        self.heading = Vec2::from_angle(turn).rotate(self.heading).normalize_or_zero();
        let mut next = self.position + self.heading * self.speed;
        if next.x < self.min.x || next.x > self.max.x {
            self.heading.x = -self.heading.x;
        }
        if next.y < self.min.y || next.y > self.max.y {
            self.heading.y = -self.heading.y;
        }
        next = next.clamp(self.min, self.max);
        self.position = next;
        Some(next)
    }
}
