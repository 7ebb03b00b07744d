use std::time::{Duration, Instant};

const RATE_WINDOW: Duration = Duration::from_millis(500);

/// Wall-clock dt between ticks plus a rolling FPS / frame-time average.
pub struct FrameClock {
    last_tick: Instant,
    frame_count: u32,
    frame_time_sum: f32,
    last_rate_update: Instant,
}

impl FrameClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            last_tick: now,
            frame_count: 0,
            frame_time_sum: 0.0,
            last_rate_update: now,
        }
    }

    /// Seconds since the previous call.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let dt = now.duration_since(self.last_tick).as_secs_f32();
        self.last_tick = now;
        self.record(dt);
        dt
    }

    fn record(&mut self, dt: f32) {
        self.frame_count += 1;
        self.frame_time_sum += dt;
    }

    /// `(fps, average frame time in ms)` once at least half a second has
    /// accumulated, then starts a new window.
    pub fn poll_rate(&mut self) -> Option<(f32, f32)> {
        self.poll_rate_at(Instant::now())
    }

    fn poll_rate_at(&mut self, now: Instant) -> Option<(f32, f32)> {
        let elapsed = now.duration_since(self.last_rate_update);
        if elapsed < RATE_WINDOW || self.frame_count == 0 {
            return None;
        }
        let fps = self.frame_count as f32 / elapsed.as_secs_f32();
        let avg_frame_time_ms = (self.frame_time_sum / self.frame_count as f32) * 1000.0;
        self.frame_count = 0;
        self.frame_time_sum = 0.0;
        self.last_rate_update = now;
        Some((fps, avg_frame_time_ms))
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
