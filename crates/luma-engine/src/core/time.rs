/// Largest delta a single frame may see (10 FPS). Longer gaps (a debugger
/// break, a backgrounded app) are clamped so the game does not jump.
pub const MAX_DELTA: f32 = 1.0 / 10.0;

/// Window of the delta moving average, in frames.
pub const SMOOTHING_FRAMES: f32 = 10.0;

/// Frame timing: clamped and smoothed delta, frames per second.
///
/// Driven by a monotonic platform clock in seconds; the clock itself lives
/// with the host.
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    last_time: Option<f64>,
    delta: f32,
    smoothed: Option<f32>,
    fps_time: f32,
    fps_frames: u32,
    fps: u32,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance to `now`. The first tick after creation or [`reset`](Self::reset)
    /// has a zero delta.
    pub fn tick(&mut self, now: f64) {
        let raw = match self.last_time {
            Some(last) => (now - last).max(0.0) as f32,
            None => 0.0,
        };
        self.last_time = Some(now);
        self.delta = raw.min(MAX_DELTA);

        self.smoothed = Some(match self.smoothed {
            Some(avg) => (self.delta + avg * (SMOOTHING_FRAMES - 1.0)) / SMOOTHING_FRAMES,
            None => self.delta,
        });

        self.fps_time += self.delta;
        self.fps_frames += 1;
        if self.fps_time >= 1.0 {
            self.fps = self.fps_frames;
            self.fps_time = 0.0;
            self.fps_frames = 0;
        }
    }

    /// Forget the last timestamp so the next tick does not see the pause gap.
    pub fn reset(&mut self) {
        self.last_time = None;
    }

    /// Clamped delta of the last tick, in seconds.
    pub fn delta(&self) -> f32 {
        self.delta
    }

    /// Moving average of [`delta`](Self::delta).
    pub fn smoothed_delta(&self) -> f32 {
        self.smoothed.unwrap_or(0.0)
    }

    /// Frames counted during the last full second.
    pub fn fps(&self) -> u32 {
        self.fps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tick_has_zero_delta() {
        let mut clock = FrameClock::new();
        clock.tick(100.0);
        assert_eq!(clock.delta(), 0.0);
        clock.tick(100.016);
        assert!((clock.delta() - 0.016).abs() < 1e-4);
    }

    #[test]
    fn long_gap_is_clamped() {
        let mut clock = FrameClock::new();
        clock.tick(0.0);
        clock.tick(5.0);
        assert_eq!(clock.delta(), MAX_DELTA);
    }

    #[test]
    fn smoothing_follows_moving_average() {
        let mut clock = FrameClock::new();
        clock.tick(0.0);
        assert_eq!(clock.smoothed_delta(), 0.0);
        clock.tick(0.05);
        let expected = (0.05 + 0.0 * 9.0) / 10.0;
        assert!((clock.smoothed_delta() - expected).abs() < 1e-6);
    }

    #[test]
    fn fps_counts_a_full_second() {
        let mut clock = FrameClock::new();
        for frame in 0..16 {
            clock.tick(frame as f64 * 0.0625);
        }
        assert_eq!(clock.fps(), 0);
        clock.tick(1.0);
        // The first zero-delta tick counts as a frame too.
        assert_eq!(clock.fps(), 17);
    }

    #[test]
    fn reset_hides_pause_gap() {
        let mut clock = FrameClock::new();
        clock.tick(0.0);
        clock.tick(0.016);
        clock.reset();
        clock.tick(30.0);
        assert_eq!(clock.delta(), 0.0);
    }
}
