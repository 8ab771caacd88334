use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct FrameTime {
    /// Seconds since the previous tick, clamped.
    pub delta: f32,
    /// Seconds since the clock started.
    pub elapsed: f32,
    pub frame_index: u64,
}

/// Produces [`FrameTime`] snapshots once per frame.
///
/// Delta time is clamped so a debugger pause or a minimized window does not
/// teleport the camera on the next frame.
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Instant,
    last: Instant,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
    latest: FrameTime,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    fn starting_at(now: Instant) -> Self {
        Self {
            start: now,
            last: now,
            frame_index: 0,
            dt_min: Duration::from_micros(100),
            dt_max: Duration::from_millis(250),
            latest: FrameTime {
                delta: 0.0,
                elapsed: 0.0,
                frame_index: 0,
            },
        }
    }

    /// Resets the delta baseline without touching elapsed time.
    ///
    /// Used after the surface is reconfigured or the app resumes.
    pub fn reset(&mut self) {
        self.last = Instant::now();
    }

    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> FrameTime {
        let dt = now
            .saturating_duration_since(self.last)
            .clamp(self.dt_min, self.dt_max);
        self.last = now;

        self.latest = FrameTime {
            delta: dt.as_secs_f32(),
            elapsed: now.saturating_duration_since(self.start).as_secs_f32(),
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        self.latest
    }

    /// The snapshot returned by the most recent tick
    pub fn latest(&self) -> FrameTime {
        self.latest
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_delta_is_clamped() {
        let start = Instant::now();
        let mut clock = FrameClock::starting_at(start);

        let first = clock.tick_at(start);
        assert_relative_eq!(first.delta, 0.0001, epsilon = 1e-7);

        let stalled = clock.tick_at(start + Duration::from_secs(3));
        assert_relative_eq!(stalled.delta, 0.25);
        assert_relative_eq!(stalled.elapsed, 3.0);
        assert_eq!(stalled.frame_index, 1);
    }

    #[test]
    fn test_regular_frames_pass_through() {
        let start = Instant::now();
        let mut clock = FrameClock::starting_at(start);
        let frame = clock.tick_at(start + Duration::from_millis(16));
        assert_relative_eq!(frame.delta, 0.016, epsilon = 1e-6);
        assert_eq!(clock.latest(), frame);
    }
}
