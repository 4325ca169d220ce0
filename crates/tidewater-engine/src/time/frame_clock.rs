use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Time elapsed since the previous tick, in seconds.
    pub dt: f32,

    /// Sum of every `dt` handed out so far, including this one.
    pub total: f32,

    /// Monotonic frame counter.
    pub frame_index: u64,
}

#[derive(Debug, Clone)]
enum Source {
    /// Real time, clamped.
    Wall {
        last: Instant,
        dt_min: Duration,
        dt_max: Duration,
    },
    /// A constant step, for headless and reproducible runs.
    Fixed(Duration),
}

/// Frame clock producing `FrameTime` snapshots.
///
/// Wall-clock delta time is clamped to avoid pathological values when the
/// process is paused by the debugger or stalls; a long stall would otherwise
/// feed the wave simulation and the disturbance timer one huge step.
#[derive(Debug, Clone)]
pub struct FrameClock {
    source: Source,
    total: f32,
    frame_index: u64,
}

impl FrameClock {
    /// Creates a wall clock with default clamps (0.1 ms .. 250 ms).
    pub fn new() -> Self {
        Self::with_clamps(Duration::from_micros(100), Duration::from_millis(250))
    }

    /// Creates a wall clock with custom delta-time clamps.
    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        Self {
            source: Source::Wall {
                last: Instant::now(),
                dt_min,
                dt_max,
            },
            total: 0.0,
            frame_index: 0,
        }
    }

    /// Creates a clock that advances by exactly `dt` seconds per tick.
    pub fn fixed(dt: f32) -> Self {
        Self {
            source: Source::Fixed(Duration::from_secs_f32(dt.max(0.0))),
            total: 0.0,
            frame_index: 0,
        }
    }

    /// Resets the wall-clock baseline, e.g. after resuming from a pause.
    pub fn reset(&mut self) {
        if let Source::Wall { last, .. } = &mut self.source {
            *last = Instant::now();
        }
    }

    /// Advances the clock and returns a new `FrameTime`.
    pub fn tick(&mut self) -> FrameTime {
        let dt = match &mut self.source {
            Source::Wall { last, dt_min, dt_max } => {
                let now = Instant::now();
                let dt = now.saturating_duration_since(*last).clamp(*dt_min, *dt_max);
                *last = now;
                dt
            }
            Source::Fixed(dt) => *dt,
        };

        let dt = dt.as_secs_f32();
        self.total += dt;

        let ft = FrameTime {
            dt,
            total: self.total,
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        ft
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

    #[test]
    fn fixed_clock_is_deterministic() {
        let mut clock = FrameClock::fixed(0.25);
        let a = clock.tick();
        let b = clock.tick();
        assert_eq!((a.dt, a.total, a.frame_index), (0.25, 0.25, 0));
        assert_eq!((b.dt, b.total, b.frame_index), (0.25, 0.5, 1));
    }

    #[test]
    fn wall_clock_respects_clamps() {
        let mut clock = FrameClock::with_clamps(Duration::from_millis(5), Duration::from_millis(10));
        let ft = clock.tick();
        assert!(ft.dt > 0.0049 && ft.dt < 0.0101);
        std::thread::sleep(Duration::from_millis(30));
        assert!(clock.tick().dt < 0.0101);
    }
}
