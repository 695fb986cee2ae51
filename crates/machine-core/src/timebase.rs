use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Wall clock for real-time playback. Machine time never reads it; hosts use
/// it to decide which frame to request next.
#[derive(Debug, Clone, Copy)]
pub struct PlaybackClock {
    start: Instant,
}

impl PlaybackClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Monotonic microseconds since start.
    pub fn now_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }

    /// Wall-clock microseconds since Unix epoch (for recorded logs only).
    pub fn unix_us(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_micros() as u64
    }

    /// Frame that should be on screen now at `frame_rate`.
    pub fn frame_at(&self, frame_rate: f64) -> u32 {
        frame_for(self.start.elapsed(), frame_rate)
    }

    /// Time until `frame` is due, zero if already late. Saturates at
    /// `Duration::MAX` for rates too slow to represent.
    pub fn until_frame(&self, frame: u32, frame_rate: f64) -> Duration {
        if frame_rate <= 0.0 {
            return Duration::ZERO;
        }
        let due = Duration::try_from_secs_f64(f64::from(frame) / frame_rate)
            .unwrap_or(Duration::MAX);
        due.saturating_sub(self.start.elapsed())
    }
}

impl Default for PlaybackClock {
    fn default() -> Self {
        Self::new()
    }
}

fn frame_for(elapsed: Duration, frame_rate: f64) -> u32 {
    if frame_rate <= 0.0 {
        return 0;
    }
    (elapsed.as_secs_f64() * frame_rate).floor() as u32
}
