use instant::Instant;

/// Clamp a raw frame delta to `[0, max_sec]`. Non-finite input counts as a
/// stalled frame and yields `max_sec` (or 0 for NaN).
#[inline]
pub fn clamp_frame_delta(raw_sec: f32, max_sec: f32) -> f32 {
    if raw_sec.is_nan() {
        return 0.0;
    }
    raw_sec.clamp(0.0, max_sec)
}

/// Frame-to-frame delta with an upper bound, so long gaps (a backgrounded tab)
/// never produce one huge advection step.
#[derive(Clone, Debug)]
pub struct FrameClock {
    last: Option<Instant>,
    max_delta: f32,
}

impl FrameClock {
    pub fn new(max_delta: f32) -> Self {
        Self {
            last: None,
            max_delta,
        }
    }

    /// Seconds since the previous tick, clamped. The first tick returns 0.
    pub fn tick(&mut self, now: Instant) -> f32 {
        let raw = match self.last {
            Some(last) if now > last => (now - last).as_secs_f32(),
            _ => 0.0,
        };
        self.last = Some(now);
        clamp_frame_delta(raw, self.max_delta)
    }

    pub fn reset(&mut self) {
        self.last = None;
    }

    pub fn max_delta(&self) -> f32 {
        self.max_delta
    }
}
