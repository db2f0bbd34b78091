use std::time::{Duration, Instant};

/// Outcome of polling a [`PulseTask`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PulseStep {
    /// Still running; `phase` goes from 0 to 1 over the pulse.
    Running { phase: f32 },
    Expired,
    /// The view changed since the pulse started.
    Stale,
}

/// A timed highlight, tied to the epoch it was started in.
#[derive(Clone, Debug)]
pub struct PulseTask {
    epoch: u64,
    started_at: Instant,
    duration: Duration,
}

impl PulseTask {
    pub fn new(epoch: u64, started_at: Instant, duration: Duration) -> Self {
        Self {
            epoch,
            started_at,
            duration,
        }
    }

    pub fn poll(&self, current_epoch: u64, now: Instant) -> PulseStep {
        if self.epoch != current_epoch {
            return PulseStep::Stale;
        }
        let elapsed = now.saturating_duration_since(self.started_at);
        if elapsed >= self.duration {
            return PulseStep::Expired;
        }
        PulseStep::Running {
            phase: elapsed.as_secs_f32() / self.duration.as_secs_f32(),
        }
    }
}
