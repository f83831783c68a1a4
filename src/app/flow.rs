use std::time::Duration;

/// Interval between advances of the dashed flow overlay.
pub(super) const FLOW_TICK: Duration = Duration::from_millis(30);
pub(super) const FLOW_DASH: f32 = 6.0;
pub(super) const FLOW_GAP: f32 = 8.0;
const FLOW_STEP: f32 = 1.0;
/// One dash period, so wrapping the offset never shifts the pattern.
const FLOW_PERIOD: f32 = FLOW_DASH + FLOW_GAP;

/// Fixed-interval clock driving the dash offset of highlighted edges.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(super) struct FlowClock {
    offset: f32,
    accumulator: f32,
    running: bool,
}

impl FlowClock {
    pub(super) fn offset(&self) -> f32 {
        self.offset
    }

    pub(super) fn is_running(&self) -> bool {
        self.running
    }

    /// Advances by whole ticks while `enabled`. Returns the delay until the next tick, or
    /// `None` once the clock is stopped.
    pub(super) fn advance(&mut self, enabled: bool, delta_seconds: f32) -> Option<Duration> {
        if !enabled {
            self.running = false;
            self.accumulator = 0.0;
            return None;
        }

        let tick = FLOW_TICK.as_secs_f32();
        if self.running {
            self.accumulator += delta_seconds.max(0.0);
        }
        self.running = true;

        while self.accumulator >= tick {
            self.accumulator -= tick;
            self.offset = (self.offset + FLOW_STEP) % FLOW_PERIOD;
        }

        Some(Duration::from_secs_f32((tick - self.accumulator).max(0.0)))
    }
}
