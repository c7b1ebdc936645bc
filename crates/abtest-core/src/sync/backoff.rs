/// Tick-skipping schedule after failed syncs.
///
/// Each consecutive failure doubles the unavailable window and adds one tick,
/// so the skip counts run 1, 3, 7, 15, ... until a success resets them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Backoff {
    consecutive_failures: u32,
    unavailable_ticks: u64,
    ticks_to_skip: u64,
}

impl Backoff {
    /// Register a failure and return the number of ticks to skip.
    pub fn record_failure(&mut self) -> u64 {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.unavailable_ticks = self.unavailable_ticks.saturating_mul(2).saturating_add(1);
        self.ticks_to_skip = self.unavailable_ticks;
        self.ticks_to_skip
    }

    pub fn record_success(&mut self) {
        *self = Self::default();
    }

    /// Consume one skipped tick; false when the tick should run.
    pub fn try_skip(&mut self) -> bool {
        if self.ticks_to_skip == 0 {
            return false;
        }
        self.ticks_to_skip -= 1;
        true
    }

    pub const fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub const fn unavailable_ticks(&self) -> u64 {
        self.unavailable_ticks
    }

    pub const fn ticks_to_skip(&self) -> u64 {
        self.ticks_to_skip
    }
}
