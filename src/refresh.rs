use std::time::Duration;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_EVERY_TICKS: u64 = 5;
pub const DEFAULT_BATCH: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshPolicy {
    pub interval: Duration,
    pub every_ticks: u64,
    pub batch_size: usize,
    pub dedupe: bool,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            every_ticks: DEFAULT_EVERY_TICKS,
            batch_size: DEFAULT_BATCH,
            dedupe: false,
        }
    }
}

impl RefreshPolicy {
    /// Tick zero is the initial render and never appends.
    pub fn is_due(&self, tick: u64) -> bool {
        self.every_ticks > 0
            && self.batch_size > 0
            && tick > 0
            && tick.is_multiple_of(self.every_ticks)
    }
}
