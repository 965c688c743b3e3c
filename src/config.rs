//! The few numeric knobs the scheduling algorithm leaves as implementation-chosen, rather than
//! hard-coded magic numbers scattered through the selection and housekeeping code.

/// Configuration for a single [`crate::cpu::Scheduler`] instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Extra ticks added to every computed one-shot timer interval, to absorb dispatch jitter.
    /// Not pinned to any value by the source design; defaults to `0`.
    pub timer_slack: u64,
    /// Period, in ticks, of the long-lived housekeeping task.
    pub housekeeping_period: u64,
    /// Per-period compute slice, in ticks, granted to the housekeeping task.
    pub housekeeping_slice: u64,
}

impl SchedulerConfig {
    /// `timer_slack = 0`, a housekeeping task released every 1,000,000 ticks with a slice of
    /// 10,000 ticks, generous enough to drain a full `MAX_QUEUE` worth of arrivals or exits
    /// without itself missing a release.
    pub const fn new() -> Self {
        Self { timer_slack: 0, housekeeping_period: 1_000_000, housekeeping_slice: 10_000 }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::new()
    }
}
