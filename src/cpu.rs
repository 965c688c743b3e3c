//! The per-CPU scheduler instance and the fixed-size per-CPU table.

use heapless::Vec;
use log::{debug, warn};
use spin::RwLock;

use crate::admission;
use crate::config::SchedulerConfig;
use crate::containers::Containers;
use crate::error::SchedError;
use crate::housekeeping::{self, HousekeepingReport};
use crate::platform::Platform;
use crate::select;
use crate::thread::{Constraints, ContainerTag, HostHandle, Thread, ThreadId, ThreadStatus};

/// A timestamped record of the most recent `need_resched` decision, populated on every call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TimingRecord {
    /// When the dispatched thread started running.
    pub start_time: u64,
    /// The estimated time the dispatched thread would begin (the `end_time` the decision used).
    pub end_time: u64,
    /// The one-shot timer interval armed for this dispatch.
    pub set_time: u64,
}

/// One CPU's scheduler state: its seven thread containers, the currently running thread, the
/// most recent timing record, and its configuration.
///
/// Single-threaded cooperative from its own point of view: only this CPU's ISR and its currently
/// running thread ever touch it. Cross-CPU traffic, load balancing, and thread migration are out
/// of scope; a thread belongs permanently to the CPU that accepted it.
pub struct Scheduler {
    cpu_id: u32,
    containers: Containers,
    current: Option<Thread>,
    timing: TimingRecord,
    config: SchedulerConfig,
}

impl Scheduler {
    /// Create an empty scheduler for `cpu_id`, seeding `main_thread` (status ADMITTED) onto the
    /// Aperiodic heap, the permanent fallback thread `need_resched`'s "both Runnable and
    /// Aperiodic empty" invariant violation assumes is always present. No thread is RUNNING yet;
    /// the first `need_resched` call picks `main_thread` (or whatever else is runnable by then).
    pub fn init(cpu_id: u32, mut main_thread: Thread, config: SchedulerConfig) -> Self {
        main_thread.set_status(ThreadStatus::Admitted);
        let mut containers = Containers::new();
        containers
            .aperiodic
            .enqueue(main_thread)
            .expect("a freshly created Aperiodic heap always has room for its first thread");
        Self { cpu_id, containers, current: None, timing: TimingRecord::default(), config }
    }

    /// This scheduler's CPU id.
    pub fn cpu_id(&self) -> u32 {
        self.cpu_id
    }

    /// The thread currently assigned the CPU, if `need_resched` has run at least once.
    pub fn current(&self) -> Option<&Thread> {
        self.current.as_ref()
    }

    /// The most recent `need_resched` timing record.
    pub fn timing(&self) -> TimingRecord {
        self.timing
    }

    /// Place `thread` into the container named by `tag`.
    pub fn enqueue(&mut self, tag: ContainerTag, thread: Thread) -> Result<(), SchedError> {
        self.containers.enqueue(tag, thread)
    }

    /// Pop the next thread from the container named by `tag`.
    pub fn dequeue(&mut self, tag: ContainerTag) -> Result<Thread, SchedError> {
        self.containers.dequeue(tag)
    }

    /// Remove a specific thread by identity from the container named by `tag`.
    pub fn remove(&mut self, tag: ContainerTag, id: ThreadId) -> Result<Thread, SchedError> {
        self.containers.remove(tag, id)
    }

    /// ISR entry point: run one `need_resched` decision against the currently running thread,
    /// program the one-shot timer through `platform`, and return the newly dispatched thread.
    ///
    /// `end_time` is estimated as `now + 1` (the earliest the next thread could plausibly begin);
    /// callers with a better estimate (e.g. measured context-switch latency) are free to bypass
    /// this wrapper and call [`select::run`] directly with their own `end_time`.
    pub fn need_resched(&mut self, platform: &dyn Platform) -> &Thread {
        let now = platform.now();
        let end_time = now.saturating_add(1);
        let current = self.current.take();
        let outcome = select::run(&mut self.containers, current, now, end_time, &self.config);

        if let Some(miss) = outcome.deadline_miss {
            warn!("thread {:?} missed its deadline by {} ticks", miss.thread, miss.overrun);
        }

        self.timing = TimingRecord { start_time: now, end_time, set_time: outcome.timer_ticks };
        platform.program_oneshot_timer(self.cpu_id, outcome.timer_ticks);
        debug!("cpu {} dispatching thread {:?}, timer armed for {} ticks", self.cpu_id, outcome.next.id(), outcome.timer_ticks);

        self.current = Some(outcome.next);
        self.current.as_ref().expect("just set")
    }

    /// Utilization-only admission test for `candidate`.
    pub fn admit(&self, candidate: &Thread, now: u64) -> bool {
        admission::admit(candidate, now, &self.containers)
    }

    /// Stronger, simulator-backed admission test for `candidate`.
    pub fn admit_with_simulation(&self, candidate: &Thread, now: u64) -> bool {
        admission::admit_with_simulation(candidate, now, &self.containers, &self.config)
    }

    /// Launch the housekeeping task: build it as an ordinary PERIODIC thread from this
    /// scheduler's configured `(housekeeping_slice, housekeeping_period)`, seed it directly onto
    /// Runnable with `status = Admitted`, and hand back its [`ThreadId`].
    ///
    /// Unlike every other real-time thread, housekeeping never passes through Arrival or
    /// `admit`: it is a boot-time system task chosen by the host, not a candidate the
    /// utilization bound screens. Once seeded, its own scheduling is ordinary PERIODIC dispatch
    /// through `need_resched` like any other Runnable thread; nothing in this crate drives its
    /// loop body beyond invoking [`Scheduler::housekeeping_tick`] whenever the context switcher
    /// resumes it.
    pub fn start_housekeeping(&mut self, host: HostHandle, now: u64) -> Result<ThreadId, SchedError> {
        let constraints = Constraints::Periodic {
            period: self.config.housekeeping_period,
            slice: self.config.housekeeping_slice,
        };
        let mut thread = Thread::new(constraints, host, now);
        thread.set_status(ThreadStatus::Admitted);
        let id = thread.id();
        self.containers.enqueue(ContainerTag::Runnable, thread)?;
        Ok(id)
    }

    /// Run one housekeeping pass: drain Arrival into admission, drain Exited into reclamation.
    pub fn housekeeping_tick(&mut self, now: u64) -> HousekeepingReport {
        housekeeping::housekeeping_tick(&mut self.containers, now, &self.config)
    }

    /// Tombstone the currently running thread and push it to Exited; housekeeping will finish
    /// the reclamation. Does not itself choose a replacement; the next `need_resched` call does.
    /// A no-op if no thread is currently RUNNING.
    pub fn thread_exit(&mut self, now: u64) -> Result<(), SchedError> {
        let Some(mut exiting) = self.current.take() else {
            return Ok(());
        };
        exiting.set_status(ThreadStatus::ToBeRemoved);
        exiting.account_running(0, now);
        self.containers.enqueue(ContainerTag::Exited, exiting)
    }
}

/// The fixed-size, per-CPU-id array of scheduler instances, guarded by a single lock.
///
/// This is the only lock in the crate. A hierarchical lock-ordering scheme built for a kernel
/// with dozens of locks would have nothing left to order against here, so none is carried (see
/// DESIGN.md).
pub struct PerCpu<const N: usize> {
    table: RwLock<Vec<Scheduler, N>>,
}

impl<const N: usize> PerCpu<N> {
    /// An empty per-CPU table; schedulers are added with [`PerCpu::insert`] as CPUs come online.
    pub fn new() -> Self {
        Self { table: RwLock::new(Vec::new()) }
    }

    /// Register `scheduler` for its CPU. Fails if the table is already at capacity `N`.
    pub fn insert(&self, scheduler: Scheduler) -> Result<(), SchedError> {
        self.table.write().push(scheduler).map_err(|_| SchedError::QueueFull)
    }

    /// Run `f` against the scheduler owning `cpu_id`, if one is registered.
    pub fn with_scheduler<R>(&self, cpu_id: u32, f: impl FnOnce(&mut Scheduler) -> R) -> Option<R> {
        let mut table = self.table.write();
        table.iter_mut().find(|s| s.cpu_id() == cpu_id).map(f)
    }
}

impl<const N: usize> Default for PerCpu<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::test_support::FakePlatform;

    fn main_thread() -> Thread {
        Thread::new(Constraints::Aperiodic { priority: 0 }, HostHandle(0), 0)
    }

    #[test]
    fn init_has_no_current_until_first_dispatch() {
        let sched = Scheduler::init(0, main_thread(), SchedulerConfig::default());
        assert!(sched.current().is_none());
        assert_eq!(sched.cpu_id(), 0);
    }

    #[test]
    fn need_resched_arms_the_timer_and_updates_current() {
        let mut sched = Scheduler::init(0, main_thread(), SchedulerConfig::default());
        let platform = FakePlatform::new(0);
        platform.set_now(100);
        let next_id = sched.need_resched(&platform).id();
        assert_eq!(sched.current().unwrap().id(), next_id);
        assert!(platform.last_armed().is_some());
    }

    #[test]
    fn per_cpu_table_dispatches_by_cpu_id() {
        let table: PerCpu<4> = PerCpu::new();
        table.insert(Scheduler::init(0, main_thread(), SchedulerConfig::default())).unwrap();
        table.insert(Scheduler::init(1, main_thread(), SchedulerConfig::default())).unwrap();
        let cpu1_id = table.with_scheduler(1, |s| s.cpu_id()).unwrap();
        assert_eq!(cpu1_id, 1);
    }

    #[test]
    fn thread_exit_moves_current_to_exited() {
        let mut sched = Scheduler::init(0, main_thread(), SchedulerConfig::default());
        let platform = FakePlatform::new(0);
        sched.need_resched(&platform);
        sched.thread_exit(50).unwrap();
        let reclaimed = sched.dequeue(ContainerTag::Exited).unwrap();
        assert_eq!(reclaimed.status(), ThreadStatus::ToBeRemoved);
    }

    #[test]
    fn start_housekeeping_seeds_a_periodic_runnable_thread() {
        let config = SchedulerConfig::default();
        let mut sched = Scheduler::init(0, main_thread(), config);
        sched.start_housekeeping(HostHandle(99), 0).unwrap();
        let seeded = sched.dequeue(ContainerTag::Runnable).unwrap();
        assert_eq!(seeded.status(), ThreadStatus::Admitted);
        assert_eq!(seeded.kind(), crate::thread::TaskKind::Periodic);
        assert_eq!(seeded.deadline(), config.housekeeping_period);
    }
}
