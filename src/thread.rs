//! Thread descriptors: identity, scheduling class, and timing counters.

use core::sync::atomic::{AtomicU64, Ordering};

static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

/// Globally unique thread identifier, monotonically assigned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ThreadId(u64);

impl ThreadId {
    /// Allocate a fresh, never-reused thread id.
    pub fn new() -> Self {
        Self(NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Reconstruct a thread id from its raw value (tests, serialization at the host boundary).
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw numeric value.
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl Default for ThreadId {
    fn default() -> Self {
        Self::new()
    }
}

/// Opaque back-link to the host kernel's own thread object.
///
/// This crate never dereferences a `HostHandle`; it is carried purely so the context-switch
/// primitive the host supplies (out of scope for this core) knows which of its own threads to
/// resume.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HostHandle(pub u64);

/// The three scheduling classes, carrying their class-specific parameters.
///
/// This is the single source of truth for a thread's `type`: rather than storing a redundant
/// type tag alongside the union, the discriminant of `Constraints` itself answers "what kind of
/// thread is this".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Constraints {
    /// Repeats forever; `slice` ticks of compute must be granted every `period` ticks.
    Periodic {
        /// Ticks between releases.
        period: u64,
        /// Ticks of compute guaranteed per release. Must be `<= period`.
        slice: u64,
    },
    /// Runs once for `work` ticks before `relative_deadline` ticks (from admission) elapse.
    Sporadic {
        /// Ticks of compute budget.
        work: u64,
        /// Deadline relative to the moment the thread was created, in ticks.
        relative_deadline: u64,
    },
    /// No timing constraint; ordered by `priority`, which ages with accumulated run time.
    Aperiodic {
        /// Smaller is more urgent.
        priority: i32,
    },
}

/// The scheduling class a [`Constraints`] value belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskKind {
    /// See [`Constraints::Periodic`].
    Periodic,
    /// See [`Constraints::Sporadic`].
    Sporadic,
    /// See [`Constraints::Aperiodic`].
    Aperiodic,
}

impl Constraints {
    /// The scheduling class this constraint set belongs to.
    pub fn kind(&self) -> TaskKind {
        match self {
            Constraints::Periodic { .. } => TaskKind::Periodic,
            Constraints::Sporadic { .. } => TaskKind::Sporadic,
            Constraints::Aperiodic { .. } => TaskKind::Aperiodic,
        }
    }
}

/// Which container currently holds a thread.
///
/// Every enqueue sets the destination thread's `container_tag` to match, so a thread always
/// knows where it last landed without the container needing to ask (see DESIGN.md).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContainerTag {
    /// Binary heap, EDF-ordered, currently-eligible real-time threads.
    Runnable,
    /// Binary heap, EDF-ordered, periodic threads awaiting their next release.
    Pending,
    /// Binary heap, priority-ordered, aperiodic threads.
    Aperiodic,
    /// FIFO ring, newly created threads awaiting admission.
    Arrival,
    /// FIFO ring, threads blocked on an opaque external event.
    Waiting,
    /// FIFO ring, threads sleeping until a wake tick.
    Sleeping,
    /// FIFO ring, threads that have exited and await housekeeping reclamation.
    Exited,
}

/// Lifecycle state of a thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThreadStatus {
    /// Created, sitting in Arrival, not yet seen by the admission controller.
    Arrived,
    /// Accepted by `admit`, now schedulable.
    Admitted,
    /// Blocked on an opaque external event.
    Waiting,
    /// Currently assigned the CPU.
    Running,
    /// Tombstoned: will be purged the next time a container pops or scans over it.
    ToBeRemoved,
    /// Fully purged; storage may be reclaimed.
    Removed,
    /// Sleeping until a wake tick.
    Sleeping,
}

/// A scheduled thread: identity, class, lifecycle state, and timing counters.
#[derive(Clone, Debug)]
pub struct Thread {
    id: ThreadId,
    status: ThreadStatus,
    container_tag: ContainerTag,
    constraints: Constraints,
    start_time: u64,
    run_time: u64,
    deadline: u64,
    exit_time: u64,
    host: HostHandle,
}

impl Thread {
    /// Construct a thread descriptor with `status = Arrived`, as an external thread factory
    /// would on creation.
    ///
    /// `now` is used to compute the absolute `deadline`: `now + period` for PERIODIC, `now +
    /// relative_deadline` for SPORADIC, and is unused for APERIODIC.
    pub fn new(constraints: Constraints, host: HostHandle, now: u64) -> Self {
        let deadline = match constraints {
            Constraints::Periodic { period, .. } => now.wrapping_add(period),
            Constraints::Sporadic { relative_deadline, .. } => now.wrapping_add(relative_deadline),
            Constraints::Aperiodic { .. } => 0,
        };
        Self {
            id: ThreadId::new(),
            status: ThreadStatus::Arrived,
            container_tag: ContainerTag::Arrival,
            constraints,
            start_time: now,
            run_time: 0,
            deadline,
            exit_time: now,
            host,
        }
    }

    /// This thread's identity.
    pub fn id(&self) -> ThreadId {
        self.id
    }

    /// This thread's scheduling class and parameters.
    pub fn constraints(&self) -> Constraints {
        self.constraints
    }

    /// This thread's scheduling class.
    pub fn kind(&self) -> TaskKind {
        self.constraints.kind()
    }

    /// Current lifecycle state.
    pub fn status(&self) -> ThreadStatus {
        self.status
    }

    /// Set the lifecycle state. Used by containers on enqueue and by `thread_exit`.
    pub fn set_status(&mut self, status: ThreadStatus) {
        self.status = status;
    }

    /// Which container currently (claims to) hold this thread.
    pub fn container_tag(&self) -> ContainerTag {
        self.container_tag
    }

    /// Set the container tag. Every container's `enqueue` calls this so the thread's own
    /// bookkeeping always matches its actual location (invariant 1).
    pub fn set_container_tag(&mut self, tag: ContainerTag) {
        self.container_tag = tag;
    }

    /// Force this thread's absolute deadline. Crate-internal: scenario tests construct threads
    /// with a specific deadline precondition directly rather than deriving it from `now`.
    pub(crate) fn set_deadline(&mut self, deadline: u64) {
        self.deadline = deadline;
    }

    /// Force this thread's accumulated run time. Crate-internal, same rationale as
    /// [`Thread::set_deadline`].
    pub(crate) fn set_run_time(&mut self, run_time: u64) {
        self.run_time = run_time;
    }

    /// Force this thread's last-exit timestamp. Crate-internal, same rationale as
    /// [`Thread::set_deadline`].
    pub(crate) fn set_exit_time(&mut self, exit_time: u64) {
        self.exit_time = exit_time;
    }

    /// Timestamp this thread most recently entered RUNNING.
    pub fn start_time(&self) -> u64 {
        self.start_time
    }

    /// Accumulated RUNNING time within the current release.
    pub fn run_time(&self) -> u64 {
        self.run_time
    }

    /// Absolute deadline. Unused (and meaningless) for APERIODIC threads.
    pub fn deadline(&self) -> u64 {
        self.deadline
    }

    /// Timestamp this thread most recently left RUNNING.
    pub fn exit_time(&self) -> u64 {
        self.exit_time
    }

    /// The opaque back-link to the host's own thread object.
    pub fn host(&self) -> HostHandle {
        self.host
    }

    /// Record that this thread has just been dispatched onto the CPU at `now`.
    pub fn mark_running(&mut self, now: u64) {
        self.start_time = now;
        self.status = ThreadStatus::Running;
    }

    /// Account for time spent RUNNING since the last dispatch, and record that the thread has
    /// just left RUNNING at `now`.
    ///
    /// This mirrors the host's own `account_user_time`/`account_kernel_time` accounting hooks:
    /// the selection engine (`need_resched`) never infers elapsed time from `start_time`
    /// itself, so this must be called once per tick or voluntary yield *before* `need_resched`
    /// runs, keeping the engine a pure function of already-current thread state.
    pub fn account_running(&mut self, elapsed: u64, now: u64) {
        self.run_time = self.run_time.saturating_add(elapsed);
        self.exit_time = now;
    }

    /// Reset for a new PERIODIC release: zero `run_time`, advance `deadline` by one `period`.
    ///
    /// Panics (debug-only invariant) if called on a non-periodic thread.
    pub fn release_periodic(&mut self, _now: u64) {
        match self.constraints {
            Constraints::Periodic { period, .. } => {
                self.run_time = 0;
                self.deadline = self.deadline.wrapping_add(period);
            }
            _ => debug_assert!(false, "release_periodic called on a non-periodic thread"),
        }
    }

    /// Re-release immediately after a missed deadline: deadline becomes `now + period`, `run_time`
    /// resets to zero.
    pub fn re_release_after_miss(&mut self, now: u64) {
        if let Constraints::Periodic { period, .. } = self.constraints {
            self.deadline = now.wrapping_add(period);
            self.run_time = 0;
        } else {
            debug_assert!(false, "re_release_after_miss called on a non-periodic thread");
        }
    }

    /// The current Aperiodic priority (smaller = more urgent). Panics on non-aperiodic threads;
    /// callers only ever invoke this on threads already known to be Aperiodic.
    pub fn aperiodic_priority(&self) -> i32 {
        match self.constraints {
            Constraints::Aperiodic { priority } => priority,
            _ => unreachable!("aperiodic_priority called on a non-aperiodic thread"),
        }
    }

    /// Age an Aperiodic thread's priority to its accumulated run time: longer-served aperiodics
    /// become less urgent.
    pub fn age_aperiodic_priority(&mut self) {
        match &mut self.constraints {
            Constraints::Aperiodic { priority } => *priority = self.run_time as i32,
            _ => debug_assert!(false, "age_aperiodic_priority called on a non-aperiodic thread"),
        }
    }

    /// Whether this thread has been tombstoned and should be skipped/finalized by the next
    /// container operation that encounters it.
    pub fn is_tombstoned(&self) -> bool {
        matches!(self.status, ThreadStatus::ToBeRemoved)
    }
}
