//! Error taxonomy for the scheduler core.
//!
//! Every fallible operation in this crate returns [`SchedError`] rather than unwinding. A few
//! `.expect()` calls remain where a preceding check in the same scope (an `is_empty`/`peek`
//! guard a line above) makes the failure case provably unreachable; the one panic that can
//! actually fire under a broken precondition is the invariant violation documented on
//! [`Scheduler::need_resched`](crate::cpu::Scheduler::need_resched): an empty Aperiodic heap,
//! which can only happen if the host never seeded a main/idle thread.

use core::fmt;

use crate::thread::ThreadId;

/// Errors produced by container and scheduler operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedError {
    /// `enqueue` was attempted on a container already holding `MAX_QUEUE` threads.
    QueueFull,
    /// `dequeue` was attempted on an empty container.
    QueueEmpty,
    /// `remove` could not find the requested thread in the given container.
    ThreadNotFound,
    /// A PERIODIC thread's slice was exhausted after its deadline had already passed.
    DeadlineMiss {
        /// The thread that missed its deadline.
        thread: ThreadId,
        /// How far past the deadline the thread ran, in ticks.
        overrun: u64,
    },
    /// `admit` rejected a candidate thread because it would exceed a utilization bound.
    AdmissionDenied,
}

impl fmt::Display for SchedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedError::QueueFull => write!(f, "container is at capacity"),
            SchedError::QueueEmpty => write!(f, "container is empty"),
            SchedError::ThreadNotFound => write!(f, "thread not present in container"),
            SchedError::DeadlineMiss { thread, overrun } => {
                write!(f, "thread {thread:?} missed its deadline by {overrun} ticks")
            }
            SchedError::AdmissionDenied => write!(f, "admission denied: utilization bound exceeded"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_human_readable() {
        assert_eq!(format!("{}", SchedError::QueueFull), "container is at capacity");
        assert_eq!(
            format!("{}", SchedError::DeadlineMiss { thread: ThreadId::from_raw(3), overrun: 42 }),
            "thread ThreadId(3) missed its deadline by 42 ticks"
        );
    }
}
