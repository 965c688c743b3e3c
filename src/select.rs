//! The `need_resched` selection engine: a pure function of container state and the currently
//! running thread, shared verbatim by the live scheduler and the admission simulator.

use crate::config::SchedulerConfig;
use crate::containers::Containers;
use crate::thread::{Constraints, TaskKind, Thread, ThreadId};
use crate::QUANTUM;

/// A non-fatal deadline miss observed while selecting the next thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeadlineMissReport {
    /// The thread that missed its deadline.
    pub thread: ThreadId,
    /// How far past the deadline it ran, in ticks.
    pub overrun: u64,
}

/// The result of one `need_resched` decision: the thread to dispatch next, the one-shot timer
/// interval to program, and any deadline miss observed along the way.
#[derive(Debug)]
pub struct SelectionOutcome {
    /// The thread the caller should dispatch next, already marked RUNNING with `start_time = now`.
    pub next: Thread,
    /// The one-shot timer interval to arm, in ticks.
    pub timer_ticks: u64,
    /// Set if a PERIODIC thread's slice exhaustion was discovered past its deadline.
    pub deadline_miss: Option<DeadlineMissReport>,
}

fn deadline_miss(thread: &Thread) -> Option<DeadlineMissReport> {
    if thread.exit_time() > thread.deadline() {
        Some(DeadlineMissReport { thread: thread.id(), overrun: thread.exit_time() - thread.deadline() })
    } else {
        None
    }
}

/// Pop the next thread to run once `current` has been dealt with: Runnable first, falling back
/// to Aperiodic. Both empty is an invariant violation (no idle/main thread left anywhere).
fn pop_next(containers: &mut Containers) -> Thread {
    if !containers.runnable.is_empty() {
        containers.runnable.dequeue().expect("just checked non-empty")
    } else {
        containers
            .aperiodic
            .dequeue()
            .unwrap_or_else(|_| unreachable!("Aperiodic heap empty: no idle/main thread seeded"))
    }
}

/// Step 1: release PERIODIC threads from Pending into Runnable whose next release has arrived
/// (deadline earlier than `end_time`).
fn release_pending(containers: &mut Containers, now: u64, end_time: u64) {
    while containers
        .pending
        .peek_min_key()
        .map(|dl| dl < end_time as i64)
        .unwrap_or(false)
    {
        let mut released = containers.pending.dequeue().expect("peek just confirmed a root");
        released.release_periodic(now);
        let _ = containers.runnable.enqueue(released);
    }
}

/// Step 2: dispatch by the class of the currently running thread `current`, deciding what
/// happens to it and what runs next. Returns the chosen next thread and any deadline miss.
///
/// `current = None` only at the very first `need_resched` on a CPU, before any thread has ever
/// run: there is nothing to account for or re-enqueue, so this just falls through to picking the
/// first thread to dispatch.
fn dispatch(containers: &mut Containers, current: Option<Thread>, now: u64) -> (Thread, Option<DeadlineMissReport>) {
    let Some(mut current) = current else {
        return (pop_next(containers), None);
    };
    match current.kind() {
        TaskKind::Aperiodic => {
            current.age_aperiodic_priority();
            let _ = containers.aperiodic.enqueue(current);
            (pop_next(containers), None)
        }
        TaskKind::Sporadic => {
            let work = match current.constraints() {
                Constraints::Sporadic { work, .. } => work,
                _ => unreachable!(),
            };
            if current.run_time() >= work {
                let miss = deadline_miss(&current);
                (pop_next(containers), miss)
            } else if containers
                .runnable
                .peek_min_key()
                .map(|dl| dl < current.deadline() as i64)
                .unwrap_or(false)
            {
                let preempting = containers.runnable.dequeue().expect("peek just confirmed a root");
                let _ = containers.runnable.enqueue(current);
                (preempting, None)
            } else {
                (current, None)
            }
        }
        TaskKind::Periodic => {
            let slice = match current.constraints() {
                Constraints::Periodic { slice, .. } => slice,
                _ => unreachable!(),
            };
            if current.run_time() >= slice {
                let miss = deadline_miss(&current);
                if miss.is_some() {
                    current.re_release_after_miss(now);
                    let _ = containers.runnable.enqueue(current);
                } else {
                    let _ = containers.pending.enqueue(current);
                }
                (pop_next(containers), miss)
            } else if containers
                .runnable
                .peek_min_key()
                .map(|dl| dl < current.deadline() as i64)
                .unwrap_or(false)
            {
                let preempting = containers.runnable.dequeue().expect("peek just confirmed a root");
                let _ = containers.runnable.enqueue(current);
                (preempting, None)
            } else {
                (current, None)
            }
        }
    }
}

/// Step 3: compute the one-shot timer interval for the thread about to be dispatched.
fn timer_interval(containers: &Containers, next: &Thread, end_time: u64, config: &SchedulerConfig) -> u64 {
    let d = containers
        .pending
        .peek_min_key()
        .map(|dl| (dl as u64).saturating_sub(end_time))
        .unwrap_or(u64::MAX);
    match next.constraints() {
        Constraints::Periodic { slice, .. } => {
            d.min(slice.saturating_sub(next.run_time())).saturating_add(config.timer_slack)
        }
        Constraints::Sporadic { work, .. } => {
            d.min(work.saturating_sub(next.run_time())).saturating_add(config.timer_slack)
        }
        Constraints::Aperiodic { .. } => d.min(QUANTUM),
    }
}

/// Run one full `need_resched` decision: release due periodics, dispatch by `current`'s class,
/// and compute the next one-shot timer interval. Pure: no I/O, no logging, no hardware access;
/// the only side effects are on `containers`, which the caller owns.
pub fn run(
    containers: &mut Containers,
    current: Option<Thread>,
    now: u64,
    end_time: u64,
    config: &SchedulerConfig,
) -> SelectionOutcome {
    release_pending(containers, now, end_time);
    let (mut next, deadline_miss) = dispatch(containers, current, now);
    let timer_ticks = timer_interval(containers, &next, end_time, config);
    next.mark_running(now);
    SelectionOutcome { next, timer_ticks, deadline_miss }
}
