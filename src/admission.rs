//! Utilization-based admission control, plus a simulator-backed stronger variant.

use crate::config::SchedulerConfig;
use crate::containers::Containers;
use crate::select;
use crate::thread::{Constraints, TaskKind, Thread};
use crate::{PERIODIC_UTIL, SPORADIC_UTIL};

fn periodic_contribution(period: u64, slice: u64) -> i64 {
    (slice as i64).saturating_mul(100_000) / period.max(1) as i64
}

fn sporadic_contribution(work: u64, relative: u64) -> i64 {
    (work as i64).saturating_mul(100_000) / relative.max(1) as i64
}

fn periodic_utilization_sum(containers: &Containers) -> i64 {
    containers
        .runnable
        .iter()
        .chain(containers.pending.iter())
        .filter_map(|t| match t.constraints() {
            Constraints::Periodic { period, slice } => Some(periodic_contribution(period, slice)),
            _ => None,
        })
        .sum()
}

fn sporadic_utilization_sum(containers: &Containers, now: u64) -> i64 {
    containers
        .runnable
        .iter()
        .filter_map(|t| match t.constraints() {
            Constraints::Sporadic { work, .. } => {
                let remaining = t.deadline().saturating_sub(now).max(1);
                Some(sporadic_contribution(work, remaining))
            }
            _ => None,
        })
        .sum()
}

/// Utilization-only admission test: checks only that the candidate would not push the relevant
/// utilization bound over its limit. Deadlines are not otherwise examined;
/// see [`admit_with_simulation`] for the stronger variant.
pub fn admit(candidate: &Thread, now: u64, containers: &Containers) -> bool {
    match candidate.constraints() {
        Constraints::Periodic { period, slice } => {
            let existing = periodic_utilization_sum(containers);
            existing + periodic_contribution(period, slice) <= PERIODIC_UTIL as i64
        }
        Constraints::Sporadic { work, relative_deadline } => {
            let existing = sporadic_utilization_sum(containers, now);
            let candidate_term = sporadic_contribution(work, relative_deadline);
            existing + candidate_term <= SPORADIC_UTIL as i64
        }
        Constraints::Aperiodic { .. } => true,
    }
}

/// How many `need_resched` steps the simulator plays forward before declaring a trial clean.
/// Large enough to observe at least one full period of the shortest realistic PERIODIC task
/// without being unbounded (the simulator must terminate in bounded time).
const SIMULATION_STEPS: u32 = 64;

/// Utilization test, then a "play forward" trial on a cloned snapshot of Runnable/Pending/
/// Aperiodic: admits the candidate into the snapshot and runs the selection engine forward for
/// [`SIMULATION_STEPS`] steps, rejecting if any step reports a deadline miss that would not have
/// occurred without the candidate.
///
/// Nothing in the default admission path consumes the simulator's verdict; this crate exposes
/// the simulation as an explicit opt-in rather than silently folding it into [`admit`].
pub fn admit_with_simulation(candidate: &Thread, now: u64, containers: &Containers, config: &SchedulerConfig) -> bool {
    if !admit(candidate, now, containers) {
        return false;
    }

    let baseline_misses = simulate_misses(containers, now, config);

    let (mut runnable, pending, aperiodic) = containers.snapshot_realtime();
    match candidate.kind() {
        TaskKind::Periodic | TaskKind::Sporadic => {
            if runnable.enqueue(candidate.clone()).is_err() {
                return false;
            }
        }
        TaskKind::Aperiodic => {}
    }
    let trial = Containers::from_realtime(runnable, pending, aperiodic);
    let with_candidate_misses = simulate_misses(&trial, now, config);

    with_candidate_misses <= baseline_misses
}

fn simulate_misses(containers: &Containers, now: u64, config: &SchedulerConfig) -> u32 {
    let (runnable, pending, aperiodic) = containers.snapshot_realtime();
    let mut sim = Containers::from_realtime(runnable, pending, aperiodic);

    let Ok(first) = sim.runnable.dequeue().or_else(|_| sim.aperiodic.dequeue()) else {
        return 0;
    };
    let mut current = Some(first);

    let mut misses = 0u32;
    let mut clock = now;
    for _ in 0..SIMULATION_STEPS {
        let step = clock + 1;
        let outcome = select::run(&mut sim, current.take(), clock, step, config);
        if outcome.deadline_miss.is_some() {
            misses += 1;
        }
        current = Some(outcome.next);
        clock = step;
    }
    misses
}
