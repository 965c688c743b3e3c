//! The housekeeping task body: drains Arrival into admission, drains Exited into reclamation.

use log::{info, warn};

use crate::admission;
use crate::config::SchedulerConfig;
use crate::containers::Containers;
use crate::thread::{ContainerTag, ThreadStatus};

/// Result of one housekeeping tick: how many arrivals were admitted/rejected, and how many
/// exited threads were reclaimed. Returned for callers that want to log or meter this, on top of
/// the `log` records already emitted internally.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HousekeepingReport {
    /// Arrivals accepted by `admit` and moved into Runnable/Aperiodic.
    pub admitted: u32,
    /// Arrivals rejected by `admit` and dropped.
    pub rejected: u32,
    /// Exited threads fully purged and reclaimed.
    pub reclaimed: u32,
}

/// One housekeeping pass: drain Arrival one descriptor at a time (admitting or dropping each),
/// then drain Exited, purging each thread from its last-known container.
///
/// Never blocks; this is a bounded unit of work invoked whenever the host's context switcher
/// dispatches the housekeeping thread, not a loop the core drives itself (the housekeeping
/// thread's own scheduling is ordinary PERIODIC dispatch through `need_resched`).
pub fn housekeeping_tick(containers: &mut Containers, now: u64, _config: &SchedulerConfig) -> HousekeepingReport {
    let mut report = HousekeepingReport::default();

    if let Ok(candidate) = containers.arrival.dequeue() {
        if admission::admit(&candidate, now, containers) {
            let tag = match candidate.kind() {
                crate::thread::TaskKind::Aperiodic => ContainerTag::Aperiodic,
                _ => ContainerTag::Runnable,
            };
            let mut admitted = candidate;
            admitted.set_status(ThreadStatus::Admitted);
            if containers.enqueue(tag, admitted).is_ok() {
                report.admitted += 1;
                info!("admitted arriving thread into {tag:?}");
            } else {
                warn!("admitted thread dropped: destination container full");
                report.rejected += 1;
            }
        } else {
            warn!("admission denied for arriving thread: utilization bound exceeded");
            report.rejected += 1;
            // candidate drops here; storage reclaimed by ordinary `Drop`.
        }
    }

    if let Ok(exited) = containers.exited.dequeue() {
        // The thread was already removed from its real-time container at `thread_exit` time
        // (tombstoned in place) or is only ever reachable here; either way it is now fully gone.
        let _ = exited;
        report.reclaimed += 1;
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thread::{Constraints, HostHandle, Thread};

    #[test]
    fn admits_a_clean_arrival_into_runnable() {
        let mut c = Containers::new();
        let t = Thread::new(Constraints::Periodic { period: 1000, slice: 100 }, HostHandle(0), 0);
        c.enqueue(ContainerTag::Arrival, t).unwrap();
        let config = SchedulerConfig::default();
        let report = housekeeping_tick(&mut c, 0, &config);
        assert_eq!(report.admitted, 1);
        assert_eq!(c.runnable.len(), 1);
    }

    #[test]
    fn rejects_an_arrival_over_the_utilization_bound() {
        let mut c = Containers::new();
        c.runnable
            .enqueue(Thread::new(Constraints::Periodic { period: 1000, slice: 640 }, HostHandle(0), 0))
            .unwrap();
        let t = Thread::new(Constraints::Periodic { period: 1000, slice: 200 }, HostHandle(0), 0);
        c.enqueue(ContainerTag::Arrival, t).unwrap();
        let config = SchedulerConfig::default();
        let report = housekeeping_tick(&mut c, 0, &config);
        assert_eq!(report.rejected, 1);
        assert_eq!(c.runnable.len(), 1);
    }

    #[test]
    fn reclaims_an_exited_thread() {
        let mut c = Containers::new();
        let t = Thread::new(Constraints::Aperiodic { priority: 0 }, HostHandle(0), 0);
        c.enqueue(ContainerTag::Exited, t).unwrap();
        let config = SchedulerConfig::default();
        let report = housekeeping_tick(&mut c, 0, &config);
        assert_eq!(report.reclaimed, 1);
        assert_eq!(c.exited.len(), 0);
    }
}
