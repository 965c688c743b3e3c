//! Black-box scenario tests against the public `Scheduler` API.

use std::cell::Cell;

use rt_scheduler::{
    Constraints, ContainerTag, HostHandle, Platform, Scheduler, SchedulerConfig, ThreadStatus,
};

struct FakePlatform {
    clock: Cell<u64>,
    cpu_id: u32,
    last_armed: Cell<Option<(u32, u64)>>,
}

impl FakePlatform {
    fn new(cpu_id: u32) -> Self {
        Self { clock: Cell::new(0), cpu_id, last_armed: Cell::new(None) }
    }

    fn set_now(&self, now: u64) {
        self.clock.set(now);
    }
}

impl Platform for FakePlatform {
    fn now(&self) -> u64 {
        self.clock.get()
    }

    fn program_oneshot_timer(&self, cpu: u32, ticks: u64) {
        self.last_armed.set(Some((cpu, ticks)));
    }

    fn current_cpu_id(&self) -> u32 {
        self.cpu_id
    }
}

fn main_thread() -> rt_scheduler::Thread {
    rt_scheduler::Thread::new(Constraints::Aperiodic { priority: 0 }, HostHandle(0), 0)
}

#[test]
fn boots_with_no_current_thread_until_first_dispatch() {
    let sched = Scheduler::init(0, main_thread(), SchedulerConfig::default());
    assert!(sched.current().is_none());
}

#[test]
fn first_need_resched_picks_the_seeded_main_thread() {
    let mut sched = Scheduler::init(0, main_thread(), SchedulerConfig::default());
    let platform = FakePlatform::new(0);
    let dispatched = sched.need_resched(&platform);
    assert_eq!(dispatched.status(), ThreadStatus::Running);
    assert_eq!(dispatched.kind(), rt_scheduler::TaskKind::Aperiodic);
}

#[test]
fn s1_edf_preemption_picks_the_earlier_deadline() {
    let mut sched = Scheduler::init(0, main_thread(), SchedulerConfig::default());
    let platform = FakePlatform::new(0);
    platform.set_now(0);
    sched.need_resched(&platform); // dispatch the seeded aperiodic main thread first

    let a = rt_scheduler::Thread::new(Constraints::Periodic { period: 1000, slice: 100 }, HostHandle(1), 0);
    let b = rt_scheduler::Thread::new(Constraints::Periodic { period: 2000, slice: 100 }, HostHandle(2), 0);
    sched.enqueue(ContainerTag::Runnable, a).unwrap();
    sched.enqueue(ContainerTag::Runnable, b).unwrap();

    platform.set_now(50);
    let dispatched = sched.need_resched(&platform);
    // Both periods release at t=1000/2000 respectively from now=0, so deadlines are 1000 and
    // 2000: the one with the earlier deadline (period=1000) must win.
    assert_eq!(dispatched.deadline(), 1000);
}

#[test]
fn s5_admission_denial_leaves_arrival_untouched() {
    let mut sched = Scheduler::init(0, main_thread(), SchedulerConfig::default());
    // slice=640,period=1000 -> 64000 contribution, right at the edge of the 65000 bound.
    let resident = rt_scheduler::Thread::new(Constraints::Periodic { period: 1000, slice: 640 }, HostHandle(1), 0);
    sched.enqueue(ContainerTag::Runnable, resident).unwrap();

    let candidate = rt_scheduler::Thread::new(Constraints::Periodic { period: 1000, slice: 200 }, HostHandle(2), 0);
    assert!(!sched.admit(&candidate, 0));
}

#[test]
fn housekeeping_admits_a_clean_arrival() {
    let mut sched = Scheduler::init(0, main_thread(), SchedulerConfig::default());
    let arriving = rt_scheduler::Thread::new(Constraints::Periodic { period: 1000, slice: 100 }, HostHandle(1), 0);
    sched.enqueue(ContainerTag::Arrival, arriving).unwrap();

    let report = sched.housekeeping_tick(0);
    assert_eq!(report.admitted, 1);
    assert_eq!(report.rejected, 0);

    let dispatched = sched.dequeue(ContainerTag::Runnable).unwrap();
    assert_eq!(dispatched.status(), ThreadStatus::Admitted);
}

#[test]
fn housekeeping_reclaims_an_exited_thread() {
    let mut sched = Scheduler::init(0, main_thread(), SchedulerConfig::default());
    let platform = FakePlatform::new(0);
    sched.need_resched(&platform);
    sched.thread_exit(10).unwrap();

    let report = sched.housekeeping_tick(10);
    assert_eq!(report.reclaimed, 1);
    assert!(sched.dequeue(ContainerTag::Exited).is_err());
}

#[test]
fn thread_exit_is_idempotent_with_no_current_thread() {
    let mut sched = Scheduler::init(0, main_thread(), SchedulerConfig::default());
    assert!(sched.thread_exit(0).is_ok());
}

#[test]
fn start_housekeeping_task_is_dispatched_like_any_other_periodic_thread() {
    let config = SchedulerConfig::default();
    let mut sched = Scheduler::init(0, main_thread(), config);
    sched.start_housekeeping(HostHandle(42), 0).unwrap();

    let platform = FakePlatform::new(0);
    platform.set_now(0);
    let dispatched = sched.need_resched(&platform);
    assert_eq!(dispatched.host(), HostHandle(42));
    assert_eq!(dispatched.status(), ThreadStatus::Running);
}
