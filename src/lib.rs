//! # rt-scheduler
//!
//! A per-CPU real-time thread scheduler: PERIODIC tasks with a period and compute slice,
//! SPORADIC tasks with a one-shot work budget and relative deadline, and APERIODIC tasks with a
//! priority that ages with accumulated runtime. Dispatch is Earliest-Deadline-First among
//! real-time threads; an admission controller keeps total utilization under a bound before a new
//! real-time thread is allowed to join.
//!
//! ## Design Principles
//!
//! - **Pure selection core**: `need_resched` is a function of container state and the current
//!   thread, with no I/O; the same function backs the live scheduler and the admission
//!   simulator's "play forward" trial.
//! - **No dynamic container growth**: every container (three binary heaps, four FIFO rings) is
//!   fixed-capacity, matching `MAX_QUEUE`.
//! - **Host collaborators behind a trait**: the clock, the one-shot timer, and per-CPU lookup are
//!   reached only through [`platform::Platform`], never touched directly.
//!
//! ## Lock ordering
//!
//! This crate has exactly one lock: the per-CPU scheduler table ([`cpu::PerCpu`]). There is
//! nothing to order it against; each CPU's own scheduler state is touched only by that CPU's ISR
//! and its currently running thread.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_op_in_unsafe_fn)]

#[cfg(not(test))]
extern crate alloc;
#[cfg(test)]
extern crate std as alloc;

pub mod admission;
pub mod config;
pub mod container;
pub mod containers;
pub mod cpu;
pub mod error;
pub mod housekeeping;
pub mod platform;
pub mod select;
pub mod thread;

pub use config::SchedulerConfig;
pub use cpu::{PerCpu, Scheduler, TimingRecord};
pub use error::SchedError;
pub use platform::Platform;
pub use thread::{Constraints, ContainerTag, HostHandle, TaskKind, Thread, ThreadId, ThreadStatus};

/// Utilization bound (scaled by 1e5) for PERIODIC threads: Σ `slice·1e5/period` over
/// Runnable∪Pending must not exceed this after admission.
pub const PERIODIC_UTIL: u32 = 65_000;

/// Utilization bound (scaled by 1e5) for SPORADIC threads: Σ `work·1e5/(deadline−now)` over
/// Runnable must not exceed this after admission.
pub const SPORADIC_UTIL: u32 = 18_000;

/// Reserved utilization bound for APERIODIC threads. Declared for parity with the other two
/// classes but never read by any admission rule: APERIODIC threads are always admitted.
pub const APERIODIC_UTIL: u32 = 9_000;

/// Default one-shot timer interval, in ticks, when no earlier event (a Pending release, a slice
/// or work boundary) constrains it sooner.
pub const QUANTUM: u64 = 10_000_000;

/// Fixed capacity of every container (three heaps, four rings).
pub const MAX_QUEUE: usize = 256;
