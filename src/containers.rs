//! The seven-container aggregate owned by each per-CPU [`crate::cpu::Scheduler`].

use crate::container::{BinaryMinHeap, RingBuffer};
use crate::error::SchedError;
use crate::thread::{ContainerTag, Thread, ThreadId, ThreadStatus};
use crate::MAX_QUEUE;

fn deadline_key(t: &Thread) -> i64 {
    t.deadline() as i64
}

fn priority_key(t: &Thread) -> i64 {
    t.aperiodic_priority() as i64
}

/// All seven thread containers a scheduler instance owns: three EDF/priority heaps and four
/// FIFO rings, dispatched by [`ContainerTag`] rather than an internal `queue_type` branch.
pub struct Containers {
    pub(crate) runnable: BinaryMinHeap<MAX_QUEUE>,
    pub(crate) pending: BinaryMinHeap<MAX_QUEUE>,
    pub(crate) aperiodic: BinaryMinHeap<MAX_QUEUE>,
    pub(crate) arrival: RingBuffer<MAX_QUEUE>,
    pub(crate) waiting: RingBuffer<MAX_QUEUE>,
    pub(crate) sleeping: RingBuffer<MAX_QUEUE>,
    pub(crate) exited: RingBuffer<MAX_QUEUE>,
}

impl Containers {
    /// Construct all seven containers empty.
    pub fn new() -> Self {
        Self {
            runnable: BinaryMinHeap::new(ContainerTag::Runnable, deadline_key),
            pending: BinaryMinHeap::new(ContainerTag::Pending, deadline_key),
            aperiodic: BinaryMinHeap::new(ContainerTag::Aperiodic, priority_key),
            arrival: RingBuffer::new(ContainerTag::Arrival, Some(ThreadStatus::Arrived)),
            waiting: RingBuffer::new(ContainerTag::Waiting, Some(ThreadStatus::Waiting)),
            sleeping: RingBuffer::new(ContainerTag::Sleeping, Some(ThreadStatus::Sleeping)),
            exited: RingBuffer::new(ContainerTag::Exited, None),
        }
    }

    /// Place `thread` into the container named by `tag`, stamping its bookkeeping to match.
    pub fn enqueue(&mut self, tag: ContainerTag, thread: Thread) -> Result<(), SchedError> {
        match tag {
            ContainerTag::Runnable => self.runnable.enqueue(thread),
            ContainerTag::Pending => self.pending.enqueue(thread),
            ContainerTag::Aperiodic => self.aperiodic.enqueue(thread),
            ContainerTag::Arrival => self.arrival.enqueue(thread),
            ContainerTag::Waiting => self.waiting.enqueue(thread),
            ContainerTag::Sleeping => self.sleeping.enqueue(thread),
            ContainerTag::Exited => self.exited.enqueue(thread),
        }
    }

    /// Pop the next thread from the container named by `tag` (min-key for heaps, oldest for
    /// rings), skipping tombstones.
    pub fn dequeue(&mut self, tag: ContainerTag) -> Result<Thread, SchedError> {
        match tag {
            ContainerTag::Runnable => self.runnable.dequeue(),
            ContainerTag::Pending => self.pending.dequeue(),
            ContainerTag::Aperiodic => self.aperiodic.dequeue(),
            ContainerTag::Arrival => self.arrival.dequeue(),
            ContainerTag::Waiting => self.waiting.dequeue(),
            ContainerTag::Sleeping => self.sleeping.dequeue(),
            ContainerTag::Exited => self.exited.dequeue(),
        }
    }

    /// Remove a specific thread by identity from the container named by `tag`.
    pub fn remove(&mut self, tag: ContainerTag, id: ThreadId) -> Result<Thread, SchedError> {
        match tag {
            ContainerTag::Runnable => self.runnable.remove(id),
            ContainerTag::Pending => self.pending.remove(id),
            ContainerTag::Aperiodic => self.aperiodic.remove(id),
            ContainerTag::Arrival => self.arrival.remove(id),
            ContainerTag::Waiting => self.waiting.remove(id),
            ContainerTag::Sleeping => self.sleeping.remove(id),
            ContainerTag::Exited => self.exited.remove(id),
        }
    }

    /// Deep-copy Runnable, Pending, and Aperiodic for the admission simulator's "play forward on
    /// a snapshot" trial. Waiting/Sleeping/Arrival/Exited play no part in `need_resched` and are
    /// left out.
    pub fn snapshot_realtime(&self) -> (BinaryMinHeap<MAX_QUEUE>, BinaryMinHeap<MAX_QUEUE>, BinaryMinHeap<MAX_QUEUE>) {
        (self.runnable.snapshot(), self.pending.snapshot(), self.aperiodic.snapshot())
    }

    /// Reassemble a simulator trial's three real-time heaps into a standalone `Containers`, with
    /// fresh empty rings (no scenario the selection engine touches reads Arrival/Waiting/
    /// Sleeping/Exited).
    pub(crate) fn from_realtime(
        runnable: BinaryMinHeap<MAX_QUEUE>,
        pending: BinaryMinHeap<MAX_QUEUE>,
        aperiodic: BinaryMinHeap<MAX_QUEUE>,
    ) -> Self {
        Self {
            runnable,
            pending,
            aperiodic,
            arrival: RingBuffer::new(ContainerTag::Arrival, Some(ThreadStatus::Arrived)),
            waiting: RingBuffer::new(ContainerTag::Waiting, Some(ThreadStatus::Waiting)),
            sleeping: RingBuffer::new(ContainerTag::Sleeping, Some(ThreadStatus::Sleeping)),
            exited: RingBuffer::new(ContainerTag::Exited, None),
        }
    }
}

impl Default for Containers {
    fn default() -> Self {
        Self::new()
    }
}
