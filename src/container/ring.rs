//! Fixed-capacity FIFO ring buffer of [`Thread`]s.

use heapless::Vec;

use crate::error::SchedError;
use crate::thread::{ContainerTag, Thread, ThreadId, ThreadStatus};

/// A FIFO ring buffer of [`Thread`]s with a fixed capacity of `N`, used for Arrival, Waiting,
/// Sleeping, and Exited. Same tombstone handling as [`super::heap::BinaryMinHeap`].
pub struct RingBuffer<const N: usize> {
    items: Vec<Thread, N>,
    head: usize,
    tag: ContainerTag,
    /// The lifecycle status enqueue should stamp onto arriving threads, if any (Arrival/Waiting/
    /// Sleeping set `status` to match their container; Exited does not, since a thread is already
    /// `ToBeRemoved` by the time it lands there).
    status_on_enqueue: Option<ThreadStatus>,
}

impl<const N: usize> RingBuffer<N> {
    /// Create an empty ring that tags enqueued threads with `tag`, optionally also stamping
    /// `status_on_enqueue`.
    pub fn new(tag: ContainerTag, status_on_enqueue: Option<ThreadStatus>) -> Self {
        Self { items: Vec::new(), head: 0, tag, status_on_enqueue }
    }

    /// Number of threads currently stored.
    pub fn len(&self) -> usize {
        self.items.len() - self.head
    }

    /// Whether the ring holds no threads.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Push `thread` onto the tail, stamping `container_tag` (and lifecycle `status`, if this
    /// ring specifies one) to match.
    pub fn enqueue(&mut self, mut thread: Thread) -> Result<(), SchedError> {
        if self.len() == N {
            return Err(SchedError::QueueFull);
        }
        thread.set_container_tag(self.tag);
        if let Some(status) = self.status_on_enqueue {
            thread.set_status(status);
        }
        if self.head > 0 && self.items.is_full() {
            self.compact();
        }
        self.items.push(thread).map_err(|_| SchedError::QueueFull)
    }

    fn compact(&mut self) {
        self.items.rotate_left(self.head);
        self.items.truncate(self.items.len() - self.head);
        self.head = 0;
    }

    /// Pop the oldest thread, skipping and finalizing any tombstoned entries encountered.
    pub fn dequeue(&mut self) -> Result<Thread, SchedError> {
        loop {
            if self.head >= self.items.len() {
                return Err(SchedError::QueueEmpty);
            }
            let candidate = self.items[self.head].clone();
            self.head += 1;
            if candidate.is_tombstoned() {
                continue;
            }
            if self.head == self.items.len() {
                self.items.clear();
                self.head = 0;
            }
            return Ok(candidate);
        }
    }

    /// Remove a specific thread by identity via linear scan between head and tail, shifting
    /// subsequent elements back by one.
    pub fn remove(&mut self, id: ThreadId) -> Result<Thread, SchedError> {
        let pos = (self.head..self.items.len())
            .find(|&i| self.items[i].id() == id && !self.items[i].is_tombstoned())
            .ok_or(SchedError::ThreadNotFound)?;
        let removed = self.items[pos].clone();
        for i in pos..self.items.len() - 1 {
            self.items.swap(i, i + 1);
        }
        self.items.pop();
        Ok(removed)
    }

    /// Iterate over all currently-stored threads, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Thread> {
        self.items[self.head..].iter()
    }
}
