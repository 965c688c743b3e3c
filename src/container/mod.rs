//! Fixed-capacity container primitives: the binary min-heap and the FIFO ring buffer that back
//! every thread container in [`crate::containers`].

pub mod heap;
pub mod ring;

pub use heap::{BinaryMinHeap, KeyFn};
pub use ring::RingBuffer;
