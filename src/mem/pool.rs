//! Recycled file buffers.

use std::fmt;

use parking_lot::Mutex;

/// Capacity of a freshly allocated buffer.
pub const DEFAULT_CAPACITY: usize = 32 * 1024;

/// How many released buffers a pool holds on to.
pub const DEFAULT_RETAINED: usize = 64;

/// A bounded stack of byte buffers shared by the files of one or more volumes.
///
/// When a file is destroyed its buffer is cleared and handed back here, and the next file created
/// reuses the allocation. A pool is always safe to share between threads; whether two volumes
/// share one is up to whoever builds them.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use memvol::mem::{BufferPool, Config};
///
/// let pool = Arc::new(BufferPool::new(4096, 8));
/// let a = Config::new().pool(pool.clone()).build();
/// let b = Config::new().pool(pool.clone()).build();
/// # drop((a, b));
/// ```
pub struct BufferPool {
    initial_capacity: usize,
    max_retained: usize,
    free: Mutex<Vec<Vec<u8>>>,
}

impl BufferPool {
    /// Creates a pool that allocates buffers of `initial_capacity` and keeps at most
    /// `max_retained` released ones.
    pub fn new(initial_capacity: usize, max_retained: usize) -> BufferPool {
        BufferPool {
            initial_capacity,
            max_retained,
            free: Mutex::new(Vec::new()),
        }
    }

    /// Takes an empty buffer out of the pool, allocating if none is retained.
    pub fn get(&self) -> Vec<u8> {
        self.free
            .lock()
            .pop()
            .unwrap_or_else(|| Vec::with_capacity(self.initial_capacity))
    }

    /// Returns a buffer to the pool. Its contents are discarded; its capacity is kept unless the
    /// pool is already full.
    pub fn put(&self, mut buf: Vec<u8>) {
        buf.clear();
        let mut free = self.free.lock();
        if free.len() < self.max_retained {
            free.push(buf);
        }
    }

    /// The number of buffers currently waiting for reuse.
    pub fn retained(&self) -> usize {
        self.free.lock().len()
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        BufferPool::new(DEFAULT_CAPACITY, DEFAULT_RETAINED)
    }
}

impl fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("BufferPool")
            .field("initial_capacity", &self.initial_capacity)
            .field("max_retained", &self.max_retained)
            .field("retained", &self.retained())
            .finish()
    }
}
