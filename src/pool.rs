//! Lock-free pools for the two allocations on the formatting hot
//! path: the record being assembled and the encode buffer.

use crate::record::LogRecord;
use bytes::BytesMut;
use crossbeam::queue::ArrayQueue;

/// Pool of reusable [`LogRecord`] instances.
///
/// Records come back from [`RecordPool::acquire`] already reset; a
/// fresh one is allocated when the pool is empty. Releasing into a
/// full pool drops the record.
pub(crate) struct RecordPool {
    queue: ArrayQueue<Box<LogRecord>>,
}

impl RecordPool {
    pub fn new(pool_size: usize) -> Self {
        let queue = ArrayQueue::new(pool_size);
        for _ in 0..pool_size {
            let _ = queue.push(Box::default());
        }
        Self { queue }
    }

    pub fn acquire(&self) -> Box<LogRecord> {
        self.queue.pop().unwrap_or_default()
    }

    pub fn release(&self, mut record: Box<LogRecord>) {
        record.reset();
        let _ = self.queue.push(record);
    }

    pub fn available(&self) -> usize {
        self.queue.len()
    }

    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }
}

/// Pool of pre-allocated `BytesMut` encode buffers.
pub(crate) struct BufferPool {
    queue: ArrayQueue<BytesMut>,
    buffer_capacity: usize,
}

impl BufferPool {
    pub fn new(pool_size: usize, buffer_capacity: usize) -> Self {
        let queue = ArrayQueue::new(pool_size);
        for _ in 0..pool_size {
            let _ = queue.push(BytesMut::with_capacity(buffer_capacity));
        }
        Self {
            queue,
            buffer_capacity,
        }
    }

    #[inline]
    pub fn get(&self) -> BytesMut {
        self.queue
            .pop()
            .unwrap_or_else(|| BytesMut::with_capacity(self.buffer_capacity))
    }

    /// Clear the buffer and return it to the pool. Buffers that lost
    /// capacity (split off elsewhere) and buffers past a full pool are
    /// dropped instead.
    #[inline]
    pub fn put(&self, mut buffer: BytesMut) {
        buffer.clear();
        if buffer.capacity() >= self.buffer_capacity {
            let _ = self.queue.push(buffer);
        }
    }

    pub fn available(&self) -> usize {
        self.queue.len()
    }

    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }
}
