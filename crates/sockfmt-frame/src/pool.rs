//! Payload buffer reuse.
//!
//! A parser rents one buffer per message once the payload length is known
//! and gives it back when the message completes or fails. On completion the
//! filled bytes are split off into the message; the remainder still points at
//! the same allocation, and `BytesMut::reserve` reclaims the whole block once
//! the application has dropped the message.

use bytes::BytesMut;
use tracing::trace;

use crate::config::FrameConfig;

#[derive(Debug)]
pub struct BufferPool {
    free: Vec<BytesMut>,
    max_pooled: usize,
    max_retained_capacity: usize,
}

impl BufferPool {
    pub fn new(max_pooled: usize, max_retained_capacity: usize) -> Self {
        Self {
            free: Vec::with_capacity(max_pooled),
            max_pooled,
            max_retained_capacity,
        }
    }

    pub fn from_config(config: &FrameConfig) -> Self {
        Self::new(config.pool_size, config.max_retained_capacity)
    }

    /// Check out an empty buffer able to hold `capacity` bytes.
    pub fn rent(&mut self, capacity: usize) -> BytesMut {
        match self.free.pop() {
            Some(mut buf) => {
                buf.clear();
                buf.reserve(capacity);
                buf
            }
            None => BytesMut::with_capacity(capacity),
        }
    }

    /// Return a buffer. Oversized buffers and buffers beyond the pool size
    /// are dropped.
    pub fn give_back(&mut self, mut buf: BytesMut) {
        if self.free.len() >= self.max_pooled {
            return;
        }
        if buf.capacity() > self.max_retained_capacity {
            trace!(capacity = buf.capacity(), "releasing oversized payload buffer");
            return;
        }
        buf.clear();
        self.free.push(buf);
    }

    /// Idle buffers currently held.
    pub fn idle(&self) -> usize {
        self.free.len()
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::from_config(&FrameConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use bytes::BufMut;

    use super::*;

    #[test]
    fn rent_returns_requested_capacity() {
        let mut pool = BufferPool::new(2, 1024);
        let buf = pool.rent(64);
        assert!(buf.capacity() >= 64);
        assert!(buf.is_empty());
    }

    #[test]
    fn returned_buffers_are_reused() {
        let mut pool = BufferPool::new(2, 1024);
        let mut buf = pool.rent(32);
        buf.put_slice(b"payload");
        let ptr = buf.as_ptr();
        pool.give_back(buf);
        assert_eq!(pool.idle(), 1);

        let again = pool.rent(16);
        assert!(again.is_empty());
        assert_eq!(again.as_ptr(), ptr);
        assert_eq!(pool.idle(), 0);
    }

    #[test]
    fn split_remainder_reclaims_storage_after_drop() {
        let mut pool = BufferPool::new(1, 1024);
        let mut buf = pool.rent(8);
        buf.put_slice(b"abcdefgh");
        let ptr = buf.as_ptr();
        let message = buf.split().freeze();
        pool.give_back(buf);
        drop(message);

        let again = pool.rent(8);
        assert_eq!(again.as_ptr(), ptr);
    }

    #[test]
    fn pool_is_bounded() {
        let mut pool = BufferPool::new(1, 1024);
        pool.give_back(BytesMut::with_capacity(8));
        pool.give_back(BytesMut::with_capacity(8));
        assert_eq!(pool.idle(), 1);
    }

    #[test]
    fn oversized_buffers_are_released() {
        let mut pool = BufferPool::new(4, 16);
        pool.give_back(BytesMut::with_capacity(1024));
        assert_eq!(pool.idle(), 0);
    }
}
