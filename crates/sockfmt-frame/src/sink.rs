//! Output sinks consumed by the formatters.
//!
//! A sink either accepts a whole write or refuses it. A refusal tells the
//! formatter to stop; the caller must discard the sink and retry with a
//! larger one.

use bytes::{BufMut, BytesMut};

/// Destination for formatted frame bytes.
pub trait OutputSink {
    /// Append `bytes`. Returns `false` if the sink cannot hold them, in which
    /// case nothing was written.
    fn try_write(&mut self, bytes: &[u8]) -> bool;

    /// Append `value` as 8 big-endian bytes.
    fn try_write_big_endian(&mut self, value: i64) -> bool {
        self.try_write(&value.to_be_bytes())
    }

    /// Append a single byte.
    fn try_write_byte(&mut self, byte: u8) -> bool {
        self.try_write(&[byte])
    }
}

impl OutputSink for BytesMut {
    fn try_write(&mut self, bytes: &[u8]) -> bool {
        self.put_slice(bytes);
        true
    }

    fn try_write_big_endian(&mut self, value: i64) -> bool {
        self.put_i64(value);
        true
    }
}

impl OutputSink for Vec<u8> {
    fn try_write(&mut self, bytes: &[u8]) -> bool {
        self.extend_from_slice(bytes);
        true
    }
}

impl<S: OutputSink + ?Sized> OutputSink for &mut S {
    fn try_write(&mut self, bytes: &[u8]) -> bool {
        (**self).try_write(bytes)
    }

    fn try_write_big_endian(&mut self, value: i64) -> bool {
        (**self).try_write_big_endian(value)
    }
}

/// A sink with a fixed capacity.
#[derive(Debug)]
pub struct BoundedSink {
    buf: BytesMut,
    capacity: usize,
}

impl BoundedSink {
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub fn into_inner(self) -> BytesMut {
        self.buf
    }
}

impl OutputSink for BoundedSink {
    fn try_write(&mut self, bytes: &[u8]) -> bool {
        if self.capacity - self.buf.len() < bytes.len() {
            return false;
        }
        self.buf.put_slice(bytes);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_mut_writes_big_endian() {
        let mut buf = BytesMut::new();
        assert!(buf.try_write_big_endian(2));
        assert_eq!(buf.as_ref(), &[0, 0, 0, 0, 0, 0, 0, 2]);
    }

    #[test]
    fn vec_uses_default_big_endian() {
        let mut buf = Vec::new();
        assert!(buf.try_write_big_endian(0x0102));
        assert!(buf.try_write_byte(0xFF));
        assert_eq!(buf, vec![0, 0, 0, 0, 0, 0, 1, 2, 0xFF]);
    }

    #[test]
    fn bounded_sink_refuses_overflow_without_writing() {
        let mut sink = BoundedSink::new(4);
        assert!(sink.try_write(b"abc"));
        assert!(!sink.try_write(b"de"));
        assert_eq!(sink.as_bytes(), b"abc");
        assert!(sink.try_write(b"d"));
        assert_eq!(sink.len(), sink.capacity());
        assert!(!sink.try_write_byte(b'e'));
    }

    #[test]
    fn bounded_sink_clear_allows_reuse() {
        let mut sink = BoundedSink::new(8);
        assert!(sink.try_write_big_endian(1));
        assert_eq!(sink.len(), 8);
        sink.clear();
        assert!(sink.is_empty());
        assert!(sink.try_write(b"hello"));
        assert_eq!(sink.into_inner().as_ref(), b"hello");
    }
}
