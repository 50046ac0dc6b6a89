use std::io::{ErrorKind, Write};

use bytes::BytesMut;

use crate::error::{FrameError, Result};
use crate::format::WireFormat;
use crate::message::Message;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Writes complete messages to any `Write` stream.
pub struct MessageWriter<T> {
    inner: T,
    buf: BytesMut,
    wire: WireFormat,
}

impl<T: Write> MessageWriter<T> {
    pub fn new(inner: T, wire: WireFormat) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            wire,
        }
    }

    /// Encode and send one message (blocking), then flush.
    pub fn send(&mut self, message: &Message) -> Result<()> {
        self.buf.clear();
        if !self.wire.try_write(message, &mut self.buf)? {
            return Err(FrameError::SinkFull);
        }

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Wire format this writer encodes.
    pub fn wire_format(&self) -> WireFormat {
        self.wire
    }
}
