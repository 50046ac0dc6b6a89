use std::io::{ErrorKind, Read};
use std::iter::FusedIterator;

use bytes::BytesMut;
use tracing::debug;

use crate::config::FrameConfig;
use crate::error::{FrameError, Result};
use crate::format::{WireFormat, WireParser};
use crate::message::Message;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads complete messages from any `Read` stream.
///
/// Handles partial reads internally; callers always get complete messages.
pub struct MessageReader<T> {
    inner: T,
    buf: BytesMut,
    parser: WireParser,
    // Set once iteration has yielded an error or hit EOF.
    exhausted: bool,
}

impl<T: Read> MessageReader<T> {
    /// Create a new message reader with default configuration.
    pub fn new(inner: T, wire: WireFormat) -> Self {
        Self::with_config(inner, wire, &FrameConfig::default())
    }

    /// Create a new message reader with explicit configuration.
    pub fn with_config(inner: T, wire: WireFormat, config: &FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            parser: WireParser::new(wire, config),
            exhausted: false,
        }
    }

    /// Read the next message (blocking).
    ///
    /// Returns `Ok(None)` when the stream ends cleanly between messages and
    /// `Err(FrameError::ConnectionClosed)` when it ends mid-frame.
    pub fn next_message(&mut self) -> Result<Option<Message>> {
        loop {
            if let Some(message) = self.parser.try_parse_buf(&mut self.buf)? {
                return Ok(Some(message));
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                if self.buf.is_empty() && self.parser.is_idle() {
                    return Ok(None);
                }
                debug!(
                    buffered = self.buf.len(),
                    wire = %self.parser.wire_format(),
                    "stream ended inside a frame"
                );
                return Err(FrameError::ConnectionClosed);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Read the next message (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached.
    pub fn read_message(&mut self) -> Result<Message> {
        self.next_message()?.ok_or(FrameError::ConnectionClosed)
    }

    /// Discard buffered bytes and partial parser state.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.parser.reset();
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Wire format this reader decodes.
    pub fn wire_format(&self) -> WireFormat {
        self.parser.wire_format()
    }
}

/// Yields messages until EOF or the first error, then only `None`.
///
/// After [`MessageReader::reset`], keep reading with
/// [`MessageReader::next_message`].
impl<T: Read> Iterator for MessageReader<T> {
    type Item = Result<Message>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        let item = self.next_message().transpose();
        self.exhausted = !matches!(item, Some(Ok(_)));
        item
    }
}

impl<T: Read> FusedIterator for MessageReader<T> {}
