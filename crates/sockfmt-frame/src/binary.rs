//! Length-prefixed binary wire format.
//!
//! ```text
//! ┌────────────────┬──────────┬──────────────────┐
//! │ Length (8B BE) │ Type     │ Payload          │
//! │ signed, ≥ 0    │ (1B)     │ (Length bytes)   │
//! └────────────────┴──────────┴──────────────────┘
//! ```
//!
//! Type indicators: Text `0x00`, Binary `0x01`, Error `0x02`, Close `0x03`.

use std::mem;

use bytes::BytesMut;
use tracing::{debug, trace};

use crate::config::FrameConfig;
use crate::cursor::ByteCursor;
use crate::error::{FrameError, Result};
use crate::format::ParseMessage;
use crate::message::{Message, MessageType};
use crate::pool::BufferPool;
use crate::sink::OutputSink;

/// Size of the length prefix.
pub const LENGTH_SIZE: usize = 8;

/// Length prefix plus type indicator.
pub const HEADER_SIZE: usize = LENGTH_SIZE + 1;

/// Write `message` as one binary frame.
///
/// Returns `Ok(false)` if the sink refused any part of the frame.
pub fn try_write<S: OutputSink + ?Sized>(message: &Message, sink: &mut S) -> Result<bool> {
    message.ensure_complete()?;

    let len = message.payload.len();
    let declared = i32::try_from(len).map_err(|_| FrameError::CapacityExceeded {
        size: len as u64,
        max: crate::config::MAX_MESSAGE_SIZE,
    })?;

    Ok(sink.try_write_big_endian(i64::from(declared))
        && sink.try_write_byte(message.message_type.binary_indicator())
        && sink.try_write(&message.payload))
}

/// Wire size of `message` in the binary format.
pub fn frame_len(message: &Message) -> usize {
    HEADER_SIZE + message.payload.len()
}

#[derive(Debug)]
enum Phase {
    Length,
    Type {
        len: usize,
    },
    Payload {
        len: usize,
        message_type: MessageType,
        buf: BytesMut,
    },
    Failed,
}

/// Resumable parser for the binary wire format.
#[derive(Debug)]
pub struct BinaryParser {
    phase: Phase,
    pool: BufferPool,
    max_message_size: usize,
}

impl BinaryParser {
    pub fn new() -> Self {
        Self::with_config(&FrameConfig::default())
    }

    pub fn with_config(config: &FrameConfig) -> Self {
        Self {
            phase: Phase::Length,
            pool: BufferPool::from_config(config),
            max_message_size: config.message_cap(),
        }
    }

    /// Drop any partial frame and accept a new one.
    pub fn reset(&mut self) {
        if let Phase::Payload { buf, .. } = mem::replace(&mut self.phase, Phase::Length) {
            self.pool.give_back(buf);
        }
    }

    /// `true` when no bytes of a frame have been consumed.
    pub fn is_idle(&self) -> bool {
        matches!(self.phase, Phase::Length)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.phase, Phase::Failed)
    }

    fn declared_length(&self, raw: [u8; LENGTH_SIZE]) -> Result<usize> {
        let declared = i64::from_be_bytes(raw);
        if declared < 0 {
            return Err(FrameError::malformed(format!(
                "negative message length {declared}"
            )));
        }
        let declared = declared as u64;
        if declared > self.max_message_size as u64 {
            return Err(FrameError::CapacityExceeded {
                size: declared,
                max: self.max_message_size,
            });
        }
        Ok(declared as usize)
    }

    fn step(&mut self, cursor: &mut ByteCursor<'_>) -> Result<Option<Message>> {
        loop {
            // Every early `?` return leaves the parser in `Failed`.
            match mem::replace(&mut self.phase, Phase::Failed) {
                Phase::Failed => {
                    return Err(FrameError::usage(
                        "binary parser used after a malformed frame; reset required",
                    ));
                }
                Phase::Length => {
                    let Some(raw) = cursor.take_array::<LENGTH_SIZE>() else {
                        self.phase = Phase::Length;
                        return Ok(None);
                    };
                    let len = self.declared_length(raw)?;
                    trace!(len, "binary length decoded");
                    self.phase = Phase::Type { len };
                }
                Phase::Type { len } => {
                    let Some([indicator]) = cursor.take_array::<1>() else {
                        self.phase = Phase::Type { len };
                        return Ok(None);
                    };
                    let message_type =
                        MessageType::from_binary_indicator(indicator).ok_or_else(|| {
                            FrameError::malformed(format!(
                                "unknown message type indicator 0x{indicator:02X}"
                            ))
                        })?;
                    self.phase = Phase::Payload {
                        len,
                        message_type,
                        buf: self.pool.rent(len),
                    };
                }
                Phase::Payload {
                    len,
                    message_type,
                    mut buf,
                } => {
                    buf.extend_from_slice(cursor.take(len - buf.len()));
                    if buf.len() < len {
                        self.phase = Phase::Payload {
                            len,
                            message_type,
                            buf,
                        };
                        return Ok(None);
                    }

                    let payload = buf.split().freeze();
                    self.pool.give_back(buf);
                    self.phase = Phase::Length;
                    return Ok(Some(Message::new(payload, message_type)));
                }
            }
        }
    }
}

impl Default for BinaryParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ParseMessage for BinaryParser {
    fn try_parse(&mut self, cursor: &mut ByteCursor<'_>) -> Result<Option<Message>> {
        self.step(cursor)
            .inspect_err(|err| debug!(error = %err, "rejected binary frame"))
    }
}
