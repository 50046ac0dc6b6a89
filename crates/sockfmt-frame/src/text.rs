//! Delimiter-based text wire format.
//!
//! ```text
//! <decimal length>:<T|B|C|E>:<payload>;
//! ```
//!
//! Binary payloads are Base64-encoded and the length counts the encoded
//! characters.

use std::mem;

use bytes::{Bytes, BytesMut};
use tracing::{debug, trace};

use crate::b64;
use crate::config::{FrameConfig, MAX_MESSAGE_SIZE};
use crate::cursor::ByteCursor;
use crate::error::{FrameError, Result};
use crate::format::ParseMessage;
use crate::message::{Message, MessageType};
use crate::pool::BufferPool;
use crate::sink::OutputSink;

pub const FIELD_DELIMITER: u8 = b':';
pub const MESSAGE_TERMINATOR: u8 = b';';

/// Write `message` as one text frame.
///
/// Returns `Ok(false)` if the sink refused any part of the frame.
pub fn try_write<S: OutputSink + ?Sized>(message: &Message, sink: &mut S) -> Result<bool> {
    message.ensure_complete()?;

    let binary = message.message_type == MessageType::Binary;
    let len = if binary {
        b64::encoded_len(message.payload.len())
    } else {
        message.payload.len()
    };
    if len > MAX_MESSAGE_SIZE {
        return Err(FrameError::CapacityExceeded {
            size: len as u64,
            max: MAX_MESSAGE_SIZE,
        });
    }

    let header = format!(
        "{len}:{}:",
        char::from(message.message_type.text_indicator())
    );
    if !sink.try_write(header.as_bytes()) {
        return Ok(false);
    }

    let body_written = if binary {
        b64::encode_to_sink(&message.payload, sink)
    } else {
        sink.try_write(&message.payload)
    };

    Ok(body_written && sink.try_write_byte(MESSAGE_TERMINATOR))
}

#[derive(Debug)]
enum Phase {
    ReadingLength {
        value: u64,
        digits: usize,
    },
    LengthComplete {
        len: usize,
    },
    ReadingType {
        len: usize,
    },
    TypeComplete {
        len: usize,
        message_type: MessageType,
    },
    ReadingPayload {
        len: usize,
        message_type: MessageType,
        buf: BytesMut,
    },
    PayloadComplete {
        message_type: MessageType,
        buf: BytesMut,
    },
    Failed,
}

impl Phase {
    const START: Phase = Phase::ReadingLength {
        value: 0,
        digits: 0,
    };
}

/// Resumable parser for the text wire format.
#[derive(Debug)]
pub struct TextParser {
    phase: Phase,
    pool: BufferPool,
    max_message_size: usize,
    // Longest length field accepted before the type is known.
    max_declared_len: usize,
}

impl TextParser {
    pub fn new() -> Self {
        Self::with_config(&FrameConfig::default())
    }

    pub fn with_config(config: &FrameConfig) -> Self {
        let max_message_size = config.message_cap();
        Self {
            phase: Phase::START,
            pool: BufferPool::from_config(config),
            max_message_size,
            max_declared_len: b64::encoded_len(max_message_size),
        }
    }

    /// Drop any partial frame and accept a new one.
    pub fn reset(&mut self) {
        match mem::replace(&mut self.phase, Phase::START) {
            Phase::ReadingPayload { buf, .. } | Phase::PayloadComplete { buf, .. } => {
                self.pool.give_back(buf);
            }
            _ => {}
        }
    }

    /// `true` when no bytes of a frame have been consumed.
    pub fn is_idle(&self) -> bool {
        matches!(self.phase, Phase::ReadingLength { digits: 0, .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.phase, Phase::Failed)
    }

    fn step(&mut self, cursor: &mut ByteCursor<'_>) -> Result<Option<Message>> {
        loop {
            // Every early `?` return leaves the parser in `Failed`.
            match mem::replace(&mut self.phase, Phase::Failed) {
                Phase::Failed => {
                    return Err(FrameError::usage(
                        "text parser used after a malformed frame; reset required",
                    ));
                }
                Phase::ReadingLength {
                    mut value,
                    mut digits,
                } => {
                    while let Some(byte) = cursor.peek().filter(u8::is_ascii_digit) {
                        value = value * 10 + u64::from(byte - b'0');
                        if value > self.max_declared_len as u64 {
                            return Err(FrameError::CapacityExceeded {
                                size: value,
                                max: self.max_message_size,
                            });
                        }
                        digits += 1;
                        cursor.advance(1);
                    }

                    if cursor.is_empty() {
                        self.phase = Phase::ReadingLength { value, digits };
                        return Ok(None);
                    }
                    if digits == 0 {
                        return Err(FrameError::malformed("missing length"));
                    }
                    trace!(len = value, "text length decoded");
                    self.phase = Phase::LengthComplete {
                        len: value as usize,
                    };
                }
                Phase::LengthComplete { len } => {
                    if !read_delimiter(cursor, FIELD_DELIMITER, "length")? {
                        self.phase = Phase::LengthComplete { len };
                        return Ok(None);
                    }
                    self.phase = Phase::ReadingType { len };
                }
                Phase::ReadingType { len } => {
                    let Some([indicator]) = cursor.take_array::<1>() else {
                        self.phase = Phase::ReadingType { len };
                        return Ok(None);
                    };
                    let message_type =
                        MessageType::from_text_indicator(indicator).ok_or_else(|| {
                            FrameError::malformed(format!(
                                "unknown message type {:?}",
                                char::from(indicator)
                            ))
                        })?;
                    self.check_declared_len(len, message_type)?;
                    self.phase = Phase::TypeComplete { len, message_type };
                }
                Phase::TypeComplete { len, message_type } => {
                    if !read_delimiter(cursor, FIELD_DELIMITER, "type")? {
                        self.phase = Phase::TypeComplete { len, message_type };
                        return Ok(None);
                    }
                    self.phase = Phase::ReadingPayload {
                        len,
                        message_type,
                        buf: self.pool.rent(len),
                    };
                }
                Phase::ReadingPayload {
                    len,
                    message_type,
                    mut buf,
                } => {
                    buf.extend_from_slice(cursor.take(len - buf.len()));
                    self.phase = if buf.len() < len {
                        Phase::ReadingPayload {
                            len,
                            message_type,
                            buf,
                        }
                    } else {
                        Phase::PayloadComplete { message_type, buf }
                    };
                    if cursor.is_empty() {
                        return Ok(None);
                    }
                }
                Phase::PayloadComplete { message_type, buf } => {
                    match read_delimiter(cursor, MESSAGE_TERMINATOR, "payload") {
                        Ok(true) => {}
                        Ok(false) => {
                            self.phase = Phase::PayloadComplete { message_type, buf };
                            return Ok(None);
                        }
                        Err(err) => {
                            self.pool.give_back(buf);
                            return Err(err);
                        }
                    }

                    let payload = self.finish_payload(message_type, buf)?;
                    self.phase = Phase::START;
                    return Ok(Some(Message::new(payload, message_type)));
                }
            }
        }
    }

    /// The cap applies to the payload as delivered, so a binary length counts
    /// Base64 characters and is held to the encoded size of the cap.
    fn check_declared_len(&self, len: usize, message_type: MessageType) -> Result<()> {
        let max = if message_type == MessageType::Binary {
            self.max_declared_len
        } else {
            self.max_message_size
        };
        if len > max {
            return Err(FrameError::CapacityExceeded {
                size: len as u64,
                max: self.max_message_size,
            });
        }
        Ok(())
    }

    fn finish_payload(&mut self, message_type: MessageType, mut raw: BytesMut) -> Result<Bytes> {
        if message_type == MessageType::Binary {
            return b64::decode_pooled(&mut self.pool, raw, self.max_message_size);
        }
        let payload = raw.split().freeze();
        self.pool.give_back(raw);
        Ok(payload)
    }
}

impl Default for TextParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ParseMessage for TextParser {
    fn try_parse(&mut self, cursor: &mut ByteCursor<'_>) -> Result<Option<Message>> {
        self.step(cursor)
            .inspect_err(|err| debug!(error = %err, "rejected text frame"))
    }
}

/// Consume `delimiter` if it is next. `Ok(false)` means the input ran out.
fn read_delimiter(cursor: &mut ByteCursor<'_>, delimiter: u8, field: &str) -> Result<bool> {
    match cursor.peek() {
        None => Ok(false),
        Some(byte) if byte == delimiter => {
            cursor.advance(1);
            Ok(true)
        }
        Some(_) => Err(FrameError::malformed(format!(
            "missing delimiter after {field}"
        ))),
    }
}
