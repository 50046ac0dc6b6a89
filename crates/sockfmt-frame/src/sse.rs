//! Server-sent-events wire format.
//!
//! For transports that only carry newline-delimited text in one direction.
//! One message is written as:
//!
//! ```text
//! data: <T|B|C|E>\r\n
//! data: <payload line>\r\n      (zero or more)
//! \r\n
//! ```
//!
//! Binary payloads are a single Base64 line. Other payloads are split on
//! `\n` and re-joined with `\n` when decoded. Lines starting with `:` are
//! comments.

use std::mem;

use bytes::{Bytes, BytesMut};
use tracing::{debug, trace};

use crate::b64;
use crate::config::FrameConfig;
use crate::cursor::ByteCursor;
use crate::error::{FrameError, Result};
use crate::format::ParseMessage;
use crate::message::{Message, MessageType};
use crate::pool::BufferPool;
use crate::sink::OutputSink;

pub const DATA_PREFIX: &[u8] = b"data: ";
pub const LINE_TERMINATOR: &[u8] = b"\r\n";
pub const COMMENT_PREFIX: u8 = b':';

/// Write `message` as one event.
///
/// Returns `Ok(false)` if the sink refused any part of the event.
pub fn try_write<S: OutputSink + ?Sized>(message: &Message, sink: &mut S) -> Result<bool> {
    message.ensure_complete()?;

    if !write_line(sink, &[message.message_type.text_indicator()]) {
        return Ok(false);
    }

    let payload = &message.payload;
    let body_written = if message.message_type == MessageType::Binary {
        sink.try_write(DATA_PREFIX)
            && b64::encode_to_sink(payload, sink)
            && sink.try_write(LINE_TERMINATOR)
    } else if payload.is_empty() {
        true
    } else {
        payload
            .split(|&byte| byte == b'\n')
            .all(|line| write_line(sink, line))
    };

    Ok(body_written && sink.try_write(LINE_TERMINATOR))
}

fn write_line<S: OutputSink + ?Sized>(sink: &mut S, line: &[u8]) -> bool {
    sink.try_write(DATA_PREFIX) && sink.try_write(line) && sink.try_write(LINE_TERMINATOR)
}

#[derive(Debug)]
enum Phase {
    ReadMessageType,
    ReadMessagePayload {
        message_type: MessageType,
        payload: BytesMut,
        lines: usize,
    },
    /// The single binary payload line has been read; only comments or the
    /// blank line may follow.
    ReadEndOfMessage {
        message_type: MessageType,
        payload: BytesMut,
    },
    Error,
}

/// Resumable parser for the server-sent-events format.
#[derive(Debug)]
pub struct SseParser {
    phase: Phase,
    // Bytes of a line whose `\n` has not arrived yet.
    fragment: BytesMut,
    // Inside a comment line; its bytes are dropped as they arrive.
    in_comment: bool,
    // Last dropped comment byte was `\r`.
    comment_cr: bool,
    pool: BufferPool,
    max_message_size: usize,
    max_line_len: usize,
}

impl SseParser {
    pub fn new() -> Self {
        Self::with_config(&FrameConfig::default())
    }

    pub fn with_config(config: &FrameConfig) -> Self {
        let max_message_size = config.message_cap();
        Self {
            phase: Phase::ReadMessageType,
            fragment: BytesMut::new(),
            in_comment: false,
            comment_cr: false,
            pool: BufferPool::from_config(config),
            max_message_size,
            max_line_len: b64::encoded_len(max_message_size)
                .saturating_add(DATA_PREFIX.len() + LINE_TERMINATOR.len()),
        }
    }

    /// Drop any partial event and accept a new one.
    pub fn reset(&mut self) {
        self.release();
        self.phase = Phase::ReadMessageType;
    }

    /// `true` when no bytes of an event have been consumed.
    pub fn is_idle(&self) -> bool {
        matches!(self.phase, Phase::ReadMessageType)
            && self.fragment.is_empty()
            && !self.in_comment
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.phase, Phase::Error)
    }

    fn release(&mut self) {
        self.fragment.clear();
        self.in_comment = false;
        self.comment_cr = false;
        match mem::replace(&mut self.phase, Phase::Error) {
            Phase::ReadMessagePayload { payload, .. } | Phase::ReadEndOfMessage { payload, .. } => {
                self.pool.give_back(payload);
            }
            _ => {}
        }
    }

    fn step(&mut self, cursor: &mut ByteCursor<'_>) -> Result<Option<Message>> {
        if self.is_failed() {
            return Err(FrameError::usage(
                "event parser used after a malformed event; reset required",
            ));
        }

        while !cursor.is_empty() {
            if self.in_comment
                || (self.fragment.is_empty() && cursor.peek() == Some(COMMENT_PREFIX))
            {
                self.skip_comment(cursor)?;
                continue;
            }

            let remaining = cursor.remaining();
            let Some(newline) = remaining.iter().position(|&byte| byte == b'\n') else {
                self.fragment.extend_from_slice(remaining);
                cursor.advance(remaining.len());
                self.check_line_len(self.fragment.len())?;
                return Ok(None);
            };

            let chunk = cursor.take(newline + 1);
            let message = if self.fragment.is_empty() {
                self.check_line_len(chunk.len())?;
                self.process_line(chunk)?
            } else {
                self.fragment.extend_from_slice(chunk);
                self.check_line_len(self.fragment.len())?;
                let mut line = mem::take(&mut self.fragment);
                let message = self.process_line(&line);
                line.clear();
                self.fragment = line;
                message?
            };

            if message.is_some() {
                return Ok(message);
            }
        }

        Ok(None)
    }

    /// Drop comment bytes up to and including the line's `\n`. Comments are
    /// never buffered, so they do not count against the line limit.
    fn skip_comment(&mut self, cursor: &mut ByteCursor<'_>) -> Result<()> {
        self.in_comment = true;
        let remaining = cursor.remaining();
        let Some(newline) = remaining.iter().position(|&byte| byte == b'\n') else {
            self.comment_cr = remaining.last() == Some(&b'\r');
            cursor.advance(remaining.len());
            return Ok(());
        };

        let terminated = match newline {
            0 => self.comment_cr,
            n => remaining[n - 1] == b'\r',
        };
        cursor.advance(newline + 1);
        self.in_comment = false;
        self.comment_cr = false;
        if !terminated {
            return Err(bare_newline());
        }
        trace!("skipping comment line");
        Ok(())
    }

    fn check_line_len(&self, len: usize) -> Result<()> {
        if len > self.max_line_len {
            return Err(FrameError::CapacityExceeded {
                size: len as u64,
                max: self.max_line_len,
            });
        }
        Ok(())
    }

    /// Handle one line including its trailing `\n`.
    fn process_line(&mut self, line: &[u8]) -> Result<Option<Message>> {
        let Some(content) = line.strip_suffix(LINE_TERMINATOR) else {
            return Err(bare_newline());
        };

        if content.is_empty() {
            return self.end_of_message();
        }
        let Some(data) = content.strip_prefix(DATA_PREFIX) else {
            return Err(FrameError::malformed("expected the 'data: ' line prefix"));
        };

        self.phase = match mem::replace(&mut self.phase, Phase::Error) {
            Phase::ReadMessageType => {
                let message_type = match data {
                    [indicator] => MessageType::from_text_indicator(*indicator),
                    _ => None,
                }
                .ok_or_else(|| {
                    FrameError::malformed(format!(
                        "invalid message type line {:?}",
                        String::from_utf8_lossy(data)
                    ))
                })?;
                trace!(%message_type, "event type decoded");
                Phase::ReadMessagePayload {
                    message_type,
                    payload: self.pool.rent(0),
                    lines: 0,
                }
            }
            Phase::ReadMessagePayload {
                message_type,
                mut payload,
                lines,
            } => {
                if lines > 0 {
                    payload.extend_from_slice(b"\n");
                }
                payload.extend_from_slice(data);
                if payload.len() > self.max_payload_len(message_type) {
                    let size = payload.len() as u64;
                    self.pool.give_back(payload);
                    return Err(FrameError::CapacityExceeded {
                        size,
                        max: self.max_message_size,
                    });
                }
                if message_type == MessageType::Binary {
                    Phase::ReadEndOfMessage {
                        message_type,
                        payload,
                    }
                } else {
                    Phase::ReadMessagePayload {
                        message_type,
                        payload,
                        lines: lines + 1,
                    }
                }
            }
            Phase::ReadEndOfMessage { payload, .. } => {
                self.pool.give_back(payload);
                return Err(FrameError::malformed(
                    "binary payload must be a single data line",
                ));
            }
            Phase::Error => {
                return Err(FrameError::usage("event parser is in the error state"));
            }
        };
        Ok(None)
    }

    fn max_payload_len(&self, message_type: MessageType) -> usize {
        if message_type == MessageType::Binary {
            b64::encoded_len(self.max_message_size)
        } else {
            self.max_message_size
        }
    }

    fn end_of_message(&mut self) -> Result<Option<Message>> {
        let (message_type, payload) = match mem::replace(&mut self.phase, Phase::Error) {
            Phase::ReadMessageType => {
                self.phase = Phase::ReadMessageType;
                trace!("skipping blank line between events");
                return Ok(None);
            }
            Phase::ReadMessagePayload {
                message_type,
                payload,
                ..
            }
            | Phase::ReadEndOfMessage {
                message_type,
                payload,
            } => (message_type, payload),
            Phase::Error => {
                return Err(FrameError::usage("event parser is in the error state"));
            }
        };

        let payload = self.finish_payload(message_type, payload)?;
        self.phase = Phase::ReadMessageType;
        Ok(Some(Message::new(payload, message_type)))
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

fn bare_newline() -> FrameError {
    FrameError::malformed("'\\n' used outside the '\\r\\n' sequence")
}

impl Default for SseParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ParseMessage for SseParser {
    fn try_parse(&mut self, cursor: &mut ByteCursor<'_>) -> Result<Option<Message>> {
        self.step(cursor).inspect_err(|err| {
            debug!(error = %err, "rejected server-sent event");
            self.release();
        })
    }
}
