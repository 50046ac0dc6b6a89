//! Format dispatch.
//!
//! Application code talks to [`MessageFormatter`] and [`MessageParser`],
//! which pick the binary or text implementation from the negotiated
//! [`MessageFormat`]. Server-sent events are write-mostly and live behind
//! their own API in [`crate::sse`]; [`WireFormat`] names all three for the
//! stream adapters.

use std::fmt;
use std::str::FromStr;

use bytes::{Buf, BytesMut};

use crate::binary::{self, BinaryParser};
use crate::config::FrameConfig;
use crate::cursor::ByteCursor;
use crate::error::{FrameError, Result};
use crate::message::{Message, MessageFormat};
use crate::sink::OutputSink;
use crate::sse::{self, SseParser};
use crate::text::{self, TextParser};

/// Incremental decoding of messages from a byte cursor.
pub trait ParseMessage {
    /// Decode the next message.
    ///
    /// Returns `Ok(None)` when the cursor ran out before a message
    /// completed; every byte consumed so far is retained by the parser.
    fn try_parse(&mut self, cursor: &mut ByteCursor<'_>) -> Result<Option<Message>>;
}

/// Stateless frame writer.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageFormatter;

impl MessageFormatter {
    /// Write `message` to `sink` using `format`.
    ///
    /// `Ok(false)` means the sink is full; discard it and retry with a larger
    /// one.
    pub fn try_write<S: OutputSink + ?Sized>(
        message: &Message,
        sink: &mut S,
        format: MessageFormat,
    ) -> Result<bool> {
        match format {
            MessageFormat::Binary => binary::try_write(message, sink),
            MessageFormat::Text => text::try_write(message, sink),
        }
    }
}

/// Per-direction parser holding one instance of each sub-parser, so the
/// format can change between messages.
#[derive(Debug, Default)]
pub struct MessageParser {
    binary: BinaryParser,
    text: TextParser,
}

impl MessageParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: &FrameConfig) -> Self {
        Self {
            binary: BinaryParser::with_config(config),
            text: TextParser::with_config(config),
        }
    }

    pub fn try_parse(
        &mut self,
        cursor: &mut ByteCursor<'_>,
        format: MessageFormat,
    ) -> Result<Option<Message>> {
        match format {
            MessageFormat::Binary => self.binary.try_parse(cursor),
            MessageFormat::Text => self.text.try_parse(cursor),
        }
    }

    /// Parse from the front of `buf`, dropping the bytes consumed.
    pub fn try_parse_buf(
        &mut self,
        buf: &mut BytesMut,
        format: MessageFormat,
    ) -> Result<Option<Message>> {
        let mut cursor = ByteCursor::new(&buf[..]);
        let result = self.try_parse(&mut cursor, format);
        let consumed = cursor.consumed();
        buf.advance(consumed);
        result
    }

    pub fn reset(&mut self) {
        self.binary.reset();
        self.text.reset();
    }

    /// `true` when neither sub-parser holds a partial frame.
    pub fn is_idle(&self) -> bool {
        self.binary.is_idle() && self.text.is_idle()
    }
}

/// Every wire encoding this crate speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireFormat {
    Binary,
    Text,
    ServerSentEvents,
}

impl WireFormat {
    pub fn name(self) -> &'static str {
        match self {
            Self::Binary => "binary",
            Self::Text => "text",
            Self::ServerSentEvents => "sse",
        }
    }

    /// Write `message` to `sink` in this encoding.
    pub fn try_write<S: OutputSink + ?Sized>(
        self,
        message: &Message,
        sink: &mut S,
    ) -> Result<bool> {
        match self {
            Self::Binary => MessageFormatter::try_write(message, sink, MessageFormat::Binary),
            Self::Text => MessageFormatter::try_write(message, sink, MessageFormat::Text),
            Self::ServerSentEvents => sse::try_write(message, sink),
        }
    }

    pub fn message_format(self) -> Option<MessageFormat> {
        match self {
            Self::Binary => Some(MessageFormat::Binary),
            Self::Text => Some(MessageFormat::Text),
            Self::ServerSentEvents => None,
        }
    }
}

impl From<MessageFormat> for WireFormat {
    fn from(format: MessageFormat) -> Self {
        match format {
            MessageFormat::Binary => Self::Binary,
            MessageFormat::Text => Self::Text,
        }
    }
}

impl fmt::Display for WireFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WireFormat {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "binary" => Ok(Self::Binary),
            "text" => Ok(Self::Text),
            "sse" | "server-sent-events" => Ok(Self::ServerSentEvents),
            other => Err(FrameError::usage(format!("unsupported wire format: {other}"))),
        }
    }
}

/// Parser for any [`WireFormat`], fixed at construction.
#[derive(Debug)]
pub enum WireParser {
    Framed {
        parser: MessageParser,
        format: MessageFormat,
    },
    ServerSentEvents(SseParser),
}

impl WireParser {
    pub fn new(wire: WireFormat, config: &FrameConfig) -> Self {
        match wire.message_format() {
            Some(format) => Self::Framed {
                parser: MessageParser::with_config(config),
                format,
            },
            None => Self::ServerSentEvents(SseParser::with_config(config)),
        }
    }

    pub fn wire_format(&self) -> WireFormat {
        match self {
            Self::Framed { format, .. } => (*format).into(),
            Self::ServerSentEvents(_) => WireFormat::ServerSentEvents,
        }
    }

    pub fn reset(&mut self) {
        match self {
            Self::Framed { parser, .. } => parser.reset(),
            Self::ServerSentEvents(parser) => parser.reset(),
        }
    }

    pub fn is_idle(&self) -> bool {
        match self {
            Self::Framed { parser, .. } => parser.is_idle(),
            Self::ServerSentEvents(parser) => parser.is_idle(),
        }
    }

    /// Parse from the front of `buf`, dropping the bytes consumed.
    pub fn try_parse_buf(&mut self, buf: &mut BytesMut) -> Result<Option<Message>> {
        let mut cursor = ByteCursor::new(&buf[..]);
        let result = self.try_parse(&mut cursor);
        let consumed = cursor.consumed();
        buf.advance(consumed);
        result
    }
}

impl ParseMessage for WireParser {
    fn try_parse(&mut self, cursor: &mut ByteCursor<'_>) -> Result<Option<Message>> {
        match self {
            Self::Framed { parser, format } => parser.try_parse(cursor, *format),
            Self::ServerSentEvents(parser) => parser.try_parse(cursor),
        }
    }
}
