//! Resumable message framing for byte-stream transports.
//!
//! Discrete messages (text, binary, close and error signals) are carried over
//! a transport that only guarantees an ordered byte stream. Three wire
//! encodings are supported:
//! - Binary: 8-byte big-endian length, 1-byte type, raw payload
//! - Text: `<length>:<type>:<payload>;` with Base64 binary payloads
//! - Server-sent events: `data:` lines for one-way text-only transports
//!
//! Parsers accept input in chunks of any size and resume where they stopped;
//! consumed bytes are never scanned again.

mod b64;
pub mod binary;
#[cfg(feature = "async")]
pub mod codec;
pub mod config;
pub mod cursor;
pub mod error;
pub mod format;
pub mod message;
pub mod pool;
pub mod reader;
pub mod sink;
pub mod sse;
pub mod text;
pub mod writer;

pub use binary::BinaryParser;
#[cfg(feature = "async")]
pub use codec::MessageCodec;
pub use config::{FrameConfig, MAX_MESSAGE_SIZE};
pub use cursor::ByteCursor;
pub use error::{ErrorKind, FrameError, Result};
pub use format::{MessageFormatter, MessageParser, ParseMessage, WireFormat, WireParser};
pub use message::{
    get_format_from_content_type, get_format_from_indicator, Message, MessageFormat,
    MessageType, BINARY_CONTENT_TYPE, TEXT_CONTENT_TYPE,
};
pub use pool::BufferPool;
pub use reader::MessageReader;
pub use sink::{BoundedSink, OutputSink};
pub use sse::SseParser;
pub use text::TextParser;
pub use writer::MessageWriter;
