//! The message value carried across the framing boundary, and the
//! negotiated wire format.

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;

use crate::error::{FrameError, Result};

/// Content type announcing the text wire format.
pub const TEXT_CONTENT_TYPE: &str =
    "application/vnd.microsoft.aspnetcore.endpoint-messages.v1+text";

/// Content type announcing the binary wire format.
pub const BINARY_CONTENT_TYPE: &str =
    "application/vnd.microsoft.aspnetcore.endpoint-messages.v1+binary";

/// Semantic kind of a message, independent of the wire encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    Text,
    Binary,
    Close,
    Error,
}

impl MessageType {
    /// Indicator byte used by the binary wire format.
    pub fn binary_indicator(self) -> u8 {
        match self {
            Self::Text => 0x00,
            Self::Binary => 0x01,
            Self::Error => 0x02,
            Self::Close => 0x03,
        }
    }

    pub fn from_binary_indicator(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Self::Text),
            0x01 => Some(Self::Binary),
            0x02 => Some(Self::Error),
            0x03 => Some(Self::Close),
            _ => None,
        }
    }

    /// Indicator character used by the text and SSE wire formats.
    pub fn text_indicator(self) -> u8 {
        match self {
            Self::Text => b'T',
            Self::Binary => b'B',
            Self::Close => b'C',
            Self::Error => b'E',
        }
    }

    pub fn from_text_indicator(byte: u8) -> Option<Self> {
        match byte {
            b'T' => Some(Self::Text),
            b'B' => Some(Self::Binary),
            b'C' => Some(Self::Close),
            b'E' => Some(Self::Error),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Binary => "binary",
            Self::Close => "close",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MessageType {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "binary" => Ok(Self::Binary),
            "close" => Ok(Self::Close),
            "error" => Ok(Self::Error),
            other => Err(FrameError::usage(format!("unknown message type: {other}"))),
        }
    }
}

/// A discrete application message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// The message payload.
    pub payload: Bytes,
    /// What the payload represents.
    pub message_type: MessageType,
    /// `false` marks a streamed fragment. Every formatter in this crate
    /// rejects such messages.
    pub end_of_message: bool,
}

impl Message {
    /// Create a complete message.
    pub fn new(payload: impl Into<Bytes>, message_type: MessageType) -> Self {
        Self {
            payload: payload.into(),
            message_type,
            end_of_message: true,
        }
    }

    /// Create a streamed fragment (`end_of_message == false`).
    pub fn partial(payload: impl Into<Bytes>, message_type: MessageType) -> Self {
        Self {
            payload: payload.into(),
            message_type,
            end_of_message: false,
        }
    }

    pub fn text(payload: impl Into<Bytes>) -> Self {
        Self::new(payload, MessageType::Text)
    }

    pub fn binary(payload: impl Into<Bytes>) -> Self {
        Self::new(payload, MessageType::Binary)
    }

    pub fn close(payload: impl Into<Bytes>) -> Self {
        Self::new(payload, MessageType::Close)
    }

    pub fn error(payload: impl Into<Bytes>) -> Self {
        Self::new(payload, MessageType::Error)
    }

    pub(crate) fn ensure_complete(&self) -> Result<()> {
        if self.end_of_message {
            Ok(())
        } else {
            Err(FrameError::usage(
                "cannot format a message with end_of_message == false",
            ))
        }
    }
}

/// Wire encoding negotiated for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageFormat {
    Text,
    Binary,
}

impl MessageFormat {
    /// Single-byte indicator used during negotiation.
    pub fn indicator(self) -> u8 {
        match self {
            Self::Text => b'T',
            Self::Binary => b'B',
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Text => TEXT_CONTENT_TYPE,
            Self::Binary => BINARY_CONTENT_TYPE,
        }
    }

    pub fn from_indicator(indicator: u8) -> Result<Self> {
        get_format_from_indicator(indicator)
    }

    pub fn from_content_type(content_type: &str) -> Result<Self> {
        get_format_from_content_type(content_type)
    }
}

impl fmt::Display for MessageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Binary => f.write_str("binary"),
        }
    }
}

/// Map a negotiation indicator byte (`'T'` / `'B'`) to a format.
pub fn get_format_from_indicator(indicator: u8) -> Result<MessageFormat> {
    match indicator {
        b'T' => Ok(MessageFormat::Text),
        b'B' => Ok(MessageFormat::Binary),
        other => Err(FrameError::usage(format!(
            "invalid message format indicator: 0x{other:02X}"
        ))),
    }
}

/// Map an HTTP-style content type to a format.
///
/// Parameters after `;` are ignored.
pub fn get_format_from_content_type(content_type: &str) -> Result<MessageFormat> {
    let media_type = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim();

    if media_type.eq_ignore_ascii_case(TEXT_CONTENT_TYPE) {
        Ok(MessageFormat::Text)
    } else if media_type.eq_ignore_ascii_case(BINARY_CONTENT_TYPE) {
        Ok(MessageFormat::Binary)
    } else {
        Err(FrameError::usage(format!(
            "unsupported content type: {content_type}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn binary_indicators_roundtrip() {
        for ty in [
            MessageType::Text,
            MessageType::Binary,
            MessageType::Close,
            MessageType::Error,
        ] {
            assert_eq!(
                MessageType::from_binary_indicator(ty.binary_indicator()),
                Some(ty)
            );
            assert_eq!(MessageType::from_text_indicator(ty.text_indicator()), Some(ty));
        }
        assert_eq!(MessageType::from_binary_indicator(0x7F), None);
        assert_eq!(MessageType::from_text_indicator(b'X'), None);
    }

    #[test]
    fn binary_indicator_values() {
        assert_eq!(MessageType::Text.binary_indicator(), 0x00);
        assert_eq!(MessageType::Binary.binary_indicator(), 0x01);
        assert_eq!(MessageType::Error.binary_indicator(), 0x02);
        assert_eq!(MessageType::Close.binary_indicator(), 0x03);
    }

    #[test]
    fn format_from_indicator() {
        assert_eq!(get_format_from_indicator(b'T').unwrap(), MessageFormat::Text);
        assert_eq!(get_format_from_indicator(b'B').unwrap(), MessageFormat::Binary);
        let err = get_format_from_indicator(b'x').unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn format_from_content_type() {
        assert_eq!(
            get_format_from_content_type(TEXT_CONTENT_TYPE).unwrap(),
            MessageFormat::Text
        );
        assert_eq!(
            get_format_from_content_type(&format!(" {BINARY_CONTENT_TYPE}; charset=utf-8"))
                .unwrap(),
            MessageFormat::Binary
        );
        assert_eq!(
            get_format_from_content_type(&TEXT_CONTENT_TYPE.to_ascii_uppercase()).unwrap(),
            MessageFormat::Text
        );
        assert!(get_format_from_content_type("text/plain").is_err());
        assert!(get_format_from_content_type("").is_err());
    }

    #[test]
    fn format_accessors_match_negotiation() {
        for format in [MessageFormat::Text, MessageFormat::Binary] {
            assert_eq!(MessageFormat::from_indicator(format.indicator()).unwrap(), format);
            assert_eq!(
                MessageFormat::from_content_type(format.content_type()).unwrap(),
                format
            );
        }
    }

    #[test]
    fn partial_messages_are_rejected_for_formatting() {
        assert!(Message::text("ok").ensure_complete().is_ok());
        let err = Message::partial("x", MessageType::Text)
            .ensure_complete()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn message_type_parses_names() {
        assert_eq!("Binary".parse::<MessageType>().unwrap(), MessageType::Binary);
        assert!("bogus".parse::<MessageType>().is_err());
    }
}
