//! `tokio_util` codec over the resumable parsers.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::config::FrameConfig;
use crate::error::{FrameError, Result};
use crate::format::{WireFormat, WireParser};
use crate::message::Message;

/// Decodes and encodes [`Message`]s for `Framed` transports.
#[derive(Debug)]
pub struct MessageCodec {
    parser: WireParser,
}

impl MessageCodec {
    pub fn new(wire: WireFormat) -> Self {
        Self::with_config(wire, &FrameConfig::default())
    }

    pub fn with_config(wire: WireFormat, config: &FrameConfig) -> Self {
        Self {
            parser: WireParser::new(wire, config),
        }
    }

    pub fn wire_format(&self) -> WireFormat {
        self.parser.wire_format()
    }

    /// Discard partial parser state, e.g. after a decode error.
    pub fn reset(&mut self) {
        self.parser.reset();
    }
}

impl Decoder for MessageCodec {
    type Item = Message;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Message>> {
        self.parser.try_parse_buf(src)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Message>> {
        match self.decode(src)? {
            Some(message) => Ok(Some(message)),
            None if src.is_empty() && self.parser.is_idle() => Ok(None),
            None => Err(FrameError::ConnectionClosed),
        }
    }
}

impl Encoder<Message> for MessageCodec {
    type Error = FrameError;

    fn encode(&mut self, message: Message, dst: &mut BytesMut) -> Result<()> {
        <Self as Encoder<&Message>>::encode(self, &message, dst)
    }
}

impl Encoder<&Message> for MessageCodec {
    type Error = FrameError;

    fn encode(&mut self, message: &Message, dst: &mut BytesMut) -> Result<()> {
        // `BytesMut` grows on demand, so the sink never refuses.
        self.parser.wire_format().try_write(message, dst)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use futures_util::{SinkExt, StreamExt};
    use tokio_util::codec::{FramedRead, FramedWrite};

    use super::*;

    #[test]
    fn decode_across_split_buffers() {
        let mut codec = MessageCodec::new(WireFormat::Text);
        let mut src = BytesMut::from(&b"4:B:QU"[..]);
        assert!(codec.decode(&mut src).unwrap().is_none());
        assert!(src.is_empty());

        src.extend_from_slice(b"I=;1:T:");
        assert_eq!(
            codec.decode(&mut src).unwrap(),
            Some(Message::binary(vec![0x41, 0x42]))
        );
        assert_eq!(src.as_ref(), b"1:T:");
    }

    #[test]
    fn decode_eof_mid_frame_is_closed() {
        let mut codec = MessageCodec::new(WireFormat::Binary);
        let mut src = BytesMut::from(&[0u8, 0, 0][..]);
        let err = codec.decode_eof(&mut src).unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[tokio::test]
    async fn framed_roundtrip() {
        let mut wire = Vec::new();
        {
            let mut framed =
                FramedWrite::new(&mut wire, MessageCodec::new(WireFormat::ServerSentEvents));
            framed.send(Message::text("hello\nworld")).await.unwrap();
            framed.send(Message::close("")).await.unwrap();
        }

        let mut framed = FramedRead::new(
            wire.as_slice(),
            MessageCodec::new(WireFormat::ServerSentEvents),
        );
        assert_eq!(
            framed.next().await.unwrap().unwrap(),
            Message::text("hello\nworld")
        );
        assert_eq!(framed.next().await.unwrap().unwrap(), Message::close(""));
        assert!(framed.next().await.is_none());
    }
}
