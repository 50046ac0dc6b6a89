//! Feed a stream of encoded messages to a parser in arbitrary chunks.
//!
//! Run with:
//!   cargo run --example chunked-decode
//!
//! Each wire format is encoded into one buffer, then handed to the parser
//! three bytes at a time, the way a socket might deliver it.

use bytes::BytesMut;
use sockfmt::frame::{Message, WireFormat, WireParser};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let messages = [
        Message::text("hello"),
        Message::binary(vec![0x00, 0xFF, 0x10]),
        Message::text("line one\nline two"),
        Message::close("bye"),
    ];

    for wire in [
        WireFormat::Binary,
        WireFormat::Text,
        WireFormat::ServerSentEvents,
    ] {
        let mut encoded = BytesMut::new();
        for message in &messages {
            wire.try_write(message, &mut encoded)?;
        }
        eprintln!("{wire}: {} bytes for {} messages", encoded.len(), messages.len());

        let mut parser = WireParser::new(wire, &Default::default());
        let mut pending = BytesMut::new();
        let mut decoded = 0usize;

        for chunk in encoded.chunks(3) {
            pending.extend_from_slice(chunk);
            while let Some(message) = parser.try_parse_buf(&mut pending)? {
                eprintln!(
                    "  {} ({} bytes)",
                    message.message_type,
                    message.payload.len()
                );
                decoded += 1;
            }
        }

        assert_eq!(decoded, messages.len());
        assert!(parser.is_idle());
    }

    Ok(())
}
