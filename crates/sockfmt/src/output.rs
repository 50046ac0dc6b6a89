use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use sockfmt_frame::{Message, MessageType, WireFormat};

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct MessageOutput<'a> {
    index: usize,
    wire: &'a str,
    message_type: &'a str,
    payload_size: usize,
    payload: String,
}

/// Print one decoded message as soon as it is available.
pub fn print_message(index: usize, message: &Message, wire: WireFormat, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", message_json(index, message, wire)),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["#", "TYPE", "SIZE", "PAYLOAD"])
                .add_row(vec![
                    index.to_string(),
                    message.message_type.to_string(),
                    message.payload.len().to_string(),
                    payload_preview(message),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "#{index} wire={wire} type={} size={} payload={}",
                message.message_type,
                message.payload.len(),
                payload_preview(message)
            );
        }
        OutputFormat::Raw => print_raw(message.payload.as_ref()),
    }
}

fn message_json(index: usize, message: &Message, wire: WireFormat) -> String {
    let out = MessageOutput {
        index,
        wire: wire.name(),
        message_type: message.message_type.name(),
        payload_size: message.payload.len(),
        payload: payload_preview(message),
    };
    serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
}

fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn payload_preview(message: &Message) -> String {
    if message.message_type == MessageType::Binary {
        return format!("<binary {} bytes>", message.payload.len());
    }
    match std::str::from_utf8(&message.payload) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<non-utf8 {} bytes>", message.payload.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_output_fields() {
        let json = message_json(3, &Message::close("bye"), WireFormat::ServerSentEvents);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["index"], 3);
        assert_eq!(value["wire"], "sse");
        assert_eq!(value["message_type"], "close");
        assert_eq!(value["payload_size"], 3);
        assert_eq!(value["payload"], "bye");
    }

    #[test]
    fn binary_payload_is_summarised() {
        assert_eq!(
            payload_preview(&Message::binary(vec![0xFF, 0x00])),
            "<binary 2 bytes>"
        );
        assert_eq!(
            payload_preview(&Message::text(vec![0xFF])),
            "<non-utf8 1 bytes>"
        );
    }
}
