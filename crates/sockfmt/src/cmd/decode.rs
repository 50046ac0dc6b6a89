use std::fs::File;
use std::io::{self, Read};

use sockfmt_frame::{FrameConfig, Message, MessageReader, WireFormat};
use tracing::{debug, info};

use crate::cmd::DecodeArgs;
use crate::exit::{frame_error, io_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_message, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let config = frame_config(&args)?;
    let wire = args.wire;
    let print = |index: usize, message: &Message| print_message(index, message, wire, format);

    let decoded = match &args.path {
        Some(path) => {
            let file = File::open(path)
                .map_err(|err| io_error(&format!("failed opening {}", path.display()), err))?;
            decode_stream(file, wire, &config, args.count, print)?
        }
        None => decode_stream(io::stdin().lock(), wire, &config, args.count, print)?,
    };

    info!(wire = %wire, messages = decoded, "decode complete");
    Ok(SUCCESS)
}

fn frame_config(args: &DecodeArgs) -> CliResult<FrameConfig> {
    let mut config = FrameConfig::default();
    if let Some(max) = args.max_message_size {
        if max == 0 {
            return Err(CliError::new(
                USAGE,
                "--max-message-size must be greater than zero",
            ));
        }
        config.max_message_size = max;
    }
    Ok(config)
}

/// Hand each message to `on_message` as it is decoded. Returns the number
/// of messages decoded.
fn decode_stream<R, F>(
    input: R,
    wire: WireFormat,
    config: &FrameConfig,
    count: Option<usize>,
    mut on_message: F,
) -> CliResult<usize>
where
    R: Read,
    F: FnMut(usize, &Message),
{
    let mut reader = MessageReader::with_config(input, wire, config);
    let mut decoded = 0usize;

    while count.is_none_or(|limit| decoded < limit) {
        match reader.next_message() {
            Ok(Some(message)) => {
                debug!(
                    message_type = %message.message_type,
                    payload_size = message.payload.len(),
                    "decoded message"
                );
                on_message(decoded, &message);
                decoded += 1;
            }
            Ok(None) => break,
            Err(err) => {
                return Err(frame_error(
                    &format!("decode failed after {decoded} messages"),
                    err,
                ))
            }
        }
    }

    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit::DATA_INVALID;
    use sockfmt_frame::MessageType;

    fn decode_all(
        input: &[u8],
        wire: WireFormat,
        count: Option<usize>,
    ) -> (Vec<Message>, CliResult<usize>) {
        let mut messages = Vec::new();
        let result = decode_stream(input, wire, &FrameConfig::default(), count, |_, message| {
            messages.push(message.clone())
        });
        (messages, result)
    }

    #[test]
    fn decodes_text_stream() {
        let (messages, result) = decode_all(b"2:T:hi;0:C:;", WireFormat::Text, None);
        assert_eq!(result.unwrap(), 2);
        assert_eq!(messages[0], Message::text("hi"));
        assert_eq!(messages[1].message_type, MessageType::Close);
    }

    #[test]
    fn count_stops_early() {
        let input = b"data: T\r\ndata: a\r\n\r\ndata: E\r\ndata: b\r\n\r\n";
        let (messages, result) = decode_all(input, WireFormat::ServerSentEvents, Some(1));
        assert_eq!(result.unwrap(), 1);
        assert_eq!(messages, vec![Message::text("a")]);
    }

    #[test]
    fn malformed_input_is_data_invalid() {
        let (messages, result) = decode_all(b"5:Thello", WireFormat::Text, None);
        let err = result.unwrap_err();
        assert!(messages.is_empty());
        assert_eq!(err.code, DATA_INVALID);
        assert!(err.message.contains("missing delimiter after type"));
    }

    #[test]
    fn messages_before_an_error_are_delivered() {
        let (messages, result) = decode_all(b"2:T:hi;1:C:x;5:Thello", WireFormat::Text, None);
        assert_eq!(messages, vec![Message::text("hi"), Message::close("x")]);
        let err = result.unwrap_err();
        assert_eq!(err.code, DATA_INVALID);
        assert!(err.message.starts_with("decode failed after 2 messages"));
    }

    #[test]
    fn truncated_frame_is_data_invalid() {
        let input = [0, 0, 0, 0, 0, 0, 0, 4, 0, b'a'];
        let (_, result) = decode_all(&input, WireFormat::Binary, None);
        assert_eq!(result.unwrap_err().code, DATA_INVALID);
    }

    #[test]
    fn zero_cap_is_rejected() {
        let args = DecodeArgs {
            wire: WireFormat::Binary,
            path: None,
            count: None,
            max_message_size: Some(0),
        };
        assert_eq!(frame_config(&args).unwrap_err().code, USAGE);
    }
}
