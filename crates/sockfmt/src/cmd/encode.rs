use std::fs::{self, File};
use std::io::{self, Read, Write};

use sockfmt_frame::{Message, MessageWriter};
use tracing::debug;

use crate::cmd::EncodeArgs;
use crate::exit::{frame_error, io_error, CliResult, SUCCESS};

pub fn run(args: EncodeArgs) -> CliResult<i32> {
    let payload = resolve_payload(&args)?;
    let message = Message::new(payload, args.message_type);
    debug!(
        wire = %args.wire,
        message_type = %message.message_type,
        payload_size = message.payload.len(),
        "encoding message"
    );

    match &args.output {
        Some(path) => {
            let file = File::create(path).map_err(|err| {
                io_error(&format!("failed creating {}", path.display()), err)
            })?;
            write_frame(file, &args, &message)
        }
        None => write_frame(io::stdout().lock(), &args, &message),
    }
}

fn write_frame<W: Write>(out: W, args: &EncodeArgs, message: &Message) -> CliResult<i32> {
    let mut writer = MessageWriter::new(out, args.wire);
    writer
        .send(message)
        .map_err(|err| frame_error("encode failed", err))?;
    Ok(SUCCESS)
}

fn resolve_payload(args: &EncodeArgs) -> CliResult<Vec<u8>> {
    if let Some(data) = &args.data {
        return Ok(data.as_bytes().to_vec());
    }
    if let Some(path) = &args.file {
        return fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err));
    }
    let mut payload = Vec::new();
    io::stdin()
        .lock()
        .read_to_end(&mut payload)
        .map_err(|err| io_error("failed reading stdin", err))?;
    Ok(payload)
}
