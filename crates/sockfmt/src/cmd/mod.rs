use clap::{ArgGroup, Args, Subcommand};
use std::path::PathBuf;

use sockfmt_frame::{MessageType, WireFormat};

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod negotiate;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Encode one message and write its frame.
    Encode(EncodeArgs),
    /// Decode frames and print the messages they carry.
    Decode(DecodeArgs),
    /// Resolve a message format from an indicator or content type.
    Negotiate(NegotiateArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args),
        Command::Decode(args) => decode::run(args, format),
        Command::Negotiate(args) => negotiate::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Wire format (binary, text, sse).
    #[arg(long, short = 'w', default_value = "binary")]
    pub wire: WireFormat,
    /// Message type (text, binary, close, error).
    #[arg(long = "type", short = 't', default_value = "text")]
    pub message_type: MessageType,
    /// Raw string payload.
    #[arg(long, conflicts_with = "file")]
    pub data: Option<String>,
    /// Read payload from file. Without --data or --file the payload is read from stdin.
    #[arg(long, conflicts_with = "data")]
    pub file: Option<PathBuf>,
    /// Write the frame to a file instead of stdout.
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Wire format (binary, text, sse).
    #[arg(long, short = 'w', default_value = "binary")]
    pub wire: WireFormat,
    /// File holding encoded frames. Reads stdin when omitted.
    pub path: Option<PathBuf>,
    /// Stop after decoding N messages.
    #[arg(long)]
    pub count: Option<usize>,
    /// Largest payload accepted, in bytes.
    #[arg(long, value_name = "BYTES")]
    pub max_message_size: Option<usize>,
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("source").required(true).args(["indicator", "content_type"])))]
pub struct NegotiateArgs {
    /// Single-character format indicator ('T' or 'B').
    #[arg(long)]
    pub indicator: Option<char>,
    /// Content type header value.
    #[arg(long)]
    pub content_type: Option<String>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
