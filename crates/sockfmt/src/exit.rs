use std::fmt;
use std::io;

use sockfmt_frame::FrameError;

// Exit codes follow sysexits where one fits.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const NOT_FOUND: i32 = 66;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::NotFound => NOT_FOUND,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::BrokenPipe => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::MalformedFrame { .. } | FrameError::CapacityExceeded { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        FrameError::ConnectionClosed => CliError::new(DATA_INVALID, format!("{context}: {err}")),
        FrameError::Usage(_) => CliError::new(USAGE, format!("{context}: {err}")),
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_frames_map_to_data_invalid() {
        let err = FrameError::MalformedFrame {
            reason: "missing delimiter after type".to_string(),
        };
        let cli = frame_error("decode failed", err);
        assert_eq!(cli.code, DATA_INVALID);
        assert!(cli.message.starts_with("decode failed: malformed frame"));
    }

    #[test]
    fn usage_errors_map_to_usage() {
        let cli = frame_error("negotiate", FrameError::Usage("bad".to_string()));
        assert_eq!(cli.code, USAGE);
    }

    #[test]
    fn io_not_found() {
        let err = io::Error::from(io::ErrorKind::NotFound);
        assert_eq!(frame_error("read", FrameError::Io(err)).code, NOT_FOUND);
    }

    #[test]
    fn sink_full_is_internal() {
        assert_eq!(frame_error("encode", FrameError::SinkFull).code, INTERNAL);
    }
}
