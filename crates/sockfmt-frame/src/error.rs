/// Errors that can occur during message formatting and parsing.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The input does not follow the wire format.
    #[error("malformed frame: {reason}")]
    MalformedFrame { reason: String },

    /// The API was used in a way the wire format cannot honour.
    #[error("usage error: {0}")]
    Usage(String),

    /// The declared payload length exceeds the configured maximum.
    #[error("message too large ({size} bytes, max {max})")]
    CapacityExceeded { size: u64, max: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended before a complete frame was received.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,

    /// The output sink refused the frame.
    #[error("output sink is full")]
    SinkFull,
}

/// Coarse classification of [`FrameError`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Malformed,
    Usage,
    Capacity,
    Io,
    Closed,
}

impl FrameError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedFrame {
            reason: reason.into(),
        }
    }

    pub(crate) fn usage(message: impl Into<String>) -> Self {
        Self::Usage(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedFrame { .. } => ErrorKind::Malformed,
            Self::Usage(_) => ErrorKind::Usage,
            Self::CapacityExceeded { .. } => ErrorKind::Capacity,
            Self::Io(_) | Self::SinkFull => ErrorKind::Io,
            Self::ConnectionClosed => ErrorKind::Closed,
        }
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_cover_taxonomy() {
        assert_eq!(FrameError::malformed("x").kind(), ErrorKind::Malformed);
        assert_eq!(FrameError::usage("x").kind(), ErrorKind::Usage);
        assert_eq!(
            FrameError::CapacityExceeded { size: 1, max: 0 }.kind(),
            ErrorKind::Capacity
        );
        assert_eq!(FrameError::ConnectionClosed.kind(), ErrorKind::Closed);
    }

    #[test]
    fn display_includes_reason() {
        let err = FrameError::malformed("missing delimiter after type");
        assert_eq!(
            err.to_string(),
            "malformed frame: missing delimiter after type"
        );
    }
}
