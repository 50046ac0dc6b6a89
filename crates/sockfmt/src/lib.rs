//! Message framing for byte-stream transports.
//!
//! sockfmt carries discrete messages over transports that only guarantee an
//! ordered byte stream, using a binary, text or server-sent-events encoding.
//!
//! # Crate Structure
//!
//! - [`frame`]: Formatters, resumable parsers and stream adapters
//! - [`codec`]: `tokio_util` codec (behind `async` feature)

/// Re-export frame types.
pub mod frame {
    pub use sockfmt_frame::*;
}

/// Re-export the async codec (requires `async` feature).
#[cfg(feature = "async")]
pub mod codec {
    pub use sockfmt_frame::codec::*;
}
