/// Largest payload any wire format can declare: `i32::MAX` bytes.
pub const MAX_MESSAGE_SIZE: usize = i32::MAX as usize;

/// Default number of idle payload buffers a parser keeps.
pub const DEFAULT_POOL_SIZE: usize = 4;

/// Default largest buffer capacity a pool keeps after use: 1 MiB.
pub const DEFAULT_MAX_RETAINED_CAPACITY: usize = 1024 * 1024;

/// Configuration shared by the parsers and stream adapters.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum declared payload length in bytes. Values above
    /// [`MAX_MESSAGE_SIZE`] are clamped. Default: [`MAX_MESSAGE_SIZE`].
    pub max_message_size: usize,
    /// Idle payload buffers kept for reuse. Default: 4.
    pub pool_size: usize,
    /// Buffers larger than this are released instead of pooled. Default: 1 MiB.
    pub max_retained_capacity: usize,
}

impl FrameConfig {
    pub(crate) fn message_cap(&self) -> usize {
        self.max_message_size.min(MAX_MESSAGE_SIZE)
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_message_size: MAX_MESSAGE_SIZE,
            pool_size: DEFAULT_POOL_SIZE,
            max_retained_capacity: DEFAULT_MAX_RETAINED_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cap_never_exceeds_wire_limit() {
        let cfg = FrameConfig {
            max_message_size: usize::MAX,
            ..FrameConfig::default()
        };
        assert_eq!(cfg.message_cap(), MAX_MESSAGE_SIZE);

        let cfg = FrameConfig {
            max_message_size: 16,
            ..FrameConfig::default()
        };
        assert_eq!(cfg.message_cap(), 16);
    }
}
