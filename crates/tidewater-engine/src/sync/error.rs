/// Misuse of the frame resource ring or one of its staging regions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RingError {
    #[error("frame resource ring depth must be at least 1, got {0}")]
    InvalidDepth(usize),

    #[error("invalid slot capacity: {0}")]
    InvalidCapacity(&'static str),

    #[error("{region} index {index} out of range (capacity {len})")]
    IndexOutOfRange {
        region: &'static str,
        index: usize,
        len: usize,
    },
}
