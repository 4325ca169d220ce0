/// Device-fatal failure reported by the GPU timeline.
///
/// None of these are retried. A lost device poisons every pending and future
/// fence wait; the caller is expected to tear the renderer down.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    /// The device was lost (driver reset, removal, or an explicit destroy).
    #[error("gpu device lost: {0}")]
    Lost(String),

    /// The queue refused the recorded command sequence for this tick.
    #[error("gpu submission rejected: {0}")]
    SubmissionRejected(String),
}
