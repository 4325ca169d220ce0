use crate::device::DeviceError;
use crate::scene::SceneError;
use crate::sim::SimError;
use crate::sync::RingError;

/// Anything that can abort a renderer tick or its construction.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RenderError {
    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error(transparent)]
    Ring(#[from] RingError),

    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error(transparent)]
    Sim(#[from] SimError),

    #[error("renderer configuration mismatch: {0}")]
    Config(String),
}
