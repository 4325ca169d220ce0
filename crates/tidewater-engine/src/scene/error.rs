use super::{MaterialId, ObjectId};

/// Scene registration failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    #[error("scene already holds the maximum of {capacity} {kind}")]
    CapacityExceeded { kind: &'static str, capacity: usize },

    #[error("unknown material {0:?}")]
    UnknownMaterial(MaterialId),

    #[error("material name {0:?} is already registered")]
    DuplicateMaterial(String),

    #[error("unknown scene object {0:?}")]
    UnknownObject(ObjectId),
}
