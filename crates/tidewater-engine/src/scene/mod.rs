//! Scene store and per-slot dirty propagation.
//!
//! Responsibilities:
//! - own the objects and materials that feed GPU constant blocks
//! - track, per value, how many ring slots still hold a stale copy
//! - keep a layer-ordered draw list for the backend

mod dirty;
mod draw;
mod error;
mod material;
mod object;
mod store;

pub use dirty::{propagate_if_dirty, DirtyCounter, GpuConstants, Tracked};
pub use draw::{DrawItem, DrawList, SortKey};
pub use error::SceneError;
pub use material::Material;
pub use object::{Geometry, MeshId, RenderLayer, SceneObject};
pub use store::{MaterialId, ObjectId, Propagation, Scene};
