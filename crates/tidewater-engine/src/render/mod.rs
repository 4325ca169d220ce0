//! GPU rendering subsystem.
//!
//! [`SceneRenderer`] runs the per-frame pipeline against any [`FrameBackend`];
//! [`WgpuBackend`] is the wgpu implementation.
//!
//! Convention:
//! - matrices are column-major, vectors are multiplied on the right
//! - constant blocks are padded to 256 bytes and bound with dynamic offsets

mod backend;
mod error;
mod gpu_backend;
mod layout;
mod renderer;

pub use backend::FrameBackend;
pub use error::RenderError;
pub use gpu_backend::{OffscreenTarget, TargetConfig, WgpuBackend, WgpuFenceDriver};
pub use layout::{
    Light, MaterialConstants, ObjectConstants, PassConstants, PassInputs, Vertex, MAX_LIGHTS,
};
pub use renderer::{fill_wave_vertices, FrameStats, RendererConfig, SceneRenderer};
