//! wgpu implementation of [`FrameBackend`](crate::render::FrameBackend).
//!
//! This module is responsible for:
//! - per-slot GPU buffers and bind groups (dynamic offsets per object/material)
//! - static meshes and the fixed wave index buffer
//! - one pipeline per render layer, drawn into an offscreen target
//! - tying queue submissions to fence values

mod backend;
mod fence_driver;
mod pipeline;
mod target;

pub use backend::WgpuBackend;
pub use fence_driver::WgpuFenceDriver;
pub use target::{OffscreenTarget, TargetConfig};
