//! Tidewater engine crate.
//!
//! CPU/GPU frame pipelining for a real-time scene with a live water surface:
//! a fence shared with the GPU timeline, a ring of per-frame upload slots,
//! per-value dirty tracking, and a height-field wave simulation streamed into
//! GPU memory every frame.

pub mod device;
pub mod logging;
pub mod render;
pub mod scene;
pub mod sim;
pub mod sync;
pub mod time;
