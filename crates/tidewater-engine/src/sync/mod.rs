//! CPU/GPU frame pipelining.
//!
//! This module is responsible for:
//! - the fence shared between the submission thread and the GPU timeline
//! - the ring of per-frame upload slots and its wait-before-reuse contract
//! - staging buffers that remember which bytes were written since the last upload

mod error;
mod fence;
mod ring;
mod upload;

pub use error::RingError;
pub use fence::{FenceDriver, FenceSignal, SyncFence};
pub use ring::{FrameResourceRing, FrameResourceSlot, SlotCapacity, SlotState, DEFAULT_RING_DEPTH};
pub use upload::{constant_block_size, ElementLayout, UploadBuffer, CONSTANT_BLOCK_ALIGNMENT};
