use crate::device::DeviceError;
use crate::scene::DrawList;
use crate::sync::{FenceSignal, FrameResourceSlot, SyncFence};

/// The device/queue side of a frame: uploads a slot, records its draws and
/// submits them.
///
/// Implementations must arrange for `signal.signal(fence_value)` to run once
/// the GPU has finished every command of the submission, and must never
/// signal before that. Recording must not block on earlier submissions.
pub trait FrameBackend {
    /// Called once by the renderer before the first submission so the backend
    /// can install a driver and a device-lost hook on the fence.
    fn bind_fence(&mut self, _fence: &mut SyncFence) {}

    /// Receives the fixed triangle-list indices of the wave grid.
    fn upload_wave_indices(&mut self, _indices: &[u32]) -> Result<(), DeviceError> {
        Ok(())
    }

    /// Submits one tick. On error nothing was submitted and the fence value
    /// must not be signalled.
    fn submit_frame(
        &mut self,
        slot: &mut FrameResourceSlot,
        draws: &DrawList,
        signal: &FenceSignal,
        fence_value: u64,
    ) -> Result<(), DeviceError>;
}

impl<B: FrameBackend + ?Sized> FrameBackend for Box<B> {
    fn bind_fence(&mut self, fence: &mut SyncFence) {
        (**self).bind_fence(fence)
    }

    fn upload_wave_indices(&mut self, indices: &[u32]) -> Result<(), DeviceError> {
        (**self).upload_wave_indices(indices)
    }

    fn submit_frame(
        &mut self,
        slot: &mut FrameResourceSlot,
        draws: &DrawList,
        signal: &FenceSignal,
        fence_value: u64,
    ) -> Result<(), DeviceError> {
        (**self).submit_frame(slot, draws, signal, fence_value)
    }
}
