use bytemuck::Pod;

use crate::sync::{RingError, UploadBuffer};

/// Number of ring slots that still hold a stale copy of a value.
///
/// Every slot is a physically separate buffer, so a change is only fully
/// visible to the GPU after it has been copied into each of them. Any change
/// therefore resets the counter to the ring depth, never to 1.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DirtyCounter {
    frames_dirty: u32,
    ring_depth: u32,
}

impl DirtyCounter {
    /// Creates a counter for a value no slot has seen yet.
    pub fn new(ring_depth: usize) -> Self {
        let ring_depth = ring_depth as u32;
        Self {
            frames_dirty: ring_depth,
            ring_depth,
        }
    }

    #[inline]
    pub fn frames_dirty(&self) -> u32 {
        self.frames_dirty
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.frames_dirty > 0
    }

    #[inline]
    pub fn mark_changed(&mut self) {
        self.frames_dirty = self.ring_depth;
    }

    /// Records one slot copy. Returns false if nothing was pending.
    #[inline]
    pub fn consume(&mut self) -> bool {
        if self.frames_dirty == 0 {
            return false;
        }
        self.frames_dirty -= 1;
        true
    }
}

/// Converts a CPU-side value into the block the GPU reads.
pub trait GpuConstants {
    type Constants: Pod;

    fn gpu_constants(&self) -> Self::Constants;
}

/// A GPU-bound value paired with its [`DirtyCounter`].
///
/// All mutation goes through this wrapper so a change can never skip the
/// reset. Only the latest value is ever propagated.
#[derive(Debug, Clone)]
pub struct Tracked<T> {
    value: T,
    dirty: DirtyCounter,
}

impl<T> Tracked<T> {
    pub fn new(value: T, ring_depth: usize) -> Self {
        Self {
            value,
            dirty: DirtyCounter::new(ring_depth),
        }
    }

    #[inline]
    pub fn get(&self) -> &T {
        &self.value
    }

    #[inline]
    pub fn counter(&self) -> DirtyCounter {
        self.dirty
    }

    pub fn set(&mut self, value: T) {
        self.value = value;
        self.dirty.mark_changed();
    }

    pub fn update<R>(&mut self, f: impl FnOnce(&mut T) -> R) -> R {
        let r = f(&mut self.value);
        self.dirty.mark_changed();
        r
    }

    /// Flags the value for re-upload without changing it.
    pub fn mark_changed(&mut self) {
        self.dirty.mark_changed();
    }
}

/// Copies `entity` into `region[index]` if any slot still holds a stale copy.
///
/// Returns whether a write happened. A clean entity leaves both the region and
/// its counter untouched.
pub fn propagate_if_dirty<T: GpuConstants>(
    entity: &mut Tracked<T>,
    index: usize,
    region: &mut UploadBuffer<T::Constants>,
) -> Result<bool, RingError> {
    if !entity.dirty.is_dirty() {
        return Ok(false);
    }
    region.write(index, &entity.value.gpu_constants())?;
    entity.dirty.consume();
    Ok(true)
}
