use crate::device::DeviceError;
use crate::render::{MaterialConstants, ObjectConstants, PassConstants, Vertex};

use super::upload::{ElementLayout, UploadBuffer};
use super::{RingError, SyncFence};

/// Ring depth used when the caller does not choose one.
///
/// Three slots let the CPU prepare frame k+1 while the GPU drains frame k and
/// the display still holds frame k-1.
pub const DEFAULT_RING_DEPTH: usize = 3;

/// Element counts reserved in every slot. Fixed for the lifetime of the ring.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SlotCapacity {
    pub max_objects: usize,
    pub max_materials: usize,
    pub max_vertices: usize,
}

/// Where a slot sits relative to the GPU timeline.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SlotState {
    /// Never submitted, or the GPU has finished with it.
    Idle,
    /// The GPU may still be reading the slot's buffers.
    Submitted,
}

/// One frame's worth of CPU-writable, GPU-readable memory.
#[derive(Debug)]
pub struct FrameResourceSlot {
    index: usize,
    pending_fence: u64,
    pub objects: UploadBuffer<ObjectConstants>,
    pub materials: UploadBuffer<MaterialConstants>,
    pub pass: UploadBuffer<PassConstants>,
    pub vertices: UploadBuffer<Vertex>,
}

impl FrameResourceSlot {
    fn new(index: usize, capacity: SlotCapacity) -> Self {
        Self {
            index,
            pending_fence: 0,
            objects: UploadBuffer::new("objects", capacity.max_objects, ElementLayout::ConstantBlock),
            materials: UploadBuffer::new(
                "materials",
                capacity.max_materials,
                ElementLayout::ConstantBlock,
            ),
            pass: UploadBuffer::new("pass", 1, ElementLayout::ConstantBlock),
            vertices: UploadBuffer::new("vertices", capacity.max_vertices, ElementLayout::Packed),
        }
    }

    /// Position of this slot in the ring.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Fence value of the last submission that read this slot (0 = never).
    #[inline]
    pub fn pending_fence(&self) -> u64 {
        self.pending_fence
    }

    pub fn state(&self, completed: u64) -> SlotState {
        if self.pending_fence != 0 && completed < self.pending_fence {
            SlotState::Submitted
        } else {
            SlotState::Idle
        }
    }
}

/// Fixed-size round-robin collection of frame resource slots.
///
/// Handing out a slot for writing is the only place the CPU blocks on the GPU:
/// [`advance`](Self::advance) waits until the slot's previous submission has
/// completed, which bounds GPU lag to `depth - 1` frames.
#[derive(Debug)]
pub struct FrameResourceRing {
    slots: Vec<FrameResourceSlot>,
    cursor: usize,
    capacity: SlotCapacity,
    last_submitted: u64,
    waits: u64,
}

impl FrameResourceRing {
    pub fn new(depth: usize, capacity: SlotCapacity) -> Result<Self, RingError> {
        if depth == 0 {
            return Err(RingError::InvalidDepth(depth));
        }
        if capacity.max_materials == 0 && capacity.max_objects > 0 {
            return Err(RingError::InvalidCapacity("objects need at least one material slot"));
        }
        if depth == 1 {
            log::warn!("frame resource ring depth 1: CPU and GPU will run fully serialized");
        }

        let slots = (0..depth).map(|i| FrameResourceSlot::new(i, capacity)).collect();
        log::info!(
            "allocated {depth} frame resource slots ({} objects, {} materials, {} vertices each)",
            capacity.max_objects,
            capacity.max_materials,
            capacity.max_vertices,
        );

        Ok(Self {
            slots,
            // First advance lands on slot 0.
            cursor: depth - 1,
            capacity,
            last_submitted: 0,
            waits: 0,
        })
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn capacity(&self) -> SlotCapacity {
        self.capacity
    }

    #[inline]
    pub fn active_index(&self) -> usize {
        self.cursor
    }

    #[inline]
    pub fn slots(&self) -> &[FrameResourceSlot] {
        &self.slots
    }

    /// Number of times [`advance`](Self::advance) had to block.
    #[inline]
    pub fn wait_count(&self) -> u64 {
        self.waits
    }

    /// Read access to the slot selected by the last advance.
    #[inline]
    pub fn active_slot(&self) -> &FrameResourceSlot {
        &self.slots[self.cursor]
    }

    /// Write access to the slot selected by the last advance.
    ///
    /// Only valid between [`advance`](Self::advance) and
    /// [`mark_submitted`](Self::mark_submitted) of the same tick.
    #[inline]
    pub fn active_slot_mut(&mut self) -> &mut FrameResourceSlot {
        &mut self.slots[self.cursor]
    }

    /// Moves to the next slot, blocking until the GPU has released it.
    pub fn advance(&mut self, fence: &SyncFence) -> Result<&mut FrameResourceSlot, DeviceError> {
        self.cursor = (self.cursor + 1) % self.slots.len();
        let pending = self.slots[self.cursor].pending_fence;

        if pending != 0 && fence.completed_value() < pending {
            log::debug!(
                "slot {} still in flight (fence {pending}, completed {}); waiting",
                self.cursor,
                fence.completed_value()
            );
            self.waits += 1;
            fence.wait_until(pending)?;
        }

        Ok(&mut self.slots[self.cursor])
    }

    /// Records the fence value the active slot's submission will signal.
    pub fn mark_submitted(&mut self, fence_value: u64) {
        debug_assert!(
            fence_value > self.last_submitted,
            "fence values must increase: {fence_value} after {}",
            self.last_submitted
        );
        self.last_submitted = fence_value;
        self.slots[self.cursor].pending_fence = fence_value;
    }

    /// Number of slots the GPU may still be reading.
    pub fn in_flight(&self, fence: &SyncFence) -> usize {
        let completed = fence.completed_value();
        self.slots
            .iter()
            .filter(|s| s.state(completed) == SlotState::Submitted)
            .count()
    }

    /// Blocks until no slot is referenced by unfinished GPU work.
    pub fn wait_idle(&self, fence: &SyncFence) -> Result<(), DeviceError> {
        let newest = self.slots.iter().map(|s| s.pending_fence).max().unwrap_or(0);
        fence.wait_until(newest)
    }
}
