use std::marker::PhantomData;
use std::ops::Range;

use bytemuck::Pod;

use super::RingError;

/// Byte alignment required between constant blocks bound with a dynamic offset.
pub const CONSTANT_BLOCK_ALIGNMENT: usize = 256;

/// Rounds `size` up to the next multiple of [`CONSTANT_BLOCK_ALIGNMENT`].
#[inline]
pub const fn constant_block_size(size: usize) -> usize {
    (size + CONSTANT_BLOCK_ALIGNMENT - 1) & !(CONSTANT_BLOCK_ALIGNMENT - 1)
}

/// Layout of the elements inside an [`UploadBuffer`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ElementLayout {
    /// Elements are tightly packed (vertex data).
    Packed,
    /// Each element starts on a 256-byte boundary (constant blocks).
    ConstantBlock,
}

/// CPU-writable staging region for one kind of per-frame GPU data.
///
/// The buffer mirrors a GPU buffer owned by the backend. Writes record the
/// touched byte range so the backend uploads only what changed since the last
/// upload. The element count is fixed at construction.
#[derive(Debug, Clone)]
pub struct UploadBuffer<T: Pod> {
    label: &'static str,
    bytes: Vec<u8>,
    stride: usize,
    len: usize,
    dirty: Option<Range<usize>>,
    writes: u64,
    _marker: PhantomData<T>,
}

impl<T: Pod> UploadBuffer<T> {
    pub fn new(label: &'static str, len: usize, layout: ElementLayout) -> Self {
        let size = std::mem::size_of::<T>();
        let stride = match layout {
            ElementLayout::Packed => size,
            ElementLayout::ConstantBlock => constant_block_size(size),
        };
        Self {
            label,
            bytes: vec![0; stride * len],
            stride,
            len,
            dirty: None,
            writes: 0,
            _marker: PhantomData,
        }
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Distance in bytes between consecutive elements.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Total size in bytes.
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    /// Byte offset of element `index`.
    #[inline]
    pub fn offset_of(&self, index: usize) -> usize {
        index * self.stride
    }

    /// Number of element writes performed over the buffer's lifetime.
    #[inline]
    pub fn write_count(&self) -> u64 {
        self.writes
    }

    /// Copies `value` into element `index`.
    pub fn write(&mut self, index: usize, value: &T) -> Result<(), RingError> {
        self.check(index)?;
        let start = self.offset_of(index);
        let src = bytemuck::bytes_of(value);
        self.bytes[start..start + src.len()].copy_from_slice(src);
        self.touch(start..start + self.stride);
        self.writes += 1;
        Ok(())
    }

    /// Copies `values` into consecutive elements starting at `first`.
    pub fn write_slice(&mut self, first: usize, values: &[T]) -> Result<(), RingError> {
        if values.is_empty() {
            return Ok(());
        }
        self.check(first + values.len() - 1)?;
        if self.stride == std::mem::size_of::<T>() {
            let start = self.offset_of(first);
            let src: &[u8] = bytemuck::cast_slice(values);
            self.bytes[start..start + src.len()].copy_from_slice(src);
            self.touch(start..start + src.len());
            self.writes += values.len() as u64;
            return Ok(());
        }
        for (i, value) in values.iter().enumerate() {
            self.write(first + i, value)?;
        }
        Ok(())
    }

    /// Reads element `index` back from the staging bytes.
    pub fn read(&self, index: usize) -> Result<T, RingError> {
        self.check(index)?;
        let start = self.offset_of(index);
        Ok(bytemuck::pod_read_unaligned(
            &self.bytes[start..start + std::mem::size_of::<T>()],
        ))
    }

    /// All staging bytes, including padding between constant blocks.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Byte range written since the last [`take_dirty`](Self::take_dirty).
    #[inline]
    pub fn dirty_range(&self) -> Option<Range<usize>> {
        self.dirty.clone()
    }

    /// Returns and clears the byte range written since the previous call.
    pub fn take_dirty(&mut self) -> Option<Range<usize>> {
        self.dirty.take()
    }

    fn touch(&mut self, range: Range<usize>) {
        self.dirty = Some(match self.dirty.take() {
            None => range,
            Some(prev) => prev.start.min(range.start)..prev.end.max(range.end),
        });
    }

    fn check(&self, index: usize) -> Result<(), RingError> {
        if index < self.len {
            Ok(())
        } else {
            Err(RingError::IndexOutOfRange {
                region: self.label,
                index,
                len: self.len,
            })
        }
    }
}
