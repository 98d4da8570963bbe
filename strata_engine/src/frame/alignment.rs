/// Dynamic uniform block layout
///
/// Every transform block of a scene lives in one buffer at
/// `offset = stride * position`, where `stride` is the block size padded to
/// the device's minimum uniform buffer offset alignment. The layout is
/// planned once per device; a different alignment invalidates every packed
/// buffer.

use crate::error::{Error, Result};

/// Round `size` up to a multiple of `alignment` (a power of two)
pub fn pad_to_alignment(size: u64, alignment: u64) -> u64 {
    (size + alignment - 1) & !(alignment - 1)
}

/// Stride and capacity of a dynamic uniform buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DynamicBlockLayout {
    alignment: u64,
    block_size: u64,
    stride: u64,
    capacity: usize,
}

impl DynamicBlockLayout {
    /// Plan the layout for `capacity` blocks of `block_size` bytes
    ///
    /// # Errors
    ///
    /// `AlignmentMisconfigured` if `alignment` is zero or not a power of two,
    /// `InvalidResource` if `block_size` or `capacity` is zero.
    pub fn plan(alignment: u64, block_size: u64, capacity: usize) -> Result<Self> {
        if alignment == 0 || !alignment.is_power_of_two() {
            return Err(Error::AlignmentMisconfigured(format!(
                "minimum uniform buffer offset alignment {} is not a power of two",
                alignment
            )));
        }
        if block_size == 0 {
            return Err(Error::InvalidResource("dynamic block size is zero".to_string()));
        }
        if capacity == 0 {
            return Err(Error::InvalidResource("dynamic block capacity is zero".to_string()));
        }
        Ok(Self {
            alignment,
            block_size,
            stride: pad_to_alignment(block_size, alignment),
            capacity,
        })
    }

    pub fn alignment(&self) -> u64 {
        self.alignment
    }

    pub fn block_size(&self) -> u64 {
        self.block_size
    }

    /// Padded size of one block
    pub fn stride(&self) -> u64 {
        self.stride
    }

    /// Maximum number of blocks
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Size of the backing buffer (`stride * capacity`)
    pub fn buffer_size(&self) -> u64 {
        self.stride * self.capacity as u64
    }

    /// Byte offset of the block at `position`
    ///
    /// # Errors
    ///
    /// `CapacityExceeded` if `position >= capacity`, `OffsetOutOfBounds` if
    /// the block would end past the buffer.
    pub fn offset_of(&self, position: usize) -> Result<u64> {
        if position >= self.capacity {
            return Err(Error::CapacityExceeded { position, capacity: self.capacity });
        }
        let offset = self.stride * position as u64;
        if offset + self.block_size > self.buffer_size() {
            return Err(Error::OffsetOutOfBounds {
                offset,
                size: self.block_size,
                buffer_size: self.buffer_size(),
            });
        }
        Ok(offset)
    }

    /// Offset as passed to a dynamic descriptor bind
    pub fn dynamic_offset(&self, position: usize) -> Result<u32> {
        let offset = self.offset_of(position)?;
        u32::try_from(offset).map_err(|_| Error::OffsetOutOfBounds {
            offset,
            size: self.block_size,
            buffer_size: u32::MAX as u64,
        })
    }
}

#[cfg(test)]
#[path = "alignment_tests.rs"]
mod tests;
