//! Uniform blocks shared by every shader program
//!
//! A block is a fixed-size byte region bound at a numbered slot of bind group 0.
//! Writes go to a CPU copy and widen a dirty range; [`UniformBlock::flush`]
//! uploads that range once per frame. Storage is padded to 16 bytes and the
//! dirty range is kept on [`wgpu::COPY_BUFFER_ALIGNMENT`] bounds, so any
//! in-bounds write can be uploaded as is.

use std::ops::Range;

use cgmath::Matrix4;

use crate::{
    error::{RenderError, Result},
    wgpu_utils::{binding_types, BindGroupLayoutBuilder, BindGroupLayoutWithDesc, UniformBuffer},
};

/// Size of a block's GPU storage
const BLOCK_ALIGNMENT: usize = 16;

pub struct UniformBlock {
    label: String,
    slot: u32,
    /// Requested size; writes past it are rejected
    size: usize,
    /// `size` rounded up to [`BLOCK_ALIGNMENT`]
    data: Vec<u8>,
    dirty: Option<Range<usize>>,
    gpu: Option<UniformBuffer>,
}

impl UniformBlock {
    fn new(label: &str, size: usize, slot: u32) -> Self {
        let padded = size.max(1).next_multiple_of(BLOCK_ALIGNMENT);
        Self {
            label: label.to_string(),
            slot,
            size,
            data: vec![0; padded],
            dirty: Some(0..padded),
            gpu: None,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn slot(&self) -> u32 {
        self.slot
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data[..self.size]
    }

    pub fn dirty_range(&self) -> Option<Range<usize>> {
        self.dirty.clone()
    }

    /// Copies `bytes` into the block at `offset`.
    ///
    /// Fails without touching the block when the write would run past its end.
    pub fn write(&mut self, offset: usize, bytes: &[u8]) -> Result<()> {
        let end = offset
            .checked_add(bytes.len())
            .filter(|end| *end <= self.size)
            .ok_or(RenderError::UniformOutOfBounds {
                offset,
                len: bytes.len(),
                size: self.size,
            })?;
        if bytes.is_empty() {
            return Ok(());
        }

        self.data[offset..end].copy_from_slice(bytes);
        let written = copy_aligned(offset..end, self.data.len());
        self.dirty = Some(match self.dirty.take() {
            Some(range) => range.start.min(written.start)..range.end.max(written.end),
            None => written,
        });
        Ok(())
    }

    pub fn write_pod<T: bytemuck::Pod>(&mut self, offset: usize, value: &T) -> Result<()> {
        self.write(offset, bytemuck::bytes_of(value))
    }

    /// Writes a column-major 4x4 matrix
    pub fn write_mat4(&mut self, offset: usize, matrix: &Matrix4<f32>) -> Result<()> {
        let columns: [[f32; 4]; 4] = (*matrix).into();
        self.write_pod(offset, &columns)
    }

    pub fn write_vec4(&mut self, offset: usize, value: [f32; 4]) -> Result<()> {
        self.write_pod(offset, &value)
    }

    /// Creates the GPU buffer backing this block; the whole block is uploaded on the next flush
    pub fn upload(&mut self, device: &wgpu::Device) {
        if self.gpu.is_none() {
            self.gpu = Some(UniformBuffer::new(device, &self.label, self.data.len() as u64));
            self.dirty = Some(0..self.data.len());
        }
    }

    /// Uploads the dirty byte range, if any
    pub fn flush(&mut self, queue: &wgpu::Queue) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };
        if let Some(range) = self.dirty.take() {
            gpu.update_range(queue, range.start, &self.data[range]);
        }
    }

    pub fn binding_resource(&self) -> Option<wgpu::BindingResource> {
        self.gpu.as_ref().map(UniformBuffer::binding_resource)
    }
}

/// Widens `range` outward to [`wgpu::COPY_BUFFER_ALIGNMENT`] bounds, capped at `limit`
fn copy_aligned(range: Range<usize>, limit: usize) -> Range<usize> {
    let align = wgpu::COPY_BUFFER_ALIGNMENT as usize;
    let start = range.start - range.start % align;
    let end = range.end.next_multiple_of(align).min(limit);
    start..end
}

/// Owns every uniform block and the slot each is bound at
#[derive(Default)]
pub struct UniformBlockManager {
    blocks: Vec<UniformBlock>,
}

impl UniformBlockManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves a zero-filled block of `size` bytes at `slot`
    pub fn allocate(&mut self, label: &str, size: usize, slot: u32) -> Result<&mut UniformBlock> {
        if self.blocks.iter().any(|block| block.slot == slot) {
            return Err(RenderError::BindingSlotInUse(slot));
        }

        log::debug!("uniform block '{label}' allocated at slot {slot} ({size} bytes)");
        let index = self.blocks.partition_point(|block| block.slot < slot);
        self.blocks.insert(index, UniformBlock::new(label, size, slot));
        Ok(&mut self.blocks[index])
    }

    pub fn block(&self, slot: u32) -> Option<&UniformBlock> {
        self.blocks.iter().find(|block| block.slot == slot)
    }

    pub fn block_mut(&mut self, slot: u32) -> Option<&mut UniformBlock> {
        self.blocks.iter_mut().find(|block| block.slot == slot)
    }

    /// Blocks ordered by slot
    pub fn iter(&self) -> impl Iterator<Item = &UniformBlock> {
        self.blocks.iter()
    }

    pub fn upload_all(&mut self, device: &wgpu::Device) {
        for block in &mut self.blocks {
            block.upload(device);
        }
    }

    pub fn flush_all(&mut self, queue: &wgpu::Queue) {
        for block in &mut self.blocks {
            block.flush(queue);
        }
    }

    /// Group 0 layout: one uniform buffer binding per block slot
    pub fn create_layout(&self, device: &wgpu::Device) -> BindGroupLayoutWithDesc {
        self.blocks
            .iter()
            .fold(BindGroupLayoutBuilder::new(), |builder, block| {
                builder.binding(
                    block.slot,
                    wgpu::ShaderStages::VERTEX_FRAGMENT,
                    binding_types::uniform(),
                )
            })
            .create(device, "Uniform Blocks")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::SquareMatrix;

    fn matrix(seed: f32) -> Matrix4<f32> {
        Matrix4::new(
            seed, 1.0, 2.0, 3.0, 4.0, seed, 6.0, 7.0, 8.0, 9.0, seed, 11.0, 12.0, 13.0, 14.0, seed,
        )
    }

    #[test]
    fn test_out_of_bounds_write_is_rejected() {
        let mut blocks = UniformBlockManager::new();
        let block = blocks.allocate("camera", 144, 0).unwrap();
        block.write_mat4(0, &Matrix4::identity()).unwrap();
        let before = block.bytes().to_vec();

        let result = block.write(100, &[1u8; 64]);
        assert!(matches!(
            result,
            Err(RenderError::UniformOutOfBounds {
                offset: 100,
                len: 64,
                size: 144
            })
        ));
        assert_eq!(block.bytes(), before.as_slice());

        assert!(block.write(usize::MAX, &[1]).is_err());
    }

    #[test]
    fn test_disjoint_writes_commute() {
        let mut manager = UniformBlockManager::new();
        manager.allocate("a", 144, 0).unwrap();
        manager.allocate("b", 144, 1).unwrap();

        let a = manager.block_mut(0).unwrap();
        a.write_mat4(0, &matrix(1.0)).unwrap();
        a.write_mat4(64, &matrix(2.0)).unwrap();

        let b = manager.block_mut(1).unwrap();
        b.write_mat4(64, &matrix(2.0)).unwrap();
        b.write_mat4(0, &matrix(1.0)).unwrap();

        assert_eq!(manager.block(0).unwrap().bytes(), manager.block(1).unwrap().bytes());
    }

    #[test]
    fn test_duplicate_slot_is_an_error() {
        let mut manager = UniformBlockManager::new();
        manager.allocate("camera", 144, 0).unwrap();
        assert!(matches!(
            manager.allocate("other", 16, 0),
            Err(RenderError::BindingSlotInUse(0))
        ));
        assert_eq!(manager.iter().count(), 1);
    }

    #[test]
    fn test_dirty_range_covers_all_writes() {
        let mut manager = UniformBlockManager::new();
        let block = manager.allocate("light", 80, 1).unwrap();
        block.dirty = None;

        block.write_vec4(16, [1.0; 4]).unwrap();
        block.write_pod(64, &0.5f32).unwrap();
        assert_eq!(block.dirty_range(), Some(16..68));
    }

    #[test]
    fn test_unaligned_write_marks_an_aligned_range() {
        let mut manager = UniformBlockManager::new();
        let block = manager.allocate("flags", 7, 2).unwrap();
        assert_eq!(block.size(), 7);
        assert_eq!(block.dirty_range(), Some(0..16));
        block.dirty = None;

        block.write(1, &[1, 2, 3]).unwrap();
        let range = block.dirty_range().unwrap();
        let align = wgpu::COPY_BUFFER_ALIGNMENT as usize;
        assert_eq!(range.start % align, 0);
        assert_eq!(range.end % align, 0);
        assert_eq!(range, 0..4);
        assert_eq!(block.bytes(), &[0, 1, 2, 3, 0, 0, 0]);

        block.write(5, &[9, 9]).unwrap();
        assert_eq!(block.dirty_range(), Some(0..8));
        assert!(block.write(6, &[1, 1]).is_err());
    }
}
