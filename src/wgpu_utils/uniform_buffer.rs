// src/wgpu_utils/uniform_buffer.rs
//! Raw byte uniform buffer shared by uniform blocks and the per-draw arena

/// GPU uniform buffer of a fixed byte size
///
/// Remembers the bytes it last uploaded so unchanged writes are skipped.
pub struct UniformBuffer {
    buffer: wgpu::Buffer,
    previous_content: Vec<u8>,
}

impl UniformBuffer {
    pub fn new(device: &wgpu::Device, label: &str, size: u64) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("UniformBuffer: {label}")),
            size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        log::trace!("allocated uniform buffer '{label}' ({size} bytes)");

        UniformBuffer {
            buffer,
            previous_content: vec![0; size as usize],
        }
    }

    /// Uploads `bytes` at `offset`, skipping the write when nothing changed
    ///
    /// Both `offset` and the length must be multiples of [`wgpu::COPY_BUFFER_ALIGNMENT`].
    pub fn update_range(&mut self, queue: &wgpu::Queue, offset: usize, bytes: &[u8]) {
        let end = offset + bytes.len();
        debug_assert!(end <= self.previous_content.len());
        debug_assert!(
            offset as u64 % wgpu::COPY_BUFFER_ALIGNMENT == 0
                && bytes.len() as u64 % wgpu::COPY_BUFFER_ALIGNMENT == 0,
            "unaligned upload {offset}..{end}"
        );
        if self.previous_content[offset..end] == *bytes {
            return;
        }
        queue.write_buffer(&self.buffer, offset as wgpu::BufferAddress, bytes);
        self.previous_content[offset..end].copy_from_slice(bytes);
    }

    /// Uploads `bytes` at `offset` unconditionally
    pub fn force_update_range(&mut self, queue: &wgpu::Queue, offset: usize, bytes: &[u8]) {
        queue.write_buffer(&self.buffer, offset as wgpu::BufferAddress, bytes);
        self.previous_content[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    pub fn binding_resource(&self) -> wgpu::BindingResource {
        self.buffer.as_entire_binding()
    }

    /// Binding of a `size`-byte window, used with dynamic offsets
    pub fn binding_window(&self, size: u64) -> wgpu::BindingResource {
        wgpu::BindingResource::Buffer(wgpu::BufferBinding {
            buffer: &self.buffer,
            offset: 0,
            size: wgpu::BufferSize::new(size),
        })
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    pub fn size(&self) -> u64 {
        self.buffer.size()
    }
}

impl Drop for UniformBuffer {
    fn drop(&mut self) {
        self.buffer.destroy();
    }
}
