//! Per-draw uniform storage
//!
//! Every draw command carries its own copy of the program's uniforms. They
//! are packed into one buffer per frame at aligned offsets and bound through
//! bind group 1 with a dynamic offset, so a pass issues no buffer writes
//! between draws.

use crate::{
    gfx::rendering::recorder::RecordedPass,
    wgpu_utils::{binding_types, BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc, UniformBuffer},
};

/// Bytes visible to a draw; every program's uniform struct fits in it
pub const DRAW_UNIFORM_WINDOW: u64 = 256;

/// All draw uniforms of a frame and where each command's copy starts
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackedUniforms {
    pub bytes: Vec<u8>,
    /// `offsets[pass][command]`
    pub offsets: Vec<Vec<u32>>,
}

/// Distance between consecutive entries for a device alignment
pub fn entry_stride(alignment: u64) -> u64 {
    DRAW_UNIFORM_WINDOW.next_multiple_of(alignment.max(1))
}

pub fn pack_draw_uniforms(passes: &[RecordedPass], alignment: u64) -> PackedUniforms {
    let stride = entry_stride(alignment) as usize;
    let mut packed = PackedUniforms::default();

    for pass in passes {
        let mut offsets = Vec::with_capacity(pass.commands.len());
        for command in &pass.commands {
            let offset = packed.bytes.len();
            debug_assert!(command.uniforms.len() <= DRAW_UNIFORM_WINDOW as usize);
            packed.bytes.extend_from_slice(&command.uniforms);
            packed.bytes.resize(offset + stride, 0);
            offsets.push(offset as u32);
        }
        packed.offsets.push(offsets);
    }
    packed
}

/// Growable GPU side of [`PackedUniforms`]
pub struct DrawUniformArena {
    buffer: UniformBuffer,
    layout: BindGroupLayoutWithDesc,
    bind_group: wgpu::BindGroup,
    alignment: u64,
}

impl DrawUniformArena {
    const INITIAL_ENTRIES: u64 = 64;

    pub fn new(device: &wgpu::Device) -> Self {
        let alignment = device.limits().min_uniform_buffer_offset_alignment as u64;
        let layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform_dynamic(DRAW_UNIFORM_WINDOW))
            .create(device, "Draw Uniforms Layout");

        let buffer = UniformBuffer::new(
            device,
            "Draw Uniforms",
            entry_stride(alignment) * Self::INITIAL_ENTRIES,
        );
        let bind_group = Self::create_bind_group(device, &layout, &buffer);

        Self {
            buffer,
            layout,
            bind_group,
            alignment,
        }
    }

    fn create_bind_group(
        device: &wgpu::Device,
        layout: &BindGroupLayoutWithDesc,
        buffer: &UniformBuffer,
    ) -> wgpu::BindGroup {
        BindGroupBuilder::new(layout)
            .resource(buffer.binding_window(DRAW_UNIFORM_WINDOW))
            .create(device, "Draw Uniforms Bind Group")
    }

    pub fn alignment(&self) -> u64 {
        self.alignment
    }

    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout.layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    /// Uploads a frame's uniforms, growing the buffer when they do not fit
    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, packed: &PackedUniforms) {
        if packed.bytes.is_empty() {
            return;
        }

        let needed = packed.bytes.len() as u64;
        if needed > self.buffer.size() {
            let size = needed.next_power_of_two();
            log::debug!("growing draw uniform buffer to {size} bytes");
            self.buffer = UniformBuffer::new(device, "Draw Uniforms", size);
            self.bind_group = Self::create_bind_group(device, &self.layout, &self.buffer);
        }
        self.buffer.force_update_range(queue, 0, &packed.bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{
        geometry::textured_cube,
        rendering::recorder::{ClearOps, PassKind, PassRecorder, Viewport},
        scene::drawable::Drawable,
        shader::program::{ProgramKind, ShaderProgram},
    };
    use std::rc::Rc;

    #[test]
    fn test_entries_are_aligned_and_hold_their_bytes() {
        let mut program = ShaderProgram::new(ProgramKind::Outline).unwrap();
        let cube = Rc::new(Drawable::new("cube", &textured_cube()));
        let mut recorder = PassRecorder::new(PassKind::Outline, Viewport::full(1, 1), ClearOps::load());
        for width in [0.1, 0.2, 0.3] {
            program.set_float("outline_width", width);
            cube.draw(&program, &mut recorder);
        }
        let empty = PassRecorder::new(PassKind::Skybox, Viewport::full(1, 1), ClearOps::load());
        let passes = [recorder.finish(), empty.finish()];

        let packed = pack_draw_uniforms(&passes, 256);
        assert_eq!(packed.offsets, vec![vec![0, 256, 512], vec![]]);
        assert_eq!(packed.bytes.len(), 768);

        let width_offset = program.uniform_layout().offset_of("outline_width").unwrap();
        let at = 256 + width_offset;
        assert_eq!(&packed.bytes[at..at + 4], &0.2f32.to_ne_bytes());
    }

    #[test]
    fn test_stride_follows_device_alignment() {
        assert_eq!(entry_stride(64), 256);
        assert_eq!(entry_stride(256), 256);
        assert_eq!(entry_stride(512), 512);
    }
}
