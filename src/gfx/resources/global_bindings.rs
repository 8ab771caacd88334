//! Global uniform bindings for camera and light data
//!
//! Manages the two uniform blocks every shader program reads through bind
//! group 0: the camera block at binding 0 and the light block at binding 1.
//! They are written once per frame, so individual draws never touch them.

use cgmath::{Matrix4, Point3};

use crate::{
    error::Result,
    gfx::{
        resources::uniform_block::UniformBlockManager,
        scene::light::PointLight,
    },
    wgpu_utils::{BindGroupBuilder, BindGroupLayoutWithDesc},
};

pub const CAMERA_SLOT: u32 = 0;
pub const LIGHT_SLOT: u32 = 1;

/// Camera block content
///
/// MUST match the `Camera` struct in the shaders exactly.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraBlock {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub view_position: [f32; 4],
}
// 64 + 64 + 16 = 144 bytes

impl CameraBlock {
    pub const SIZE: usize = std::mem::size_of::<Self>();

    pub fn new(view: Matrix4<f32>, projection: Matrix4<f32>, position: Point3<f32>) -> Self {
        Self {
            view: view.into(),
            projection: projection.into(),
            view_position: [position.x, position.y, position.z, 1.0],
        }
    }
}

/// Light block content
///
/// MUST match the `Light` struct in the shaders exactly.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightBlock {
    pub position: [f32; 4],
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
    _padding: f32,
}
// 4 * 16 + 4 * 4 = 80 bytes

impl LightBlock {
    pub const SIZE: usize = std::mem::size_of::<Self>();
}

impl From<&PointLight> for LightBlock {
    fn from(light: &PointLight) -> Self {
        let rgb = |c: [f32; 3]| [c[0], c[1], c[2], 0.0];
        Self {
            position: [light.position[0], light.position[1], light.position[2], 1.0],
            ambient: rgb(light.ambient),
            diffuse: rgb(light.diffuse),
            specular: rgb(light.specular),
            constant: light.constant,
            linear: light.linear,
            quadratic: light.quadratic,
            _padding: 0.0,
        }
    }
}

/// CPU side of the camera and light blocks
pub struct GlobalUniforms {
    blocks: UniformBlockManager,
}

impl GlobalUniforms {
    pub fn new() -> Result<Self> {
        let mut blocks = UniformBlockManager::new();
        blocks.allocate("Camera", CameraBlock::SIZE, CAMERA_SLOT)?;
        blocks.allocate("Light", LightBlock::SIZE, LIGHT_SLOT)?;
        Ok(Self { blocks })
    }

    pub fn write_camera(&mut self, camera: &CameraBlock) -> Result<()> {
        self.write(CAMERA_SLOT, bytemuck::bytes_of(camera))
    }

    pub fn write_light(&mut self, light: &PointLight) -> Result<()> {
        self.write(LIGHT_SLOT, bytemuck::bytes_of(&LightBlock::from(light)))
    }

    fn write(&mut self, slot: u32, bytes: &[u8]) -> Result<()> {
        match self.blocks.block_mut(slot) {
            Some(block) => block.write(0, bytes),
            None => Ok(()),
        }
    }

    pub fn blocks(&self) -> &UniformBlockManager {
        &self.blocks
    }

    pub fn flush(&mut self, queue: &wgpu::Queue) {
        self.blocks.flush_all(queue);
    }
}

/// Bind group 0, shared by every render pipeline
pub struct GlobalBindings {
    bind_group_layout: BindGroupLayoutWithDesc,
    bind_group: wgpu::BindGroup,
}

impl GlobalBindings {
    /// Uploads the blocks and creates the layout and bind group for them
    pub fn new(device: &wgpu::Device, uniforms: &mut GlobalUniforms) -> Self {
        uniforms.blocks.upload_all(device);
        let bind_group_layout = uniforms.blocks.create_layout(device);

        let bind_group = uniforms
            .blocks
            .iter()
            .filter_map(|block| block.binding_resource())
            .fold(BindGroupBuilder::new(&bind_group_layout), |builder, resource| {
                builder.resource(resource)
            })
            .create(device, "Global Bind Group");

        GlobalBindings {
            bind_group_layout,
            bind_group,
        }
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::SquareMatrix;

    #[test]
    fn test_block_sizes() {
        assert_eq!(CameraBlock::SIZE, 144);
        assert_eq!(LightBlock::SIZE, 80);
        assert_eq!(std::mem::offset_of!(CameraBlock, projection), 64);
        assert_eq!(std::mem::offset_of!(CameraBlock, view_position), 128);
        assert_eq!(std::mem::offset_of!(LightBlock, constant), 64);
    }

    #[test]
    fn test_camera_write_lands_at_fixed_offsets() {
        let mut uniforms = GlobalUniforms::new().unwrap();
        let projection = Matrix4::from_scale(2.0);
        uniforms
            .write_camera(&CameraBlock::new(
                Matrix4::identity(),
                projection,
                Point3::new(1.0, 2.0, 3.0),
            ))
            .unwrap();

        let bytes = uniforms.blocks().block(CAMERA_SLOT).unwrap().bytes();
        let floats: Vec<f32> = bytes
            .chunks_exact(4)
            .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        assert_eq!(floats[0], 1.0);
        assert_eq!(floats[16], 2.0);
        assert_eq!(&floats[32..36], &[1.0, 2.0, 3.0, 1.0]);
    }

    #[test]
    fn test_light_block_from_point_light() {
        let block = LightBlock::from(&PointLight::default());
        assert_eq!(block.position, [1.2, 1.0, 2.0, 1.0]);
        assert_eq!(block.linear, 0.09);
        assert_eq!(block.quadratic, 0.032);
    }
}
