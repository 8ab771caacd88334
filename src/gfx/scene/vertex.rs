//! # Vertex Data Structures
//!
//! GPU vertex formats. Each struct is `#[repr(C)]` and its [`desc`] layout
//! must match the `@location` inputs of every shader that consumes it:
//! reordering a field invalidates those shaders.
//!
//! [`desc`]: Vertex::desc

use std::mem;

/// A mesh vertex with position, normal and texture coordinates
///
/// - location 0: `position` (Float32x3) at offset 0
/// - location 1: `normal` (Float32x3) at offset 12
/// - location 2: `tex_coords` (Float32x2) at offset 24
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
}

impl Vertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

    pub const fn new(position: [f32; 3], normal: [f32; 3], tex_coords: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            tex_coords,
        }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Position-only vertex of the skybox cube (location 0)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SkyboxVertex {
    pub position: [f32; 3],
}

impl SkyboxVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<SkyboxVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Full-screen quad vertex in normalized device coordinates
///
/// - location 0: `position` (Float32x2)
/// - location 1: `tex_coords` (Float32x2)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ScreenVertex {
    pub position: [f32; 2],
    pub tex_coords: [f32; 2],
}

impl ScreenVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ScreenVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Which vertex format a drawable or pipeline uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexLayout {
    Mesh,
    Skybox,
    Screen,
}

impl VertexLayout {
    pub fn desc(self) -> wgpu::VertexBufferLayout<'static> {
        match self {
            VertexLayout::Mesh => Vertex::desc(),
            VertexLayout::Skybox => SkyboxVertex::desc(),
            VertexLayout::Screen => ScreenVertex::desc(),
        }
    }

    pub fn stride(self) -> usize {
        match self {
            VertexLayout::Mesh => mem::size_of::<Vertex>(),
            VertexLayout::Skybox => mem::size_of::<SkyboxVertex>(),
            VertexLayout::Screen => mem::size_of::<ScreenVertex>(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mesh_vertex_layout_matches_struct() {
        let desc = Vertex::desc();
        assert_eq!(desc.array_stride, 32);
        assert_eq!(mem::offset_of!(Vertex, position) as u64, desc.attributes[0].offset);
        assert_eq!(mem::offset_of!(Vertex, normal) as u64, desc.attributes[1].offset);
        assert_eq!(mem::offset_of!(Vertex, tex_coords) as u64, desc.attributes[2].offset);

        let locations: Vec<u32> = desc.attributes.iter().map(|a| a.shader_location).collect();
        assert_eq!(locations, vec![0, 1, 2]);
    }

    #[test]
    fn test_auxiliary_layouts() {
        assert_eq!(SkyboxVertex::desc().array_stride, 12);
        assert_eq!(ScreenVertex::desc().array_stride, 16);
        assert_eq!(ScreenVertex::desc().attributes[1].offset, 8);
        assert_eq!(VertexLayout::Mesh.stride(), 32);
    }
}
