//! Geometry that issues exactly one draw call
//!
//! A drawable owns its vertex buffer and optional index buffer and is shared
//! between entities through `Rc<Drawable>`. GPU buffers are created by
//! [`Drawable::upload`], so meshes can be built and tested without a device.

use std::{cell::RefCell, fmt, rc::Rc};

use wgpu::util::DeviceExt;

use super::vertex::VertexLayout;
use crate::gfx::{
    geometry::MeshData,
    rendering::recorder::PassRecorder,
    shader::program::ShaderProgram,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawCall {
    /// Vertices drawn in order
    Arrays { vertex_count: u32 },
    Indexed { index_count: u32 },
}

pub struct DrawableBuffers {
    pub vertex: wgpu::Buffer,
    pub index: Option<wgpu::Buffer>,
}

enum GpuState {
    Pending,
    Ready(DrawableBuffers),
    Released,
}

pub struct Drawable {
    label: String,
    layout: VertexLayout,
    vertex_bytes: Vec<u8>,
    vertex_count: u32,
    indices: Vec<u32>,
    gpu: RefCell<GpuState>,
}

impl Drawable {
    pub fn new(label: &str, mesh: &MeshData) -> Self {
        Self::from_vertices(label, VertexLayout::Mesh, &mesh.vertices, &mesh.indices)
    }

    /// Builds a drawable from any vertex type matching `layout`
    pub fn from_vertices<V: bytemuck::Pod>(
        label: &str,
        layout: VertexLayout,
        vertices: &[V],
        indices: &[u32],
    ) -> Self {
        debug_assert_eq!(std::mem::size_of::<V>(), layout.stride());
        Self {
            label: label.to_string(),
            layout,
            vertex_bytes: bytemuck::cast_slice(vertices).to_vec(),
            vertex_count: vertices.len() as u32,
            indices: indices.to_vec(),
            gpu: RefCell::new(GpuState::Pending),
        }
    }

    /// Builds and uploads in one step
    pub fn uploaded(device: &wgpu::Device, label: &str, mesh: &MeshData) -> Rc<Self> {
        let drawable = Self::new(label, mesh);
        drawable.upload(device);
        Rc::new(drawable)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn layout(&self) -> VertexLayout {
        self.layout
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    /// Indexed when there are indices, otherwise the vertices in order
    pub fn draw_call(&self) -> DrawCall {
        if self.indices.is_empty() {
            DrawCall::Arrays {
                vertex_count: self.vertex_count,
            }
        } else {
            DrawCall::Indexed {
                index_count: self.indices.len() as u32,
            }
        }
    }

    /// Creates the GPU buffers, replacing any earlier ones
    pub fn upload(&self, device: &wgpu::Device) {
        let vertex = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertex Buffer", self.label)),
            contents: &self.vertex_bytes,
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index = (!self.indices.is_empty()).then(|| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} Index Buffer", self.label)),
                contents: bytemuck::cast_slice(&self.indices),
                usage: wgpu::BufferUsages::INDEX,
            })
        });

        log::debug!(
            "drawable '{}' uploaded ({} vertices, {} indices)",
            self.label,
            self.vertex_count,
            self.indices.len()
        );
        self.release();
        *self.gpu.borrow_mut() = GpuState::Ready(DrawableBuffers { vertex, index });
    }

    /// Uploads a drawable that has never been uploaded; released drawables
    /// stay released
    pub fn upload_if_pending(&self, device: &wgpu::Device) {
        if matches!(*self.gpu.borrow(), GpuState::Pending) {
            self.upload(device);
        }
    }

    pub fn is_uploaded(&self) -> bool {
        matches!(*self.gpu.borrow(), GpuState::Ready(_))
    }

    pub fn is_released(&self) -> bool {
        matches!(*self.gpu.borrow(), GpuState::Released)
    }

    /// Frees the GPU buffers now; later draws are skipped
    pub fn release(&self) {
        let previous = std::mem::replace(&mut *self.gpu.borrow_mut(), GpuState::Released);
        if let GpuState::Ready(buffers) = previous {
            buffers.vertex.destroy();
            if let Some(index) = buffers.index {
                index.destroy();
            }
            log::debug!("drawable '{}' released", self.label);
        }
    }

    /// Runs `f` with the GPU buffers, or returns `None` if there are none
    pub fn with_buffers<R>(&self, f: impl FnOnce(&DrawableBuffers) -> R) -> Option<R> {
        match &*self.gpu.borrow() {
            GpuState::Ready(buffers) => Some(f(buffers)),
            GpuState::Pending | GpuState::Released => None,
        }
    }

    /// Records this drawable's single draw call with the program's current state
    pub fn draw(self: &Rc<Self>, program: &ShaderProgram, recorder: &mut PassRecorder) {
        recorder.record_draw(program, self, self.draw_call());
    }
}

impl Drop for Drawable {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Drawable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Drawable")
            .field("label", &self.label)
            .field("layout", &self.layout)
            .field("vertex_count", &self.vertex_count)
            .field("index_count", &self.indices.len())
            .field("uploaded", &self.is_uploaded())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{
        geometry::{indexed_cube, textured_cube},
        rendering::recorder::{ClearOps, PassKind, Viewport},
        shader::program::ProgramKind,
    };

    #[test]
    fn test_empty_indices_draw_vertices_in_order() {
        let drawable = Drawable::new("cube", &textured_cube());
        assert_eq!(drawable.draw_call(), DrawCall::Arrays { vertex_count: 36 });
    }

    #[test]
    fn test_indices_draw_indexed() {
        let drawable = Drawable::new("cube", &indexed_cube());
        assert_eq!(drawable.draw_call(), DrawCall::Indexed { index_count: 36 });
    }

    #[test]
    fn test_draw_records_exactly_one_command() {
        let program = ShaderProgram::new(ProgramKind::Lit).unwrap();
        let drawable = Rc::new(Drawable::new("plane", &MeshData::default()));
        let mut recorder = PassRecorder::new(PassKind::Lit, Viewport::full(1, 1), ClearOps::load());

        drawable.draw(&program, &mut recorder);
        let pass = recorder.finish();
        assert_eq!(pass.commands.len(), 1);
        assert_eq!(pass.commands[0].call, DrawCall::Arrays { vertex_count: 0 });
    }

    #[test]
    fn test_release_without_upload_is_harmless() {
        let drawable = Drawable::new("cube", &textured_cube());
        assert!(!drawable.is_uploaded());
        drawable.release();
        assert!(drawable.is_released());
        assert!(drawable.with_buffers(|_| ()).is_none());
    }
}
