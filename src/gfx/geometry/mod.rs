//! # Procedural Geometry Generation
//!
//! CPU-side meshes for the shapes the demos need without model files.
//!
//! ## Supported Primitives
//!
//! - **Cube**: 36-vertex textured cube drawn without indices, or a 24-vertex indexed cube
//! - **Sphere**: UV sphere with configurable resolution
//! - **Plane**: Ground plane in the XZ plane facing +Y
//! - **Skybox cube** and **screen quad** in their own vertex formats
//!
//! ## Usage
//!
//! ```rust
//! use lumen::gfx::geometry::{generate_plane, textured_cube};
//!
//! let cube = textured_cube();
//! assert!(cube.indices.is_empty());
//!
//! let ground = generate_plane(20.0, 20.0, 1, 1);
//! assert_eq!(ground.triangle_count(), 2);
//! ```

pub mod primitives;

pub use primitives::*;

use cgmath::{InnerSpace, Vector3};

use crate::gfx::scene::vertex::Vertex;

/// Mesh data ready for GPU upload
///
/// An empty `indices` list means the vertices are drawn in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        if self.indices.is_empty() {
            self.vertices.len() / 3
        } else {
            self.indices.len() / 3
        }
    }

    fn triangles(&self) -> Vec<[usize; 3]> {
        if self.indices.is_empty() {
            (0..self.vertices.len() / 3)
                .map(|t| [t * 3, t * 3 + 1, t * 3 + 2])
                .collect()
        } else {
            self.indices
                .chunks_exact(3)
                .map(|t| [t[0] as usize, t[1] as usize, t[2] as usize])
                .collect()
        }
    }

    /// Replaces every normal with the area-weighted average of its adjacent face normals
    pub fn compute_normals(&mut self) {
        let mut accumulated = vec![Vector3::new(0.0f32, 0.0, 0.0); self.vertices.len()];

        for [a, b, c] in self.triangles() {
            if a >= self.vertices.len() || b >= self.vertices.len() || c >= self.vertices.len() {
                continue;
            }
            let pa = Vector3::from(self.vertices[a].position);
            let pb = Vector3::from(self.vertices[b].position);
            let pc = Vector3::from(self.vertices[c].position);
            let face = (pb - pa).cross(pc - pa);
            for index in [a, b, c] {
                accumulated[index] += face;
            }
        }

        for (vertex, normal) in self.vertices.iter_mut().zip(accumulated) {
            vertex.normal = if normal.magnitude2() > f32::EPSILON {
                normal.normalize().into()
            } else {
                [0.0, 1.0, 0.0]
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_compute_normals_of_a_flat_triangle() {
        let mut mesh = MeshData::new(
            vec![
                Vertex::new([0.0, 0.0, 0.0], [0.0; 3], [0.0, 0.0]),
                Vertex::new([1.0, 0.0, 0.0], [0.0; 3], [1.0, 0.0]),
                Vertex::new([0.0, 1.0, 0.0], [0.0; 3], [0.0, 1.0]),
            ],
            Vec::new(),
        );
        mesh.compute_normals();

        for vertex in &mesh.vertices {
            assert_relative_eq!(vertex.normal[2], 1.0);
        }
    }

    #[test]
    fn test_triangle_count_with_and_without_indices() {
        assert_eq!(textured_cube().triangle_count(), 12);
        assert_eq!(indexed_cube().triangle_count(), 12);
    }
}
