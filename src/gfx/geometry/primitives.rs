//! # Primitive Shape Generation
//!
//! All lit shapes are wound counter-clockwise when seen from outside, which
//! the outline pass relies on when it culls front faces.

use std::f32::consts::PI;

use super::MeshData;
use crate::gfx::scene::vertex::{ScreenVertex, SkyboxVertex, Vertex};

/// Generate an indexed unit cube centered at the origin
///
/// Returns a cube with vertices from -0.5 to 0.5 on all axes. Each face has
/// its own four vertices so normals stay flat.
#[rustfmt::skip]
pub fn indexed_cube() -> MeshData {
    let positions = [
        // Front face
        [-0.5, -0.5,  0.5], [ 0.5, -0.5,  0.5], [ 0.5,  0.5,  0.5], [-0.5,  0.5,  0.5],
        // Back face
        [-0.5, -0.5, -0.5], [-0.5,  0.5, -0.5], [ 0.5,  0.5, -0.5], [ 0.5, -0.5, -0.5],
        // Left face
        [-0.5, -0.5, -0.5], [-0.5, -0.5,  0.5], [-0.5,  0.5,  0.5], [-0.5,  0.5, -0.5],
        // Right face
        [ 0.5, -0.5,  0.5], [ 0.5, -0.5, -0.5], [ 0.5,  0.5, -0.5], [ 0.5,  0.5,  0.5],
        // Top face
        [-0.5,  0.5,  0.5], [ 0.5,  0.5,  0.5], [ 0.5,  0.5, -0.5], [-0.5,  0.5, -0.5],
        // Bottom face
        [-0.5, -0.5, -0.5], [ 0.5, -0.5, -0.5], [ 0.5, -0.5,  0.5], [-0.5, -0.5,  0.5],
    ];

    let tex_coords = [
        [0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0],
        [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0],
        [0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0],
        [0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0],
        [0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0],
        [0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0],
    ];

    let face_normals = [
        [0.0, 0.0, 1.0],
        [0.0, 0.0, -1.0],
        [-1.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, -1.0, 0.0],
    ];

    let vertices = positions
        .iter()
        .zip(tex_coords.iter())
        .enumerate()
        .map(|(i, (position, uv))| Vertex::new(*position, face_normals[i / 4], *uv))
        .collect();

    let indices = (0..6u32)
        .flat_map(|face| {
            let base = face * 4;
            [base, base + 1, base + 2, base + 2, base + 3, base]
        })
        .collect();

    MeshData::new(vertices, indices)
}

/// The unit cube as 36 vertices and no index list
pub fn textured_cube() -> MeshData {
    let indexed = indexed_cube();
    let vertices = indexed
        .indices
        .iter()
        .map(|&i| indexed.vertices[i as usize])
        .collect();
    MeshData::new(vertices, Vec::new())
}

/// Generate a UV sphere with specified resolution
///
/// # Arguments
/// * `longitude_segments` - Number of vertical segments (longitude lines)
/// * `latitude_segments` - Number of horizontal segments (latitude lines)
///
/// Returns a sphere of radius 1.0 centered at the origin.
pub fn generate_sphere(longitude_segments: u32, latitude_segments: u32) -> MeshData {
    let long_segs = longitude_segments.max(3);
    let lat_segs = latitude_segments.max(2);
    let mut mesh = MeshData::default();

    for lat in 0..=lat_segs {
        let theta = lat as f32 * PI / lat_segs as f32;
        let (sin_theta, cos_theta) = theta.sin_cos();

        for long in 0..=long_segs {
            let phi = long as f32 * 2.0 * PI / long_segs as f32;
            let (sin_phi, cos_phi) = phi.sin_cos();

            let position = [sin_theta * cos_phi, cos_theta, sin_theta * sin_phi];
            let uv = [long as f32 / long_segs as f32, lat as f32 / lat_segs as f32];
            // Normal is same as position for unit sphere
            mesh.vertices.push(Vertex::new(position, position, uv));
        }
    }

    for lat in 0..lat_segs {
        for long in 0..long_segs {
            let first = lat * (long_segs + 1) + long;
            let second = first + long_segs + 1;

            mesh.indices.extend_from_slice(&[first, first + 1, second]);
            mesh.indices.extend_from_slice(&[second, first + 1, second + 1]);
        }
    }

    mesh
}

/// Generate a ground plane in the XZ plane with its normal pointing up (+Y)
///
/// # Arguments
/// * `width` - Extent along X
/// * `depth` - Extent along Z
/// * `width_segments` - Number of subdivisions along width
/// * `depth_segments` - Number of subdivisions along depth
///
/// Texture coordinates span 0..1; tile them with the entity's uv scale.
pub fn generate_plane(width: f32, depth: f32, width_segments: u32, depth_segments: u32) -> MeshData {
    let w_segs = width_segments.max(1);
    let d_segs = depth_segments.max(1);
    let mut mesh = MeshData::default();

    for z in 0..=d_segs {
        let v = z as f32 / d_segs as f32;
        let pos_z = (v - 0.5) * depth;

        for x in 0..=w_segs {
            let u = x as f32 / w_segs as f32;
            let pos_x = (u - 0.5) * width;
            mesh.vertices
                .push(Vertex::new([pos_x, 0.0, pos_z], [0.0, 1.0, 0.0], [u, v]));
        }
    }

    for z in 0..d_segs {
        for x in 0..w_segs {
            let i = z * (w_segs + 1) + x;
            let next_row = i + w_segs + 1;

            mesh.indices.extend_from_slice(&[i, next_row, i + 1]);
            mesh.indices.extend_from_slice(&[next_row, next_row + 1, i + 1]);
        }
    }

    mesh
}

/// 36 positions of a 2x2x2 cube sampled as a cubemap direction
#[rustfmt::skip]
pub fn skybox_cube() -> Vec<SkyboxVertex> {
    const POSITIONS: [[f32; 3]; 36] = [
        [-1.0,  1.0, -1.0], [-1.0, -1.0, -1.0], [ 1.0, -1.0, -1.0],
        [ 1.0, -1.0, -1.0], [ 1.0,  1.0, -1.0], [-1.0,  1.0, -1.0],

        [-1.0, -1.0,  1.0], [-1.0, -1.0, -1.0], [-1.0,  1.0, -1.0],
        [-1.0,  1.0, -1.0], [-1.0,  1.0,  1.0], [-1.0, -1.0,  1.0],

        [ 1.0, -1.0, -1.0], [ 1.0, -1.0,  1.0], [ 1.0,  1.0,  1.0],
        [ 1.0,  1.0,  1.0], [ 1.0,  1.0, -1.0], [ 1.0, -1.0, -1.0],

        [-1.0, -1.0,  1.0], [-1.0,  1.0,  1.0], [ 1.0,  1.0,  1.0],
        [ 1.0,  1.0,  1.0], [ 1.0, -1.0,  1.0], [-1.0, -1.0,  1.0],

        [-1.0,  1.0, -1.0], [ 1.0,  1.0, -1.0], [ 1.0,  1.0,  1.0],
        [ 1.0,  1.0,  1.0], [-1.0,  1.0,  1.0], [-1.0,  1.0, -1.0],

        [-1.0, -1.0, -1.0], [-1.0, -1.0,  1.0], [ 1.0, -1.0, -1.0],
        [ 1.0, -1.0, -1.0], [-1.0, -1.0,  1.0], [ 1.0, -1.0,  1.0],
    ];

    POSITIONS.iter().map(|&position| SkyboxVertex { position }).collect()
}

/// Two triangles covering the whole of normalized device coordinates
///
/// `tex_coords` follow the GL convention (v = 0 at the bottom); the screen
/// shader flips v for wgpu's top-left texture origin.
#[rustfmt::skip]
pub fn screen_quad() -> Vec<ScreenVertex> {
    const QUAD: [[f32; 4]; 6] = [
        // positions   // tex_coords
        [-1.0,  1.0,   0.0, 1.0],
        [-1.0, -1.0,   0.0, 0.0],
        [ 1.0, -1.0,   1.0, 0.0],

        [-1.0,  1.0,   0.0, 1.0],
        [ 1.0, -1.0,   1.0, 0.0],
        [ 1.0,  1.0,   1.0, 1.0],
    ];

    QUAD.iter()
        .map(|v| ScreenVertex {
            position: [v[0], v[1]],
            tex_coords: [v[2], v[3]],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, Vector3};

    fn outward_winding(mesh: &MeshData) -> bool {
        mesh.indices.chunks_exact(3).all(|t| {
            let [a, b, c] = [t[0], t[1], t[2]].map(|i| mesh.vertices[i as usize]);
            let pa = Vector3::from(a.position);
            let face = (Vector3::from(b.position) - pa).cross(Vector3::from(c.position) - pa);
            let normal = Vector3::from(a.normal) + Vector3::from(b.normal) + Vector3::from(c.normal);
            face.magnitude2() < 1e-12 || face.dot(normal) > 0.0
        })
    }

    #[test]
    fn test_cube_generation() {
        let cube = indexed_cube();
        assert_eq!(cube.vertices.len(), 24); // 6 faces * 4 vertices
        assert_eq!(cube.indices.len(), 36); // 6 faces * 2 triangles * 3 indices
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.triangle_count(), 12);
        assert!(outward_winding(&cube));
    }

    #[test]
    fn test_textured_cube_has_no_indices() {
        let cube = textured_cube();
        assert_eq!(cube.vertices.len(), 36);
        assert!(cube.indices.is_empty());
    }

    #[test]
    fn test_sphere_generation() {
        let sphere = generate_sphere(8, 6);
        assert_eq!(sphere.vertices.len(), 9 * 7);
        assert_eq!(sphere.indices.len(), 8 * 6 * 6);
        assert!(outward_winding(&sphere));
    }

    #[test]
    fn test_plane_generation() {
        let plane = generate_plane(2.0, 2.0, 2, 2);
        assert_eq!(plane.vertices.len(), 9); // 3x3 grid
        assert_eq!(plane.indices.len(), 24); // 4 quads * 2 triangles * 3 indices
        assert!(outward_winding(&plane));
    }

    #[test]
    fn test_skybox_and_quad_sizes() {
        assert_eq!(skybox_cube().len(), 36);
        let quad = screen_quad();
        assert_eq!(quad.len(), 6);
        assert!(quad.iter().all(|v| v.position[0].abs() == 1.0 && v.position[1].abs() == 1.0));
    }
}
