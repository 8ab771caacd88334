//! Image and model loading
//!
//! Loaders return [`AssetError`]; callers log the failure and fall back to a
//! placeholder resource so a missing file never stops the renderer.

use std::path::{Path, PathBuf};

use image::imageops::FilterType;

use crate::{
    error::AssetError,
    gfx::{geometry::MeshData, scene::vertex::Vertex},
};

/// Decoded image expanded to RGBA8
#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    pub rgba8: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Channel count of the source file before expansion
    pub channels: u8,
}

impl ImageData {
    pub fn solid(color: [u8; 4], width: u32, height: u32) -> Self {
        Self {
            rgba8: color.repeat((width * height) as usize),
            width,
            height,
            channels: 4,
        }
    }

    /// Full mip chain down to 1x1, level 0 first
    pub fn mip_chain(&self) -> Vec<ImageData> {
        let mut levels = vec![self.clone()];
        let Some(base) = image::RgbaImage::from_raw(self.width, self.height, self.rgba8.clone())
        else {
            return levels;
        };

        let (mut width, mut height) = (self.width, self.height);
        while width > 1 || height > 1 {
            width = (width / 2).max(1);
            height = (height / 2).max(1);
            let level = image::imageops::resize(&base, width, height, FilterType::Triangle);
            levels.push(ImageData {
                rgba8: level.into_raw(),
                width,
                height,
                channels: self.channels,
            });
        }
        levels
    }

    /// Downscales the image when a side exceeds `max_dimension`
    pub fn fit_within(self, max_dimension: u32) -> ImageData {
        let Some((width, height)) = fitted_size(self.width, self.height, max_dimension) else {
            return self;
        };
        let Some(source) = image::RgbaImage::from_raw(self.width, self.height, self.rgba8) else {
            return ImageData::solid([255; 4], 1, 1);
        };
        let resized = image::imageops::resize(&source, width, height, FilterType::Triangle);
        ImageData {
            rgba8: resized.into_raw(),
            width,
            height,
            channels: self.channels,
        }
    }
}

/// Size an image must be scaled to so neither side exceeds `max_dimension`
///
/// Returns `None` when the image already fits. The aspect ratio is kept and no
/// side drops below one pixel.
pub fn fitted_size(width: u32, height: u32, max_dimension: u32) -> Option<(u32, u32)> {
    let max = max_dimension.max(1);
    let longest = width.max(height);
    if longest <= max {
        return None;
    }
    let scale = |side: u32| ((side as u64 * max as u64 / longest as u64) as u32).max(1);
    Some((scale(width), scale(height)))
}

pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

pub fn load_image(path: impl AsRef<Path>) -> Result<ImageData, AssetError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let decoded = image::load_from_memory(&bytes).map_err(|source| AssetError::Image {
        path: path.to_path_buf(),
        source,
    })?;

    let channels = decoded.color().channel_count();
    let rgba = decoded.to_rgba8();
    log::debug!(
        "loaded image '{}' ({}x{}, {} channels)",
        path.display(),
        rgba.width(),
        rgba.height(),
        channels
    );

    Ok(ImageData {
        width: rgba.width(),
        height: rgba.height(),
        rgba8: rgba.into_raw(),
        channels,
    })
}

/// Cubemap face file names in upload order: +X, -X, +Y, -Y, +Z, -Z
pub const CUBEMAP_FACES: [&str; 6] = ["right", "left", "top", "bottom", "front", "back"];

/// Resolves the six face paths of a skybox directory, e.g. `skybox/right.jpg`
pub fn cubemap_face_paths(directory: impl AsRef<Path>, extension: &str) -> [PathBuf; 6] {
    let directory = directory.as_ref();
    CUBEMAP_FACES.map(|face| directory.join(format!("{face}.{extension}")))
}

/// Texture files an OBJ material names, resolved against the OBJ's directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterialTextures {
    /// `map_Kd`
    pub diffuse: Option<PathBuf>,
    /// `map_Bump`, `bump` or `norm`
    pub normal: Option<PathBuf>,
}

impl MaterialTextures {
    fn from_material(material: &tobj::Material, directory: &Path) -> Self {
        let resolve = |name: &Option<String>| {
            name.as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(|name| directory.join(name.replace('\\', "/")))
        };
        Self {
            diffuse: resolve(&material.diffuse_texture),
            normal: resolve(&material.normal_texture),
        }
    }
}

/// One mesh of an OBJ file with the textures of its material
#[derive(Debug, Clone)]
pub struct ObjMesh {
    pub mesh: MeshData,
    pub textures: MaterialTextures,
}

/// Loads every mesh of an OBJ file, triangulated with a single index buffer
///
/// Material textures are read from the `.mtl` file the OBJ references. A
/// missing or broken `.mtl` is logged and the meshes load untextured.
pub fn load_obj(path: impl AsRef<Path>) -> Result<Vec<ObjMesh>, AssetError> {
    let path = path.as_ref();
    let (models, materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )
    .map_err(|source| AssetError::Model {
        path: path.to_path_buf(),
        source,
    })?;

    if models.is_empty() {
        return Err(AssetError::EmptyModel(path.to_path_buf()));
    }

    let materials = materials.unwrap_or_else(|e| {
        log::warn!("no materials for '{}': {e}", path.display());
        Vec::new()
    });
    let directory = path.parent().unwrap_or_else(|| Path::new(""));

    let meshes: Vec<ObjMesh> = models
        .iter()
        .map(|model| ObjMesh {
            mesh: mesh_from_obj(&model.mesh),
            textures: model
                .mesh
                .material_id
                .and_then(|id| materials.get(id))
                .map(|material| MaterialTextures::from_material(material, directory))
                .unwrap_or_default(),
        })
        .collect();
    log::info!(
        "loaded model '{}' ({} meshes, {} materials, {} triangles)",
        path.display(),
        meshes.len(),
        materials.len(),
        meshes.iter().map(|m| m.mesh.triangle_count()).sum::<usize>()
    );
    Ok(meshes)
}

fn mesh_from_obj(mesh: &tobj::Mesh) -> MeshData {
    let vertex_count = mesh.positions.len() / 3;
    let has_normals = mesh.normals.len() == mesh.positions.len();
    let has_uvs = mesh.texcoords.len() / 2 == vertex_count;

    let vertices = (0..vertex_count)
        .map(|i| {
            let position = [
                mesh.positions[i * 3],
                mesh.positions[i * 3 + 1],
                mesh.positions[i * 3 + 2],
            ];
            let normal = if has_normals {
                [mesh.normals[i * 3], mesh.normals[i * 3 + 1], mesh.normals[i * 3 + 2]]
            } else {
                [0.0; 3]
            };
            let tex_coords = if has_uvs {
                [mesh.texcoords[i * 2], mesh.texcoords[i * 2 + 1]]
            } else {
                [0.0; 2]
            };
            Vertex::new(position, normal, tex_coords)
        })
        .collect();

    let mut data = MeshData::new(vertices, mesh.indices.clone());
    if !has_normals {
        data.compute_normals();
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_image_is_an_io_error() {
        let err = load_image("no/such/texture.png").unwrap_err();
        assert!(matches!(err, AssetError::Io { .. }));
    }

    #[test]
    fn test_undecodable_image_is_an_image_error() {
        let path = std::env::temp_dir().join("lumen_not_an_image.png");
        std::fs::write(&path, b"definitely not a png").unwrap();
        let err = load_image(&path).unwrap_err();
        assert!(matches!(err, AssetError::Image { .. }));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_mip_chain_halves_to_one_pixel() {
        let image = ImageData::solid([255, 0, 0, 255], 8, 2);
        let levels = image.mip_chain();
        let sizes: Vec<(u32, u32)> = levels.iter().map(|l| (l.width, l.height)).collect();
        assert_eq!(sizes, vec![(8, 2), (4, 1), (2, 1), (1, 1)]);
        assert_eq!(levels.len() as u32, mip_level_count(8, 2));
        assert_eq!(&levels[3].rgba8, &[255, 0, 0, 255]);
    }

    #[test]
    fn test_oversized_image_is_scaled_to_the_limit() {
        assert_eq!(fitted_size(1024, 512, 4096), None);
        assert_eq!(fitted_size(8192, 4096, 4096), Some((4096, 2048)));
        assert_eq!(fitted_size(10000, 3, 4096), Some((4096, 1)));

        let image = ImageData::solid([0, 255, 0, 255], 16, 4).fit_within(8);
        assert_eq!((image.width, image.height), (8, 2));
        assert_eq!(image.rgba8.len(), 8 * 2 * 4);
        assert_eq!(&image.rgba8[..4], &[0, 255, 0, 255]);
    }

    #[test]
    fn test_cubemap_faces_are_in_axis_order() {
        let paths = cubemap_face_paths("sky", "jpg");
        assert_eq!(paths[0], Path::new("sky").join("right.jpg"));
        assert_eq!(paths[3], Path::new("sky").join("bottom.jpg"));
        assert_eq!(paths[5], Path::new("sky").join("back.jpg"));
    }

    #[test]
    fn test_obj_without_normals_gets_computed_normals() {
        let path = std::env::temp_dir().join("lumen_triangle.obj");
        std::fs::write(&path, "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();

        let meshes = load_obj(&path).unwrap();
        assert_eq!(meshes.len(), 1);
        assert_eq!(meshes[0].mesh.indices, vec![0, 1, 2]);
        assert!(meshes[0].mesh.vertices.iter().all(|v| v.normal == [0.0, 0.0, 1.0]));
        assert_eq!(meshes[0].textures, MaterialTextures::default());
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_obj_material_textures_resolve_next_to_the_model() {
        let directory = std::env::temp_dir().join("lumen_material_model");
        std::fs::create_dir_all(&directory).unwrap();
        std::fs::write(
            directory.join("crate.mtl"),
            "newmtl wood\nmap_Kd textures/wood.png\nmap_Bump textures/wood_normal.png\n",
        )
        .unwrap();
        std::fs::write(
            directory.join("crate.obj"),
            "mtllib crate.mtl\n\
             v 0 0 0\nv 1 0 0\nv 0 1 0\nv 1 1 0\n\
             o first\nusemtl wood\nf 1 2 3\n\
             o second\nusemtl wood\nf 2 4 3\n",
        )
        .unwrap();

        let meshes = load_obj(directory.join("crate.obj")).unwrap();
        assert_eq!(meshes.len(), 2);
        for mesh in &meshes {
            assert_eq!(mesh.textures.diffuse, Some(directory.join("textures/wood.png")));
            assert_eq!(mesh.textures.normal, Some(directory.join("textures/wood_normal.png")));
        }
        let _ = std::fs::remove_dir_all(directory);
    }
}
