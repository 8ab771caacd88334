//! Texture arena
//!
//! Textures are owned here and referenced everywhere else by [`TextureId`].
//! Drawables never own textures, so one image can be shared by any number of
//! entities.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use slotmap::{new_key_type, SlotMap};

use crate::{
    assets::{self, fitted_size, ImageData},
    gfx::resources::texture_resource::{TextureOptions, TextureResource},
};

new_key_type! {
    pub struct TextureId;
}

/// What a texture unit samples during one draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureSource {
    Texture(TextureId),
    /// Opaque white, the diffuse fallback
    White,
    /// Tangent-space (0, 0, 1), the normal-map fallback
    FlatNormal,
    BlackCube,
    /// Depth output of the shadow pass
    ShadowMap,
    /// HDR color output of the offscreen passes
    SceneColor,
}

/// Textures already read from disk, keyed by path
///
/// A path that failed to load is remembered too, so a broken file is reported
/// once however many meshes name it.
#[derive(Debug, Default)]
pub struct LoadedTextures {
    by_path: HashMap<PathBuf, Option<TextureId>>,
}

impl LoadedTextures {
    pub fn get_or_load<F>(&mut self, path: &Path, load: F) -> Option<TextureId>
    where
        F: FnOnce(&Path) -> Option<TextureId>,
    {
        if let Some(id) = self.by_path.get(path) {
            return *id;
        }
        let id = load(path);
        self.by_path.insert(path.to_path_buf(), id);
        id
    }

    fn forget(&mut self, id: TextureId) {
        self.by_path.retain(|_, loaded| *loaded != Some(id));
    }

    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }
}

pub struct TextureRegistry {
    textures: SlotMap<TextureId, TextureResource>,
    loaded: LoadedTextures,
    white: TextureResource,
    flat_normal: TextureResource,
    black_cube: TextureResource,
}

impl TextureRegistry {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        Self {
            textures: SlotMap::with_key(),
            loaded: LoadedTextures::default(),
            white: TextureResource::solid_color(device, queue, [255; 4], "Fallback White", true),
            flat_normal: TextureResource::solid_color(
                device,
                queue,
                [128, 128, 255, 255],
                "Fallback Normal",
                false,
            ),
            black_cube: TextureResource::cubemap(device, queue, &Default::default(), "Fallback Cubemap"),
        }
    }

    pub fn insert(&mut self, texture: TextureResource) -> TextureId {
        self.textures.insert(texture)
    }

    pub fn get(&self, id: TextureId) -> Option<&TextureResource> {
        self.textures.get(id)
    }

    /// Drops the texture; ids still referring to it resolve to the fallback
    pub fn remove(&mut self, id: TextureId) -> bool {
        self.loaded.forget(id);
        self.textures.remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    pub fn upload_image(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &ImageData,
        label: &str,
        options: TextureOptions,
    ) -> TextureId {
        let max = device.limits().max_texture_dimension_2d;
        if fitted_size(image.width, image.height, max).is_some() {
            log::warn!(
                "texture '{label}' is {}x{}, above the device limit of {max}; downscaling",
                image.width,
                image.height
            );
            let fitted = image.clone().fit_within(max);
            return self.insert(TextureResource::from_image(device, queue, &fitted, label, options));
        }
        self.insert(TextureResource::from_image(device, queue, image, label, options))
    }

    /// Loads a 2D texture, logging the failure and returning `None` when the file is unusable
    pub fn load(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        path: impl AsRef<Path>,
        options: TextureOptions,
    ) -> Option<TextureId> {
        let path = path.as_ref();
        match assets::load_image(path) {
            Ok(image) => {
                let label = path.display().to_string();
                Some(self.upload_image(device, queue, &image, &label, options))
            }
            Err(e) => {
                log::error!("{e}; using fallback texture");
                None
            }
        }
    }

    /// Like [`load`](Self::load), but a path loaded before returns its existing texture
    pub fn load_shared(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        path: impl AsRef<Path>,
        options: TextureOptions,
    ) -> Option<TextureId> {
        let mut loaded = std::mem::take(&mut self.loaded);
        let id = loaded.get_or_load(path.as_ref(), |path| self.load(device, queue, path, options));
        self.loaded = loaded;
        id
    }

    /// Loads six cubemap faces; unreadable faces are logged and left black
    pub fn load_cubemap<P: AsRef<Path>>(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        face_paths: &[P; 6],
        label: &str,
    ) -> TextureId {
        let max = device.limits().max_texture_dimension_2d;
        let faces: [Option<ImageData>; 6] = std::array::from_fn(|i| {
            match assets::load_image(face_paths[i].as_ref()) {
                Ok(image) => Some(image.fit_within(max)),
                Err(e) => {
                    log::error!("{e}; cubemap face left black");
                    None
                }
            }
        });
        self.insert(TextureResource::cubemap(device, queue, &faces, label))
    }

    /// The GPU texture a source refers to at draw time
    ///
    /// Render-target sources are owned by the engine and resolve to `None` here.
    pub fn resolve(&self, source: TextureSource) -> Option<&TextureResource> {
        match source {
            TextureSource::Texture(id) => Some(self.get(id).unwrap_or(&self.white)),
            TextureSource::White => Some(&self.white),
            TextureSource::FlatNormal => Some(&self.flat_normal),
            TextureSource::BlackCube => Some(&self.black_cube),
            TextureSource::ShadowMap | TextureSource::SceneColor => None,
        }
    }
}
