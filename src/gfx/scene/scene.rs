use std::{path::Path, rc::Rc};

use super::{
    drawable::Drawable,
    entity::{SceneEntity, Transform},
    skybox::Skybox,
};
use crate::{
    assets::{self, ObjMesh},
    gfx::resources::{
        texture_registry::{TextureId, TextureRegistry},
        texture_resource::TextureOptions,
    },
};

/// Flat list of entities plus an optional skybox
#[derive(Debug, Default)]
pub struct Scene {
    pub entities: Vec<SceneEntity>,
    pub skybox: Option<Skybox>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_entity(&mut self, entity: SceneEntity) -> &mut SceneEntity {
        self.entities.push(entity);
        let last = self.entities.len() - 1;
        &mut self.entities[last]
    }

    /// Adds one entity per mesh of an OBJ file, ignoring its materials
    ///
    /// A file that fails to load is logged and adds nothing. Returns the
    /// number of entities added.
    pub fn add_model(&mut self, path: impl AsRef<Path>, transform: Transform) -> usize {
        self.add_model_with(path.as_ref(), transform, |_, _| None)
    }

    /// Adds one entity per mesh of an OBJ file with its material textures
    ///
    /// Diffuse and normal maps named by the `.mtl` file are loaded through
    /// the registry once per path and shared by every mesh that names them.
    /// Textures that fail to load leave the entity on the fallback.
    pub fn add_textured_model(
        &mut self,
        path: impl AsRef<Path>,
        transform: Transform,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        textures: &mut TextureRegistry,
    ) -> usize {
        self.add_model_with(path.as_ref(), transform, |texture, options| {
            textures.load_shared(device, queue, texture, options)
        })
    }

    fn add_model_with<F>(&mut self, path: &Path, transform: Transform, load_texture: F) -> usize
    where
        F: FnMut(&Path, TextureOptions) -> Option<TextureId>,
    {
        let meshes = match assets::load_obj(path) {
            Ok(meshes) => meshes,
            Err(e) => {
                log::error!("Failed to load model {}: {e}", path.display());
                return 0;
            }
        };

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "model".to_string());
        let added = self.add_meshes(&name, &meshes, transform, load_texture);
        log::info!("Loaded {added} mesh(es) from {}", path.display());
        added
    }

    fn add_meshes<F>(
        &mut self,
        name: &str,
        meshes: &[ObjMesh],
        transform: Transform,
        mut load_texture: F,
    ) -> usize
    where
        F: FnMut(&Path, TextureOptions) -> Option<TextureId>,
    {
        for (i, obj) in meshes.iter().enumerate() {
            let drawable = Rc::new(Drawable::new(&format!("{name}[{i}]"), &obj.mesh));
            let diffuse = obj
                .textures
                .diffuse
                .as_deref()
                .and_then(|path| load_texture(path, TextureOptions::default()));
            let normal_map = obj
                .textures
                .normal
                .as_deref()
                .and_then(|path| load_texture(path, TextureOptions::linear()));
            self.entities.push(
                SceneEntity::new(drawable, transform)
                    .with_diffuse(diffuse)
                    .with_normal_map(normal_map),
            );
        }
        meshes.len()
    }

    pub fn set_skybox(&mut self, skybox: Option<Skybox>) {
        self.skybox = skybox;
    }

    pub fn shadow_casters(&self) -> impl Iterator<Item = &SceneEntity> {
        self.entities.iter().filter(|e| e.casts_shadow)
    }

    pub fn outlined(&self) -> impl Iterator<Item = &SceneEntity> {
        self.entities.iter().filter(|e| e.outlined)
    }

    /// Every drawable referenced by the scene, shared ones repeated
    pub fn drawables(&self) -> impl Iterator<Item = &Rc<Drawable>> {
        self.entities
            .iter()
            .map(|e| &e.drawable)
            .chain(self.skybox.iter().map(|s| &s.drawable))
    }

    /// Creates GPU buffers for drawables added since the last call
    pub fn upload_pending(&self, device: &wgpu::Device) {
        for drawable in self.drawables() {
            drawable.upload_if_pending(device);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        assets::MaterialTextures,
        gfx::{geometry::textured_cube, resources::texture_registry::LoadedTextures},
    };
    use cgmath::Vector3;
    use slotmap::SlotMap;
    use std::path::PathBuf;

    #[test]
    fn test_entities_share_one_drawable() {
        let cube = Rc::new(Drawable::new("cube", &textured_cube()));
        let mut scene = Scene::new();
        for i in 0..3 {
            scene.add_entity(SceneEntity::new(
                Rc::clone(&cube),
                Transform::at(Vector3::new(i as f32, 0.0, 0.0)),
            ));
        }
        scene.entities[1].casts_shadow = false;
        scene.add_entity(SceneEntity::new(Rc::clone(&cube), Transform::default())).outlined = true;

        assert_eq!(Rc::strong_count(&cube), 5);
        assert_eq!(scene.shadow_casters().count(), 3);
        assert_eq!(scene.outlined().count(), 1);
        assert_eq!(scene.drawables().count(), 4);
    }

    #[test]
    fn test_meshes_sharing_a_material_share_its_texture() {
        let mut ids = SlotMap::<TextureId, ()>::with_key();
        let wood = ids.insert(());
        let wood_normal = ids.insert(());
        let textures = MaterialTextures {
            diffuse: Some(PathBuf::from("model/wood.png")),
            normal: Some(PathBuf::from("model/wood_normal.png")),
        };
        let meshes = vec![
            ObjMesh {
                mesh: textured_cube(),
                textures: textures.clone(),
            },
            ObjMesh {
                mesh: textured_cube(),
                textures,
            },
            ObjMesh {
                mesh: textured_cube(),
                textures: MaterialTextures::default(),
            },
        ];

        let mut loaded = LoadedTextures::default();
        let mut reads = Vec::new();
        let mut scene = Scene::new();
        let added = scene.add_meshes("crate", &meshes, Transform::default(), |path, options| {
            loaded.get_or_load(path, |path| {
                reads.push((path.to_path_buf(), options.srgb));
                Some(if options.srgb { wood } else { wood_normal })
            })
        });

        assert_eq!(added, 3);
        assert_eq!(
            reads,
            vec![
                (PathBuf::from("model/wood.png"), true),
                (PathBuf::from("model/wood_normal.png"), false),
            ]
        );
        assert_eq!(scene.entities[0].diffuse, Some(wood));
        assert_eq!(scene.entities[1].diffuse, Some(wood));
        assert_eq!(scene.entities[1].normal_map, Some(wood_normal));
        assert_eq!(scene.entities[2].diffuse, None);
        assert_eq!(scene.entities[2].normal_map, None);
    }

    #[test]
    fn test_missing_model_adds_nothing() {
        let mut scene = Scene::new();
        assert_eq!(scene.add_model("does/not/exist.obj", Transform::default()), 0);
        assert!(scene.entities.is_empty());
    }
}
