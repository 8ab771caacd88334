//! # Toon Shadows
//!
//! The full renderer: a ground plane, a row of outlined cubes and a sphere
//! (or an OBJ model) lit by a point light that circles the scene, with
//! shadows, toon banding, an optional skybox and HDR post-processing.
//!
//! ## Usage:
//! ```bash
//! cargo run --example toon_shadows -- [model.obj] [skybox_dir] [diffuse.png]
//! ```
//!
//! `skybox_dir` holds `right.jpg`, `left.jpg`, `top.jpg`, `bottom.jpg`,
//! `front.jpg` and `back.jpg`. Missing files are logged and replaced by
//! fallbacks, so the demo runs without any assets. Settings are read from
//! `lumen.toml` when present.

use std::rc::Rc;

use cgmath::Vector3;
use lumen::{
    assets::cubemap_face_paths,
    gfx::{
        geometry::{generate_plane, generate_sphere, textured_cube},
        resources::TextureOptions,
        scene::{Drawable, SceneEntity, Skybox, Transform},
    },
    logging::{init_logging, LoggingConfig},
    LumenApp, RenderSettings,
};

const LIGHT_ORBIT_RADIUS: f32 = 4.0;
const LIGHT_HEIGHT: f32 = 5.0;

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());

    let mut args = std::env::args().skip(1);
    let model_path = args.next();
    let skybox_dir = args.next();
    let diffuse_path = args.next();

    let settings = RenderSettings::load_or_default("lumen.toml");
    let mut app = LumenApp::new(settings);

    app.set_setup(move |engine, scene| {
        let (device, queue, textures) = engine.texture_loader();

        let diffuse = diffuse_path
            .as_deref()
            .and_then(|path| textures.load(device, queue, path, TextureOptions::default()));

        if let Some(dir) = skybox_dir.as_deref() {
            let cubemap = textures.load_cubemap(device, queue, &cubemap_face_paths(dir, "jpg"), "Skybox");
            scene.set_skybox(Some(Skybox::new(cubemap)));
        }

        let ground = Rc::new(Drawable::new("ground", &generate_plane(20.0, 20.0, 1, 1)));
        scene.add_entity(
            SceneEntity::new(ground, Transform::default().with_uv_scale([10.0, 10.0]))
                .with_diffuse(diffuse)
                .with_shadow(false),
        );

        // One drawable shared by every cube
        let cube = Rc::new(Drawable::new("cube", &textured_cube()));
        for (i, x) in [-3.0f32, -1.0, 1.0, 3.0].into_iter().enumerate() {
            let transform = Transform::at(Vector3::new(x, 0.5, (i as f32 - 1.5) * 0.75))
                .with_rotation(Vector3::new(0.0, i as f32 * 25.0, 0.0));
            scene.add_entity(
                SceneEntity::new(Rc::clone(&cube), transform)
                    .with_diffuse(diffuse)
                    .with_outline(true),
            );
        }

        match model_path.as_deref() {
            Some(path) => {
                let transform = Transform::at(Vector3::new(0.0, 0.0, -2.5));
                let added = scene.add_textured_model(path, transform, device, queue, textures);
                log::info!("added {added} meshes from '{path}'");
            }
            None => {
                let sphere = Rc::new(Drawable::new("sphere", &generate_sphere(48, 24)));
                scene.add_entity(
                    SceneEntity::new(sphere, Transform::at(Vector3::new(0.0, 1.0, -2.5)))
                        .with_outline(true),
                );
            }
        }
        Ok(())
    });

    app.set_update(|_scene, state| {
        let angle = state.time.elapsed * 0.5;
        state.light.position = [
            angle.cos() * LIGHT_ORBIT_RADIUS,
            LIGHT_HEIGHT,
            angle.sin() * LIGHT_ORBIT_RADIUS,
        ];
    });

    app.run()
}
