//! # Lit Cubes
//!
//! Ten textured cubes spinning in front of the camera under one point
//! light, with smooth Phong shading and no outlines.
//!
//! ## Usage:
//! ```bash
//! cargo run --example lit_cubes -- [diffuse.png]
//! ```

use std::rc::Rc;

use cgmath::Vector3;
use lumen::{
    gfx::{
        geometry::textured_cube,
        resources::TextureOptions,
        scene::{Drawable, SceneEntity, Transform},
    },
    logging::{init_logging, LoggingConfig},
    LumenApp, RenderSettings,
};

const CUBE_POSITIONS: [[f32; 3]; 10] = [
    [0.0, 0.0, 0.0],
    [2.0, 5.0, -15.0],
    [-1.5, -2.2, -2.5],
    [-3.8, -2.0, -12.3],
    [2.4, -0.4, -3.5],
    [-1.7, 3.0, -7.5],
    [1.3, -2.0, -2.5],
    [1.5, 2.0, -2.5],
    [1.5, 0.2, -1.5],
    [-1.3, 1.0, -1.5],
];

/// Degrees per second
const SPIN_SPEED: f32 = 20.0;

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());
    let diffuse_path = std::env::args().nth(1);

    let mut settings = RenderSettings::load_or_default("lumen.toml");
    settings.material.toon_levels = 0;
    settings.post.tone_map = false;
    settings.shadow.half_extent = 15.0;

    let mut app = LumenApp::new(settings);
    app.state_mut().light.position = [1.2, 1.0, 2.0];

    app.set_setup(move |engine, scene| {
        let (device, queue, textures) = engine.texture_loader();
        let diffuse = diffuse_path
            .as_deref()
            .and_then(|path| textures.load(device, queue, path, TextureOptions::default()));

        let cube = Rc::new(Drawable::new("cube", &textured_cube()));
        for position in CUBE_POSITIONS {
            scene.add_entity(
                SceneEntity::new(Rc::clone(&cube), Transform::at(Vector3::from(position)))
                    .with_diffuse(diffuse),
            );
        }
        Ok(())
    });

    app.set_update(|scene, state| {
        for (i, entity) in scene.entities.iter_mut().enumerate() {
            let angle = 20.0 * i as f32 + state.time.elapsed * SPIN_SPEED;
            entity.transform.rotation = Vector3::new(angle, angle * 0.3, angle * 0.5);
        }
    });

    app.run()
}
